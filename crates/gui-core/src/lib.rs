// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Framework-agnostic view core for resocks5
//!
//! This crate owns the proxy's view state: the connection state machine, the
//! settings form lifecycle, the copy-address feedback and screen routing. A
//! UI shell sends intents through [`EngineHandle`] and renders the
//! [`ViewSnapshot`] it publishes.

pub mod backend;
pub mod clipboard;
pub mod engine;
pub mod events;
pub mod router;
pub mod runtime;
pub mod settings;
pub mod state;
pub mod view_models;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use backend::{load_backend_config, BackendClient, ProxyBackend};
pub use clipboard::{Clipboard, SystemClipboard, COPY_FEEDBACK_DURATION};
pub use engine::{Effect, EngineConfig, Msg, SettingsSnapshot, ViewSnapshot, ViewStateEngine};
pub use events::{EventSource, EventSubscription};
pub use router::Screen;
pub use runtime::{EngineHandle, EngineRuntime};
pub use settings::{
    validate_draft, FormError, SettingsDraft, SettingsField, ValidatedDraft, SAVE_SETTLE_DELAY,
};
pub use state::ConnectionState;
pub use view_models::{FieldViewModel, MainViewModel, SettingsFormViewModel};

// Re-export types from common crate for convenience
pub use resocks5_common::{
    BackendClientConfig, Error, EventListener, ProxyEvent, Result, Settings,
    DEFAULT_LOCAL_ADDRESS,
};
