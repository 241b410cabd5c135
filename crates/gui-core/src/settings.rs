// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Settings draft handling for one visit of the settings screen

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use resocks5_common::{Result, Settings};
use thiserror::Error;

/// Grace interval between a successful save and returning to the main screen
pub const SAVE_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Identifies one visit of the settings screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisitId(pub(crate) u64);

/// Editable settings fields (`enabled` is never edited from the form)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsField {
    ServerAddress,
    ServerPort,
    ServerLogin,
    ServerPassword,
}

impl SettingsField {
    pub const ALL: [SettingsField; 4] = [
        SettingsField::ServerAddress,
        SettingsField::ServerPort,
        SettingsField::ServerLogin,
        SettingsField::ServerPassword,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ServerAddress => "SOCKS5 server address",
            Self::ServerPort => "SOCKS5 server port",
            Self::ServerLogin => "Login",
            Self::ServerPassword => "Password",
        }
    }
}

/// Form field values as typed by the user
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SettingsDraft {
    pub server_address: String,
    pub server_port: String,
    pub server_login: String,
    pub server_password: String,
}

impl SettingsDraft {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            server_address: settings.server_address.clone(),
            // A zero port means "not configured" and renders as empty
            server_port: match settings.server_port {
                0 => String::new(),
                port => port.to_string(),
            },
            server_login: settings.server_login.clone(),
            server_password: settings.server_password.clone(),
        }
    }

    pub fn get(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::ServerAddress => &self.server_address,
            SettingsField::ServerPort => &self.server_port,
            SettingsField::ServerLogin => &self.server_login,
            SettingsField::ServerPassword => &self.server_password,
        }
    }

    pub fn set(&mut self, field: SettingsField, value: String) {
        match field {
            SettingsField::ServerAddress => self.server_address = value,
            SettingsField::ServerPort => self.server_port = value,
            SettingsField::ServerLogin => self.server_login = value,
            SettingsField::ServerPassword => self.server_password = value,
        }
    }
}

impl fmt::Debug for SettingsDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsDraft")
            .field("server_address", &self.server_address)
            .field("server_port", &self.server_port)
            .field("server_login", &self.server_login)
            .field("server_password", &"<redacted>")
            .finish()
    }
}

/// Client-side form validation failure
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{} is required", .0.label())]
    Required(SettingsField),

    #[error("Port must be a number between 1 and 65535")]
    InvalidPort,
}

/// A draft that passed form validation
///
/// Only [`validate_draft`] constructs one, so the engine can take it as
/// already valid.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    server_address: String,
    server_port: u16,
    server_login: String,
    server_password: String,
}

impl ValidatedDraft {
    /// Build the record to persist, carrying `enabled` through verbatim
    pub fn into_settings(self, enabled: bool) -> Settings {
        Settings {
            enabled,
            server_address: self.server_address,
            server_port: self.server_port,
            server_login: self.server_login,
            server_password: self.server_password,
        }
    }
}

impl fmt::Debug for ValidatedDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedDraft")
            .field("server_address", &self.server_address)
            .field("server_port", &self.server_port)
            .field("server_login", &self.server_login)
            .finish_non_exhaustive()
    }
}

/// Validate form values before submission
pub fn validate_draft(draft: &SettingsDraft) -> std::result::Result<ValidatedDraft, FormError> {
    for field in SettingsField::ALL {
        if draft.get(field).trim().is_empty() {
            return Err(FormError::Required(field));
        }
    }

    let server_port = match draft.server_port.trim().parse::<u16>() {
        Ok(0) | Err(_) => return Err(FormError::InvalidPort),
        Ok(port) => port,
    };

    Ok(ValidatedDraft {
        server_address: draft.server_address.trim().to_string(),
        server_port,
        server_login: draft.server_login.clone(),
        server_password: draft.server_password.clone(),
    })
}

/// State of one settings-screen visit
#[derive(Debug)]
pub struct SettingsSession {
    visit: VisitId,
    loaded: Option<Settings>,
    loading: bool,
    draft: SettingsDraft,
    touched: HashSet<SettingsField>,
    saving: bool,
}

impl SettingsSession {
    /// Start a visit; the caller issues the settings fetch
    pub fn new(visit: VisitId) -> Self {
        Self {
            visit,
            loaded: None,
            loading: true,
            draft: SettingsDraft::default(),
            touched: HashSet::new(),
            saving: false,
        }
    }

    pub fn visit(&self) -> VisitId {
        self.visit
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn draft(&self) -> &SettingsDraft {
        &self.draft
    }

    /// `enabled` from the last fetch; `false` if the fetch never succeeded
    pub fn loaded_enabled(&self) -> bool {
        self.loaded.as_ref().map(|s| s.enabled).unwrap_or(false)
    }

    /// Apply the settings fetch. Fields the user already edited keep the
    /// typed value.
    pub fn apply_loaded(&mut self, result: Result<Settings>) {
        self.loading = false;
        match result {
            Ok(settings) => {
                let fetched = SettingsDraft::from_settings(&settings);
                for field in SettingsField::ALL {
                    if !self.touched.contains(&field) {
                        self.draft.set(field, fetched.get(field).to_string());
                    }
                }
                self.loaded = Some(settings);
            }
            Err(e) => {
                tracing::warn!("Failed to load settings: {}", e);
            }
        }
    }

    pub fn edit(&mut self, field: SettingsField, value: String) {
        self.touched.insert(field);
        self.draft.set(field, value);
    }

    /// Submit a validated draft. Returns the record to persist, or `None`
    /// while a save is already in flight.
    pub fn submit(&mut self, draft: ValidatedDraft) -> Option<Settings> {
        if self.saving {
            tracing::debug!("Duplicate settings submission suppressed");
            return None;
        }

        self.saving = true;
        Some(draft.into_settings(self.loaded_enabled()))
    }

    /// Apply the save result. Returns true when the grace interval should
    /// start; controls stay disabled until [`SettingsSession::settled`].
    pub fn apply_saved(&mut self, result: Result<()>) -> bool {
        match result {
            Ok(()) => {
                tracing::info!("Settings saved");
                true
            }
            Err(e) => {
                tracing::error!("Failed to save settings: {}", e);
                self.saving = false;
                false
            }
        }
    }

    pub fn settled(&mut self) {
        self.saving = false;
    }
}
