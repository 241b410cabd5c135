// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! View-state engine
//!
//! [`ViewStateEngine`] is a plain reducer: every user intent, command result
//! and pushed event arrives as a [`Msg`], and the engine answers with the
//! [`Effect`]s the runtime must perform. It never performs I/O itself, so the
//! caller decides scheduling and the engine stays deterministic under test.

use std::time::Duration;

use resocks5_common::{ProxyEvent, Result, Settings};

use crate::clipboard::{CopyFeedback, COPY_FEEDBACK_DURATION};
use crate::router::{Screen, ScreenRouter};
use crate::settings::{
    SettingsDraft, SettingsField, SettingsSession, ValidatedDraft, VisitId, SAVE_SETTLE_DELAY,
};
use crate::state::{ConnectionCore, ConnectionState, ProxyCommand};

/// Tunable delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Grace interval after a successful save before leaving the settings screen
    pub save_settle_delay: Duration,
    /// How long the "copied" confirmation is shown
    pub copy_feedback_duration: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_settle_delay: SAVE_SETTLE_DELAY,
            copy_feedback_duration: COPY_FEEDBACK_DURATION,
        }
    }
}

/// Engine input
#[derive(Debug)]
pub enum Msg {
    // User intents
    Navigate(Screen),
    Toggle,
    EditSetting { field: SettingsField, value: String },
    SubmitSettings(ValidatedDraft),
    CopyAddress,

    // Command results
    RunningQueried(Result<bool>),
    StartFinished(Result<()>),
    StopFinished(Result<()>),
    LocalAddressLoaded(Result<String>),
    SettingsLoaded { visit: VisitId, result: Result<Settings> },
    SettingsSaved { visit: VisitId, result: Result<()> },
    SaveSettled { visit: VisitId },
    ClipboardWritten(Result<()>),
    CopyFeedbackElapsed,

    // Push notifications
    Event(ProxyEvent),
}

/// Work the runtime performs on the engine's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Bind the push-event handlers; must complete before `QueryRunning` is issued
    Subscribe,
    Unsubscribe,
    QueryRunning,
    StartProxy,
    StopProxy,
    FetchLocalAddress,
    LoadSettings { visit: VisitId },
    SaveSettings { visit: VisitId, settings: Settings },
    SettleAfterSave { visit: VisitId, delay: Duration },
    WriteClipboard(String),
    ClearCopyFeedbackAfter(Duration),
}

/// Settings screen state for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub loading: bool,
    pub saving: bool,
    pub draft: SettingsDraft,
}

/// Everything a view needs to render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub screen: Option<Screen>,
    pub connection: ConnectionState,
    pub running_known: bool,
    pub local_address: Option<String>,
    pub copied: bool,
    pub settings: Option<SettingsSnapshot>,
}

/// Owner of the connection state and the settings draft
#[derive(Debug, Default)]
pub struct ViewStateEngine {
    config: EngineConfig,
    router: ScreenRouter,
    connection: ConnectionCore,
    local_address: Option<String>,
    address_pending: bool,
    settings: Option<SettingsSession>,
    next_visit: u64,
    copy: CopyFeedback,
}

impl ViewStateEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn screen(&self) -> Option<Screen> {
        self.router.current()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            screen: self.router.current(),
            connection: self.connection.state(),
            running_known: self.connection.running_known(),
            local_address: self.local_address.clone(),
            copied: self.copy.is_copied(),
            settings: self.settings.as_ref().map(|session| SettingsSnapshot {
                loading: session.is_loading(),
                saving: session.is_saving(),
                draft: session.draft().clone(),
            }),
        }
    }

    /// Apply one input and return the effects to perform, in order
    pub fn handle(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::Navigate(screen) => self.navigate(screen),

            Msg::Toggle => match self.connection.toggle() {
                Some(ProxyCommand::Start) => vec![Effect::StartProxy],
                Some(ProxyCommand::Stop) => vec![Effect::StopProxy],
                None => Vec::new(),
            },

            Msg::EditSetting { field, value } => {
                match self.settings.as_mut() {
                    Some(session) => session.edit(field, value),
                    None => tracing::debug!("Edit ignored outside the settings screen"),
                }
                Vec::new()
            }

            Msg::SubmitSettings(draft) => {
                let Some(session) = self.settings.as_mut() else {
                    tracing::debug!("Submit ignored outside the settings screen");
                    return Vec::new();
                };
                match session.submit(draft) {
                    Some(settings) => vec![Effect::SaveSettings {
                        visit: session.visit(),
                        settings,
                    }],
                    None => Vec::new(),
                }
            }

            Msg::CopyAddress => {
                if !self.connection.state().is_connected() {
                    return Vec::new();
                }
                match self.copy.request(self.local_address.as_deref()) {
                    Some(text) => vec![Effect::WriteClipboard(text)],
                    None => Vec::new(),
                }
            }

            Msg::RunningQueried(result) => {
                self.connection.apply_running(result);
                Vec::new()
            }

            Msg::StartFinished(result) => {
                self.connection.apply_start_result(result);
                Vec::new()
            }

            Msg::StopFinished(result) => {
                self.connection.apply_stop_result(result);
                Vec::new()
            }

            Msg::LocalAddressLoaded(result) => {
                self.address_pending = false;
                match result {
                    Ok(address) => self.local_address = Some(address),
                    Err(e) => tracing::warn!("Failed to get local address: {}", e),
                }
                Vec::new()
            }

            Msg::SettingsLoaded { visit, result } => {
                match self.session_for(visit) {
                    Some(session) => session.apply_loaded(result),
                    None => tracing::debug!("Discarding settings fetched for a previous visit"),
                }
                Vec::new()
            }

            Msg::SettingsSaved { visit, result } => {
                let Some(session) = self.session_for(visit) else {
                    tracing::debug!("Discarding save result for a previous visit");
                    return Vec::new();
                };
                if session.apply_saved(result) {
                    vec![Effect::SettleAfterSave {
                        visit,
                        delay: self.config.save_settle_delay,
                    }]
                } else {
                    Vec::new()
                }
            }

            Msg::SaveSettled { visit } => {
                let Some(session) = self.session_for(visit) else {
                    return Vec::new();
                };
                session.settled();
                self.navigate(Screen::Main)
            }

            Msg::ClipboardWritten(result) => {
                if self.copy.apply_written(result) {
                    vec![Effect::ClearCopyFeedbackAfter(self.config.copy_feedback_duration)]
                } else {
                    Vec::new()
                }
            }

            Msg::CopyFeedbackElapsed => {
                self.copy.clear();
                Vec::new()
            }

            Msg::Event(event) => {
                self.connection.apply_event(event);
                Vec::new()
            }
        }
    }

    fn session_for(&mut self, visit: VisitId) -> Option<&mut SettingsSession> {
        self.settings
            .as_mut()
            .filter(|session| session.visit() == visit)
    }

    fn navigate(&mut self, screen: Screen) -> Vec<Effect> {
        if self.router.current() == Some(Screen::Settings)
            && screen != Screen::Settings
            && self.settings.as_ref().is_some_and(|s| s.is_saving())
        {
            tracing::debug!("Navigation refused while settings are being saved");
            return Vec::new();
        }

        let Some(previous) = self.router.navigate_to(screen) else {
            return Vec::new();
        };

        let mut effects = Vec::new();

        match previous {
            Some(Screen::Main) => effects.push(Effect::Unsubscribe),
            Some(Screen::Settings) => self.settings = None,
            None => {}
        }

        match screen {
            Screen::Main => {
                effects.push(Effect::Subscribe);
                self.connection.begin_query();
                effects.push(Effect::QueryRunning);
                if self.local_address.is_none() && !self.address_pending {
                    self.address_pending = true;
                    effects.push(Effect::FetchLocalAddress);
                }
            }
            Screen::Settings => {
                self.next_visit += 1;
                let visit = VisitId(self.next_visit);
                self.settings = Some(SettingsSession::new(visit));
                effects.push(Effect::LoadSettings { visit });
            }
        }

        tracing::debug!("Navigated to {:?}", screen);
        effects
    }
}
