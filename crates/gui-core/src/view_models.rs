// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! View models - Data structures prepared for UI display

use crate::engine::ViewSnapshot;
use crate::settings::{SettingsDraft, SettingsField};
use crate::state::ConnectionState;

/// Main screen data prepared for UI display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainViewModel {
    pub connection: ConnectionState,
    pub label: &'static str,
    pub tooltip: &'static str,
    pub is_active: bool,
    pub toggle_enabled: bool,
    pub show_address: bool,
    pub address_text: String,
    pub copy_enabled: bool,
}

impl MainViewModel {
    pub fn from_snapshot(snapshot: &ViewSnapshot) -> Self {
        let connection = snapshot.connection;
        let show_address = connection.is_connected();
        let address_text = if snapshot.copied {
            "Copied".to_string()
        } else {
            snapshot.local_address.clone().unwrap_or_default()
        };

        Self {
            connection,
            label: Self::label_for(connection),
            tooltip: Self::tooltip_for(connection),
            is_active: connection.is_connected(),
            toggle_enabled: !connection.is_busy(),
            show_address,
            address_text,
            copy_enabled: show_address && !snapshot.copied && snapshot.local_address.is_some(),
        }
    }

    /// Get toggle label based on connection state
    pub fn label_for(connection: ConnectionState) -> &'static str {
        match connection {
            ConnectionState::Disconnected => "Start",
            ConnectionState::Starting => "Starting...",
            ConnectionState::Connected => "Running",
        }
    }

    pub fn tooltip_for(connection: ConnectionState) -> &'static str {
        match connection {
            ConnectionState::Connected => "Stop proxy",
            ConnectionState::Disconnected | ConnectionState::Starting => "Start proxy",
        }
    }
}

/// One settings form row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViewModel {
    pub field: SettingsField,
    pub label: &'static str,
    pub value: String,
    pub placeholder: &'static str,
    pub secret: bool,
}

/// Settings form data prepared for UI display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFormViewModel {
    pub loading: bool,
    pub fields: Vec<FieldViewModel>,
    pub save_label: &'static str,
    pub save_enabled: bool,
    pub back_enabled: bool,
}

impl SettingsFormViewModel {
    /// Returns None unless the settings screen is mounted
    pub fn from_snapshot(snapshot: &ViewSnapshot) -> Option<Self> {
        let settings = snapshot.settings.as_ref()?;
        Some(Self::from_draft(&settings.draft, settings.loading, settings.saving))
    }

    pub fn from_draft(draft: &SettingsDraft, loading: bool, saving: bool) -> Self {
        let fields = SettingsField::ALL
            .iter()
            .map(|&field| FieldViewModel {
                field,
                label: field.label(),
                value: draft.get(field).to_string(),
                placeholder: placeholder_for(field),
                secret: field == SettingsField::ServerPassword,
            })
            .collect();

        Self {
            loading,
            fields,
            save_label: if saving { "Saving..." } else { "Save" },
            save_enabled: !saving,
            back_enabled: !saving,
        }
    }

    pub fn field(&self, field: SettingsField) -> Option<&FieldViewModel> {
        self.fields.iter().find(|row| row.field == field)
    }
}

pub fn placeholder_for(field: SettingsField) -> &'static str {
    match field {
        SettingsField::ServerAddress => "141.141.141.141",
        SettingsField::ServerPort => "1080",
        SettingsField::ServerLogin => "admin",
        SettingsField::ServerPassword => "123456",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SettingsSnapshot;
    use crate::router::Screen;

    fn main_snapshot(connection: ConnectionState, copied: bool) -> ViewSnapshot {
        ViewSnapshot {
            screen: Some(Screen::Main),
            connection,
            running_known: true,
            local_address: Some("127.0.0.1:56788".to_string()),
            copied,
            settings: None,
        }
    }

    #[test]
    fn test_main_labels() {
        let disconnected = MainViewModel::from_snapshot(&main_snapshot(ConnectionState::Disconnected, false));
        assert_eq!(disconnected.label, "Start");
        assert_eq!(disconnected.tooltip, "Start proxy");
        assert!(disconnected.toggle_enabled);
        assert!(!disconnected.show_address);
        assert!(!disconnected.copy_enabled);

        let starting = MainViewModel::from_snapshot(&main_snapshot(ConnectionState::Starting, false));
        assert_eq!(starting.label, "Starting...");
        assert!(!starting.toggle_enabled);
        assert!(!starting.is_active);

        let connected = MainViewModel::from_snapshot(&main_snapshot(ConnectionState::Connected, false));
        assert_eq!(connected.label, "Running");
        assert_eq!(connected.tooltip, "Stop proxy");
        assert!(connected.is_active);
        assert!(connected.show_address);
        assert_eq!(connected.address_text, "127.0.0.1:56788");
        assert!(connected.copy_enabled);
    }

    #[test]
    fn test_copied_feedback_replaces_address() {
        let model = MainViewModel::from_snapshot(&main_snapshot(ConnectionState::Connected, true));
        assert_eq!(model.address_text, "Copied");
        assert!(!model.copy_enabled);
    }

    #[test]
    fn test_settings_form() {
        let mut snapshot = main_snapshot(ConnectionState::Disconnected, false);
        assert!(SettingsFormViewModel::from_snapshot(&snapshot).is_none());

        let mut draft = SettingsDraft::default();
        draft.set(SettingsField::ServerLogin, "alice".to_string());
        snapshot.screen = Some(Screen::Settings);
        snapshot.settings = Some(SettingsSnapshot {
            loading: true,
            saving: false,
            draft,
        });

        let form = SettingsFormViewModel::from_snapshot(&snapshot).unwrap();
        assert!(form.loading);
        assert_eq!(form.save_label, "Save");
        assert!(form.save_enabled && form.back_enabled);

        let address = form.field(SettingsField::ServerAddress).unwrap();
        assert_eq!(address.value, "");
        assert_eq!(address.placeholder, "141.141.141.141");
        assert_eq!(form.field(SettingsField::ServerLogin).unwrap().value, "alice");
        assert!(form.field(SettingsField::ServerPassword).unwrap().secret);
    }

    #[test]
    fn test_saving_locks_form() {
        let form = SettingsFormViewModel::from_draft(&SettingsDraft::default(), false, true);
        assert_eq!(form.save_label, "Saving...");
        assert!(!form.save_enabled);
        assert!(!form.back_enabled);
    }
}
