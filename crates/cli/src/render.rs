// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Terminal rendering of the view models

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use resocks5_gui_core::{ConnectionState, MainViewModel, SettingsFormViewModel};

pub fn status_text(connection: ConnectionState) -> &'static str {
    match connection {
        ConnectionState::Disconnected => "Stopped",
        ConnectionState::Starting => "Starting...",
        ConnectionState::Connected => "Running",
    }
}

/// Main screen as printed by `status`
pub fn main_view(model: &MainViewModel) -> String {
    let status = status_text(model.connection);
    let status = match model.connection {
        ConnectionState::Connected => status.green().bold(),
        ConnectionState::Starting => status.yellow(),
        ConnectionState::Disconnected => status.dimmed(),
    };

    let mut lines = vec![format!("Proxy: {}", status)];
    if model.show_address {
        if model.address_text.is_empty() {
            lines.push(format!("Local address: {}", "unknown".dimmed()));
        } else {
            lines.push(format!("Local address: {}", model.address_text.bold()));
        }
    }
    if model.toggle_enabled {
        lines.push(format!("{} with 'resocks5 toggle'", model.tooltip).dimmed().to_string());
    }
    lines.join("\n")
}

/// One line for `watch`
pub fn watch_line(timestamp: &str, model: &MainViewModel) -> String {
    let mut line = format!("[{}] {}", timestamp, status_text(model.connection));
    if model.show_address && !model.address_text.is_empty() {
        line.push_str(&format!(" on {}", model.address_text));
    }
    line
}

/// Settings form as printed by `settings show`
pub fn settings_form(form: &SettingsFormViewModel) -> String {
    let width = form
        .fields
        .iter()
        .map(|row| row.label.len())
        .max()
        .unwrap_or(0);

    form.fields
        .iter()
        .map(|row| {
            let value = if row.value.is_empty() {
                format!("(e.g. {})", row.placeholder).dimmed().to_string()
            } else if row.secret {
                "*".repeat(row.value.chars().count())
            } else {
                row.value.clone()
            };
            format!("{:<width$}  {}", row.label, value, width = width)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use resocks5_gui_core::{Screen, SettingsDraft, SettingsField, ViewSnapshot};

    fn snapshot(connection: ConnectionState) -> ViewSnapshot {
        ViewSnapshot {
            screen: Some(Screen::Main),
            connection,
            running_known: true,
            local_address: Some("127.0.0.1:56788".to_string()),
            copied: false,
            settings: None,
        }
    }

    #[test]
    fn test_main_view() {
        colored::control::set_override(false);

        let running = MainViewModel::from_snapshot(&snapshot(ConnectionState::Connected));
        assert_eq!(
            main_view(&running),
            "Proxy: Running\nLocal address: 127.0.0.1:56788\nStop proxy with 'resocks5 toggle'"
        );

        let starting = MainViewModel::from_snapshot(&snapshot(ConnectionState::Starting));
        assert_eq!(main_view(&starting), "Proxy: Starting...");

        let stopped = MainViewModel::from_snapshot(&snapshot(ConnectionState::Disconnected));
        assert_eq!(main_view(&stopped), "Proxy: Stopped\nStart proxy with 'resocks5 toggle'");
    }

    #[test]
    fn test_watch_line() {
        let running = MainViewModel::from_snapshot(&snapshot(ConnectionState::Connected));
        assert_eq!(watch_line("12:00:00", &running), "[12:00:00] Running on 127.0.0.1:56788");

        let stopped = MainViewModel::from_snapshot(&snapshot(ConnectionState::Disconnected));
        assert_eq!(watch_line("12:00:01", &stopped), "[12:00:01] Stopped");
    }

    #[test]
    fn test_settings_form_masks_password() {
        colored::control::set_override(false);

        let mut draft = SettingsDraft::default();
        draft.set(SettingsField::ServerLogin, "admin".to_string());
        draft.set(SettingsField::ServerPassword, "secret".to_string());
        let form = SettingsFormViewModel::from_draft(&draft, false, false);

        let rendered = settings_form(&form);
        assert!(rendered.contains("(e.g. 141.141.141.141)"));
        assert!(rendered.contains("admin"));
        assert!(rendered.contains("******"));
        assert!(!rendered.contains("secret"));
    }
}
