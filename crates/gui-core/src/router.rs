// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Screen selection

/// Application screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Connection toggle and local address
    Main,
    /// Upstream server settings form
    Settings,
}

/// Tracks which screen is shown; owns no proxy state
#[derive(Debug, Default)]
pub struct ScreenRouter {
    current: Option<Screen>,
}

impl ScreenRouter {
    pub fn current(&self) -> Option<Screen> {
        self.current
    }

    /// Switch screens. Returns the screen being left (if any) when the
    /// screen actually changes.
    pub fn navigate_to(&mut self, screen: Screen) -> Option<Option<Screen>> {
        if self.current == Some(screen) {
            return None;
        }
        Some(self.current.replace(screen))
    }
}
