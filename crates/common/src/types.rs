// Common types for resocks5

use serde::{Deserialize, Serialize};

/// Address the local proxy listens on when the backend uses its defaults
pub const DEFAULT_LOCAL_ADDRESS: &str = "127.0.0.1:56788";

/// Lifecycle events pushed by the backend
///
/// Events carry no payload and are not correlated with any command the UI
/// issued.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProxyEvent {
    /// The local proxy started listening
    #[serde(rename = "proxy-started")]
    Started,
    /// The local proxy stopped
    #[serde(rename = "proxy-stopped")]
    Stopped,
}

impl ProxyEvent {
    /// Map a backend event name to an event
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name.trim() {
            "proxy-started" => Some(Self::Started),
            "proxy-stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Backend event name
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Started => "proxy-started",
            Self::Stopped => "proxy-stopped",
        }
    }
}
