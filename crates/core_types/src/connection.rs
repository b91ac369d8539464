use serde::{Deserialize, Serialize};

/// Backend capability state as known to the client. The three variants make
/// "AI configured without a platform connection" unrepresentable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Ready,
}

impl ConnectionState {
    pub fn platform_connected(self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }

    pub fn ai_configured(self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Ready => "ready",
        }
    }
}
