// state.rs

use std::fmt;

/// Status of the Wi-Fi association or of the broker session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl LinkState {
    pub fn is_connected(self) -> bool {
        self == LinkState::Connected
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        };
        f.write_str(s)
    }
}

// EOF
