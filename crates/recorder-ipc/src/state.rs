//! Session state machine types.

use serde::{Deserialize, Serialize};

/// The current state of a recording session.
///
/// There are no intermediate states: a session is either capturing frames or
/// it is not. Region updates while Recording do not change the state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No recording in progress.
    #[default]
    Idle,

    /// Frames are being captured and encoded.
    Recording,
}

impl SessionState {
    /// Returns true if no recording is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a recording is in progress.
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// Returns a simple string representation of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Recording => "Recording",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        let state = SessionState::default();
        assert!(state.is_idle());
        assert!(!state.is_recording());
        assert_eq!(state.name(), "Idle");
    }

    #[test]
    fn test_recording_state() {
        let state = SessionState::Recording;
        assert!(state.is_recording());
        assert_eq!(state.name(), "Recording");
    }
}
