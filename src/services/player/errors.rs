//! Engine error codes and the user-facing messages they map to.
//!
//! Codes follow the Media3 `PlaybackException` numbering used by the TV app.

use thiserror::Error;

pub const ERROR_CODE_NETWORK_CONNECTION_FAILED: i32 = 2001;
pub const ERROR_CODE_NETWORK_CONNECTION_TIMEOUT: i32 = 2002;
pub const ERROR_CODE_CONTAINER_MALFORMED: i32 = 3001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackErrorKind {
    ConnectionFailed,
    Timeout,
    MalformedContainer,
    Other,
}

impl PlaybackErrorKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            ERROR_CODE_NETWORK_CONNECTION_FAILED => Self::ConnectionFailed,
            ERROR_CODE_NETWORK_CONNECTION_TIMEOUT => Self::Timeout,
            ERROR_CODE_CONTAINER_MALFORMED => Self::MalformedContainer,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionFailed => "connection_failed",
            Self::Timeout => "timeout",
            Self::MalformedContainer => "malformed_container",
            Self::Other => "other",
        }
    }
}

/// Message shown on the error overlay
pub fn playback_error_message(code: i32, details: Option<&str>) -> String {
    match PlaybackErrorKind::from_code(code) {
        PlaybackErrorKind::ConnectionFailed => "Error de conexión de red".to_string(),
        PlaybackErrorKind::Timeout => "Tiempo de conexión agotado".to_string(),
        PlaybackErrorKind::MalformedContainer => "Formato de video no válido".to_string(),
        PlaybackErrorKind::Other => match details {
            Some(details) if !details.is_empty() => format!("Error al reproducir: {}", details),
            _ => format!("Error al reproducir: código {}", code),
        },
    }
}

/// Failures of the player session registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("player session not found")]
    NotFound,
    #[error("too many player sessions (max {0})")]
    TooManySessions(usize),
    #[error("player session closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(playback_error_message(2001, None), "Error de conexión de red");
        assert_eq!(playback_error_message(2002, Some("x")), "Tiempo de conexión agotado");
        assert_eq!(playback_error_message(3001, None), "Formato de video no válido");
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(
            playback_error_message(4001, Some("decoder init failed")),
            "Error al reproducir: decoder init failed"
        );
        assert_eq!(
            playback_error_message(1000, None),
            "Error al reproducir: código 1000"
        );
    }
}
