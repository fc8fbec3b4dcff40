//! Controller read errors

use std::io::ErrorKind;

use thiserror::Error;

/// Errors a [`TagSource`](super::TagSource) can report for a single read
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Read timed out")]
    Timeout,

    #[error("Tag '{0}' could not be found in the controller")]
    UnknownTag(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Whether the error leaves the connection unusable for the rest of the
    /// session.
    ///
    /// I/O errors count when they mean the link itself is gone.
    pub fn is_fatal(&self) -> bool {
        match self {
            SourceError::ConnectionLost(_) => true,
            SourceError::Io(e) => matches!(
                e.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::ConnectionRefused
                    | ErrorKind::NotConnected
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connection_loss_is_fatal() {
        assert!(SourceError::ConnectionLost("reset by peer".into()).is_fatal());
        assert!(!SourceError::Timeout.is_fatal());
        assert!(!SourceError::UnknownTag("Pump_1".into()).is_fatal());
        assert!(!SourceError::Protocol("bad reply".into()).is_fatal());
    }

    #[test]
    fn test_broken_link_io_is_fatal() {
        for kind in [
            ErrorKind::ConnectionReset,
            ErrorKind::ConnectionAborted,
            ErrorKind::ConnectionRefused,
            ErrorKind::NotConnected,
            ErrorKind::BrokenPipe,
            ErrorKind::UnexpectedEof,
        ] {
            assert!(SourceError::from(std::io::Error::from(kind)).is_fatal(), "{kind:?}");
        }

        assert!(!SourceError::from(std::io::Error::from(ErrorKind::TimedOut)).is_fatal());
        assert!(!SourceError::from(std::io::Error::from(ErrorKind::InvalidData)).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = SourceError::UnknownTag("Pump_1".into());
        assert_eq!(
            err.to_string(),
            "Tag 'Pump_1' could not be found in the controller"
        );
    }
}
