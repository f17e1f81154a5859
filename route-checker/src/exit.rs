//! Process exit codes.
//!
//! Each failing stage of a run has its own code so wrappers can tell an
//! unreachable device from a full disk without reading the log.

use crate::error::{Error, SessionError};
use crate::run::RunFailure;

/// Exit code constants.
pub mod codes {
    /// Capture completed and both files were written.
    pub const SUCCESS: u8 = 0;
    /// Usage or configuration error.
    pub const CONFIG_ERROR: u8 = 1;
    /// Unreachable device, authentication failure or transport timeout.
    pub const CONNECTION_ERROR: u8 = 2;
    /// Session preparation failed.
    pub const NEGOTIATION_ERROR: u8 = 3;
    /// Command output did not settle in time.
    pub const COMMAND_TIMEOUT: u8 = 4;
    /// Output did not fit the grammar.
    pub const UNPARSABLE_OUTPUT: u8 = 5;
    /// An artifact could not be written.
    pub const STORAGE_ERROR: u8 = 6;
}

/// Map an error to an exit code.
pub fn exit_code(error: &Error) -> u8 {
    match error {
        Error::Config(_) | Error::Target(_) => codes::CONFIG_ERROR,
        Error::Connection(_) => codes::CONNECTION_ERROR,
        Error::Session(SessionError::CommandTimeout { .. }) => codes::COMMAND_TIMEOUT,
        Error::Session(SessionError::Transport(_)) => codes::CONNECTION_ERROR,
        Error::Session(_) => codes::NEGOTIATION_ERROR,
        Error::Normalize(_) => codes::UNPARSABLE_OUTPUT,
        Error::Storage(_) => codes::STORAGE_ERROR,
    }
}

/// Map a failed run to an exit code.
pub fn failure_code(failure: &RunFailure) -> u8 {
    exit_code(&failure.error)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::{ConfigError, NormalizeError, StorageError, TargetError, TransportError};
    use crate::run::RunStage;

    #[test]
    fn test_exit_code_connection() {
        let error = Error::Connection(TransportError::Timeout(Duration::from_secs(7)));
        assert_eq!(exit_code(&error), codes::CONNECTION_ERROR);

        let error = Error::Session(SessionError::Transport(TransportError::Disconnected));
        assert_eq!(exit_code(&error), codes::CONNECTION_ERROR);
    }

    #[test]
    fn test_exit_code_session() {
        let error = Error::Session(SessionError::Negotiation {
            message: "no prompt".into(),
        });
        assert_eq!(exit_code(&error), codes::NEGOTIATION_ERROR);

        let error = Error::Session(SessionError::CommandTimeout {
            command: "show ip route".into(),
            timeout: Duration::from_secs(120),
            received: 0,
        });
        assert_eq!(exit_code(&error), codes::COMMAND_TIMEOUT);
    }

    #[test]
    fn test_exit_code_normalize() {
        let error = Error::Normalize(NormalizeError::Malformed {
            line: 3,
            text: "S 10.0.0.0".into(),
        });
        assert_eq!(exit_code(&error), codes::UNPARSABLE_OUTPUT);
    }

    #[test]
    fn test_exit_code_storage() {
        let failure = RunFailure {
            stage: RunStage::Persisting,
            error: StorageError::Collision {
                path: "r1.json".into(),
            }
            .into(),
        };
        assert_eq!(failure_code(&failure), codes::STORAGE_ERROR);
    }

    #[test]
    fn test_exit_code_config() {
        let error = Error::Target(TargetError::Missing {
            field: "password",
            env: "NTA_PASSWORD",
        });
        assert_eq!(exit_code(&error), codes::CONFIG_ERROR);

        let error = Error::Config(ConfigError::LoggerInstalled);
        assert_eq!(exit_code(&error), codes::CONFIG_ERROR);
    }
}
