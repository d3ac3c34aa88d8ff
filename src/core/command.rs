use async_trait::async_trait;
use crate::core::library::{CirculationRule, LibraryError};

#[derive(Debug)]
pub enum CommandError {
    Busy {
        message: String,
        reason_code: Option<String>,
    },
    Conflict {
        rule: CirculationRule,
        message: String,
    },
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    NotFound {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    Serialization {
        message: String,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
}

#[async_trait]
pub trait Command<Request, Response> {
    async fn execute(&self, req: Request) -> Result<Response, CommandError>;
}

impl From<LibraryError> for CommandError {
    fn from(other: LibraryError) -> Self {
        match other {
            LibraryError::Database { message, reason_code, retryable } => {
                CommandError::Database { message, reason_code, retryable }
            }
            LibraryError::NotFound { message } => {
                CommandError::NotFound { message }
            }
            LibraryError::CurrentlyUnavailable { message, reason_code, .. } => {
                CommandError::Busy { message, reason_code }
            }
            LibraryError::Validation { message, reason_code } => {
                CommandError::Validation { message, reason_code }
            }
            LibraryError::BusinessRule { rule, message } => {
                CommandError::Conflict { rule, message }
            }
            LibraryError::Serialization { message } => {
                CommandError::Serialization { message }
            }
            LibraryError::Runtime { message, reason_code } => {
                CommandError::Runtime { message, reason_code, retryable: false }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::command::CommandError;
    use crate::core::library::{CirculationRule, LibraryError};

    #[tokio::test]
    async fn test_should_translate_library_errors() {
        assert!(matches!(CommandError::from(LibraryError::busy("locked")), CommandError::Busy { .. }));
        assert!(matches!(CommandError::from(LibraryError::duplicate_hold("twice")),
            CommandError::Conflict { rule: CirculationRule::DuplicateHold, .. }));
        assert!(matches!(CommandError::from(LibraryError::not_found("gone")), CommandError::NotFound { .. }));
        assert!(matches!(CommandError::from(LibraryError::validation("bad", None)), CommandError::Validation { .. }));
    }
}
