//! CLI error handling

use std::fmt;

use apkm_errors::{Error, UserFacingError};

/// Errors that end the process with a non-zero exit code
#[derive(Debug)]
pub enum CliError {
    /// Anything raised by the library crates
    Ops(Error),
    InvalidArguments(String),
    /// The attempt ended in the Failed state. Its report was already rendered.
    InstallFailed,
    /// Writing command output failed
    Output(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Ops(e) => {
                write!(f, "{}", e.user_message())?;
                if let Some(code) = e.user_code() {
                    write!(f, " [{code}]")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Running the command again may succeed.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::InstallFailed => write!(f, "Installation failed"),
            CliError::Output(e) => write!(f, "Failed to write output: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Ops(e) => Some(e),
            CliError::Output(e) => Some(e),
            CliError::InvalidArguments(_) | CliError::InstallFailed => None,
        }
    }
}

impl From<Error> for CliError {
    fn from(e: Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Output(e)
    }
}
