use std::process::ExitCode;

/// Exit status for CLI commands, following common conventions for linter tools.
///
/// - `Success` (0): Analysis completed, nothing blocking was found
/// - `Failure` (1): Analysis completed and found a critical diagnostic or a
///   confirmed infinite loop
/// - `Error` (2): Invocation failed (bad configuration, unreadable root, ...)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Analysis completed, nothing blocking was found.
    Success,
    /// Analysis completed with at least one blocking diagnostic.
    Failure,
    /// Command failed due to an invocation error.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
