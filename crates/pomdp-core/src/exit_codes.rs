//! Exit codes for the pomdp-solve CLI.
//!
//! Exit codes communicate run outcome without requiring output parsing.
//!
//! Ranges:
//! - 0-6: operational outcomes (parse outcome from code, not output)
//! - 10-19: user/environment errors (recoverable by user action)
//! - 20-29: internal errors (bugs, should be reported)

/// Exit codes for pomdp-solve operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Solver converged to tolerance, or validation passed.
    Clean = 0,

    /// Solver stopped at the requested horizon without a convergence claim.
    HorizonReached = 1,

    /// Run cancelled (signal or time budget); partial value function written.
    Interrupted = 2,

    /// Invalid arguments.
    ArgsError = 10,

    /// Model file failed validation.
    ModelError = 11,

    /// Snapshot incompatible with the given model or schema.
    SnapshotError = 12,

    /// Internal error (bug, please report).
    InternalError = 20,

    /// I/O error reading or writing files.
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Operational outcomes (codes 0-6) are not errors.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// User/environment errors (codes 10-19) are resolvable by user action.
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Internal errors (codes 20-29) indicate bugs.
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CONVERGED",
            ExitCode::HorizonReached => "OK_HORIZON",
            ExitCode::Interrupted => "OK_INTERRUPTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ModelError => "ERR_MODEL",
            ExitCode::SnapshotError => "ERR_SNAPSHOT",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        assert!(ExitCode::Clean.is_operational());
        assert!(ExitCode::HorizonReached.is_operational());
        assert!(ExitCode::Interrupted.is_operational());
        assert!(ExitCode::ModelError.is_user_error());
        assert!(ExitCode::SnapshotError.is_user_error());
        assert!(ExitCode::InternalError.is_internal_error());
        assert!(!ExitCode::Clean.is_user_error());
    }

    #[test]
    fn display_includes_name_and_code() {
        assert_eq!(ExitCode::Clean.to_string(), "OK_CONVERGED (0)");
        assert_eq!(ExitCode::ModelError.to_string(), "ERR_MODEL (11)");
    }
}
