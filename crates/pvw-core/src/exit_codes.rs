//! Exit codes for the pvw binary.
//!
//! Exit code ranges:
//! - 0: clean run
//! - 10-19: user/environment errors (fixable by the user)
//! - 20-29: internal errors

use pvw_common::{Error, ErrorCategory};

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Clean run.
    Clean = 0,

    /// Invalid arguments or configuration.
    ArgsError = 10,

    /// Required tool missing (lsof not on PATH).
    CapabilityError = 11,

    /// A one-shot refresh failed to collect or parse.
    CollectionFailed = 12,

    /// Internal error (bug).
    InternalError = 20,

    /// I/O error writing output.
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Codes 10-19.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&self.as_i32())
    }

    /// Codes 20 and above.
    pub fn is_internal_error(self) -> bool {
        self.as_i32() >= 20
    }

    /// Stable name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::CapabilityError => "ERR_CAPABILITY",
            ExitCode::CollectionFailed => "ERR_COLLECTION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Exit code for an error that ends a run.
    pub fn for_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Collection | ErrorCategory::Parse => ExitCode::CollectionFailed,
            ErrorCategory::Config => ExitCode::ArgsError,
            ErrorCategory::Io => ExitCode::IoError,
            ErrorCategory::Action => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
