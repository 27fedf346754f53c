//! CLI-specific error types and exit code mapping

use mibtrap_core::error::MibtrapError;
use mibtrap_mib_catalog::CatalogError;
use mibtrap_trap_pipeline::TrapError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// MIB module or device mapping could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (socket, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from mibtrap-core.
    #[error("{0}")]
    Core(#[from] MibtrapError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                |
    /// |------|------------------------|
    /// | 0    | Success                |
    /// | 1    | General / command error |
    /// | 2    | Configuration error     |
    /// | 3    | Catalog / mapping error |
    /// | 10   | IO error                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Catalog(_) => 3,
            Self::Io(_) => 10,
            Self::Core(core) => match core {
                MibtrapError::Config(_) => 2,
                MibtrapError::Catalog(_) => 3,
                MibtrapError::Io(_) => 10,
                MibtrapError::Pipeline(_) => 1,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<TrapError> for CliError {
    fn from(e: TrapError) -> Self {
        match e {
            TrapError::Io(io) => Self::Io(io),
            other => Self::Command(other.to_string()),
        }
    }
}
