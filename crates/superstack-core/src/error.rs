use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuperstackError {
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    #[error("modules root not found: {0}")]
    ModulesRootNotFound(String),

    #[error("invalid module path '{0}': must be relative and stay inside the modules root")]
    InvalidModulePath(String),

    #[error("context group not found: {0}")]
    GroupNotFound(String),

    #[error("context group already exists: {0} (use --force to overwrite)")]
    GroupExists(String),

    #[error("invalid group name '{0}': must be 1-64 characters of letters, digits, '-' or '_'")]
    InvalidGroupName(String),

    #[error("unknown formatter: {0}")]
    UnknownFormatter(String),

    #[error("invalid option for formatter '{formatter}': {reason}")]
    InvalidOption { formatter: String, reason: String },

    #[error("clipboard unavailable: {0} (use --stdout instead)")]
    ClipboardUnavailable(String),

    #[error("clipboard write failed: {0}")]
    ClipboardFailed(String),

    #[error("invalid feedback type '{0}': expected positive, negative or suggestion")]
    InvalidFeedbackKind(String),

    #[error("home directory not found: set HOME or SUPERSTACK_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SuperstackError>;
