use thiserror::Error;

#[derive(Error, Debug)]
pub enum OffboardError {
    #[error("HTTP transport error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Not found: {resource}")]
    NotFoundError { resource: String },

    #[error("Not authorized for {operation}")]
    UnauthorizedError { operation: String },

    #[error("Permission denied on {resource}")]
    PermissionDeniedError { resource: String },

    #[error("Conflicting state on {resource}")]
    ConflictError { resource: String },

    #[error("Directory API error ({status}): {detail}")]
    DirectoryApiError { status: u16, detail: String },

    #[error("Mailbox API error ({status}): {detail}")]
    MailboxApiError { status: u16, detail: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, OffboardError>;
