use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnicatError {
    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Banned by the service: {0}")]
    Banned(String),

    #[error("No reply from the service after {0} attempts")]
    Timeout(usize),

    #[error("Service replied {code} {message}")]
    Service { code: u16, message: String },

    #[error("Malformed service reply: {0}")]
    MalformedReply(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("No fields requested")]
    NoFields,

    #[error("Unrecognized watch date {0:?}, use epoch seconds or YYYY-MM-DD")]
    InvalidWatchDate(String),

    #[error("Username and password are required; pass -u/-p, --login, or set [auth] in the config file")]
    MissingCredentials,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnicatError>;
