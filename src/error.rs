use thiserror::Error;

#[derive(Error, Debug)]
pub enum LivecapError {
    /// The server answered with `ok: false`; the message is shown to the user as-is.
    #[error("{0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LivecapError>;
