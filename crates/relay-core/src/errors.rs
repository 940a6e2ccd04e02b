/// Core error type for the relay bot.
///
/// Adapter crates map their specific errors into this type so the engine can
/// tell transport failures (fallback or ignore) from validation failures
/// (usage hint).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
