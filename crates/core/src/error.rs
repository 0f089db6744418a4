#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration for {key}: {reason}")]
    Config { key: &'static str, reason: String },
}
