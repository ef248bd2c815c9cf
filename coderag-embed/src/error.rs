//! Error types for the embedding system

/// Result type for embedding operations.
///
/// Convenience alias using [`EmbedError`] as the error type.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type for all embedding operations.
///
/// Covers configuration problems, model loading failures, and runtime
/// failures during embedding generation. Integrates with [`thiserror`] for
/// automatic [`std::error::Error`] implementation and error chaining.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Error when the provider configuration is invalid or the provider is
    /// used before initialization
    #[error("Invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// Error during model initialization
    #[error("Model initialization failed: {source}")]
    ModelInitialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// IO errors when touching model files
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Async task join errors
    #[error("Async task failed: {source}")]
    AsyncTask {
        #[from]
        source: tokio::task::JoinError,
    },

    /// Generic errors from other libraries
    #[error("External error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl EmbedError {
    /// Wrap an error that occurred while loading or initializing a model.
    pub fn model_init<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ModelInitialization {
            source: Box::new(source),
        }
    }

    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_carries_message() {
        let err = EmbedError::invalid_config("model not initialized");
        assert!(err.to_string().contains("model not initialized"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EmbedError = io.into();
        assert!(matches!(err, EmbedError::Io { .. }));
    }
}
