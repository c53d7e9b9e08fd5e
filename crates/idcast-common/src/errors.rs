use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures of the presence exchange session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("not connected")]
    NotConnected,

    #[error("identity already selected: {0}")]
    IdentityAlreadySelected(u32),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("failed to encode announcement: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum IdcastError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("broker.topic must not be empty".into());
        assert_eq!(
            err.to_string(),
            "config validation error: broker.topic must not be empty"
        );
    }

    #[test]
    fn exchange_error_display() {
        assert_eq!(ExchangeError::NotConnected.to_string(), "not connected");
        assert_eq!(
            ExchangeError::IdentityAlreadySelected(2).to_string(),
            "identity already selected: 2"
        );
        assert_eq!(
            ExchangeError::ConnectionClosed.to_string(),
            "connection closed"
        );
    }

    #[test]
    fn idcast_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: IdcastError = config_err.into();
        assert!(matches!(err, IdcastError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn idcast_error_from_exchange() {
        let err: IdcastError = ExchangeError::NotConnected.into();
        assert!(matches!(err, IdcastError::Exchange(ExchangeError::NotConnected)));
        assert_eq!(err.to_string(), "not connected");
    }

    #[test]
    fn idcast_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin gone");
        let err: IdcastError = io_err.into();
        assert!(matches!(err, IdcastError::Io(_)));
        assert!(err.to_string().contains("stdin gone"));
    }
}
