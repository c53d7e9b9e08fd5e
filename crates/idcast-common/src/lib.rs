pub mod errors;

pub use errors::{ConfigError, ExchangeError, IdcastError};

pub type Result<T> = std::result::Result<T, IdcastError>;
