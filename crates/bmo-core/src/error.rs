use thiserror::Error;

/// Top-level error type for the BMO backend.
///
/// Subsystem crates keep their own error enums and convert into this one at
/// the composition root, so `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BmoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl From<toml::de::Error> for BmoError {
    fn from(err: toml::de::Error) -> Self {
        BmoError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BmoError {
    fn from(err: toml::ser::Error) -> Self {
        BmoError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BmoError {
    fn from(err: serde_json::Error) -> Self {
        BmoError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for BMO operations.
pub type Result<T> = std::result::Result<T, BmoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BmoError::Config("missing api key".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing api key");

        let err = BmoError::Server("bind failed".to_string());
        assert_eq!(err.to_string(), "Server error: bind failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let bmo_err: BmoError = io_err.into();
        assert!(matches!(bmo_err, BmoError::Io(_)));
        assert!(bmo_err.to_string().starts_with("I/O error:"));
        assert!(bmo_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let bmo_err: BmoError = err.unwrap_err().into();
        assert!(matches!(bmo_err, BmoError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let bmo_err: BmoError = err.unwrap_err().into();
        assert!(matches!(bmo_err, BmoError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
