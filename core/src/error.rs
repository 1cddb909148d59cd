//! # Error Handling
//!
//! Provides the unified `AppError` enum used by the spec pipeline.
//! Request binding reports its own fail-complete `BindErrors` instead
//! (see [`crate::binding::handler`]).

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// YAML (de)serialization failure.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// JSON value conversion failure.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Invalid or unreadable configuration.
    #[from(ignore)]
    #[display("Config Error: {_0}")]
    Config(String),

    /// Controller source could not be scanned.
    #[from(ignore)]
    #[display("Scan Error: {_0}")]
    Scan(String),

    /// A resource could not be generated.
    #[from(ignore)]
    #[display("Generation Error: {_0}")]
    Generation(String),

    /// The committed spec differs from what the sources generate.
    #[from(ignore)]
    #[display("Spec drift in resource '{uri}' at '{pointer}'")]
    Drift {
        /// URI of the offending resource.
        uri: String,
        /// JSON pointer of the first difference.
        pointer: String,
    },

    /// The assembled document is not structurally valid Swagger 2.0.
    #[from(ignore)]
    #[display("Invalid Document: {_0}")]
    InvalidDocument(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_drift_display_names_resource() {
        let err = AppError::Drift {
            uri: "econ-models".into(),
            pointer: "/paths/~1econ-models/get".into(),
        };
        assert_eq!(
            err.to_string(),
            "Spec drift in resource 'econ-models' at '/paths/~1econ-models/get'"
        );
    }

    #[test]
    fn test_yaml_conversion() {
        let yaml_err = serde_yaml::from_str::<serde_json::Value>("a: [").unwrap_err();
        let app_err: AppError = yaml_err.into();
        assert!(matches!(app_err, AppError::Yaml(_)));
    }
}
