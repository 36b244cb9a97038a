use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("out-of-order extension: {message}")]
    OutOfOrderExtension { message: String },
    #[error("reference script is empty")]
    ReferenceEmpty,
    #[error("reentrant access during {context}")]
    ReentrantAccess { context: &'static str },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl AlignError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        AlignError::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        AlignError::Json { context, source }
    }

    pub(crate) fn out_of_order(message: impl Into<String>) -> Self {
        AlignError::OutOfOrderExtension {
            message: message.into(),
        }
    }

    pub(crate) fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        AlignError::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        AlignError::InvalidInput {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_include_context() {
        let io = AlignError::io(
            "reading reference script",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(io.to_string().contains("reading reference script"));

        let ooo = AlignError::out_of_order("extension for hypothesis index 4 but frontier is 2");
        assert!(ooo.to_string().starts_with("out-of-order extension:"));

        let reentrant = AlignError::ReentrantAccess {
            context: "push_token",
        };
        assert_eq!(
            reentrant.to_string(),
            "reentrant access during push_token"
        );
    }

    #[test]
    fn invalid_input_wraps_message() {
        let err = AlignError::invalid_input("commit window must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid input: commit window must be at least 1"
        );
    }
}
