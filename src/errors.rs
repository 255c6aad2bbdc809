use std::fmt;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Everything that can go wrong between reading the request and writing the
/// reply. Interpreter failures keep the formatted traceback when one exists.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    Python { message: String, traceback: Option<String> },
    BufferTooSmall { needed: usize, capacity: usize },
    MissingTerminator { position: usize },
    InvalidUtf8 { position: usize },
    InvalidJson { field: &'static str, detail: String },
    NullPointer { param: &'static str },
    Config { detail: String },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python { message, .. } => write!(f, "{}", message),
            Self::BufferTooSmall { needed, capacity } => {
                write!(f, "Buffer too small: need {} bytes, have {}", needed, capacity)
            }
            Self::MissingTerminator { position } => {
                write!(f, "Unterminated string in buffer at byte {}", position)
            }
            Self::InvalidUtf8 { position } => {
                write!(f, "Invalid UTF-8 in buffer at byte {}", position)
            }
            Self::InvalidJson { field, detail } => {
                write!(f, "Invalid JSON in {}: {}", field, detail)
            }
            Self::NullPointer { param } => {
                write!(f, "Null pointer passed for '{}'", param)
            }
            Self::Config { detail } => {
                write!(f, "Configuration error: {}", detail)
            }
        }
    }
}

impl BridgeError {
    /// Render the error the way it travels back to the caller: the message,
    /// then the traceback when the interpreter produced one.
    pub fn to_report(&self) -> String {
        match self {
            Self::Python { message, traceback: Some(tb) } => {
                format!("{}\n{}", message, tb.trim_end())
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_includes_traceback() {
        let err = BridgeError::Python {
            message: "ZeroDivisionError: division by zero".to_string(),
            traceback: Some("Traceback (most recent call last):\n  ...\n".to_string()),
        };

        let report = err.to_report();
        assert!(report.starts_with("ZeroDivisionError"));
        assert!(report.contains("Traceback (most recent call last):"));
        assert!(!report.ends_with('\n'));
    }

    #[test]
    fn test_report_without_traceback() {
        let err = BridgeError::Python {
            message: "ModuleNotFoundError: No module named 'x'".to_string(),
            traceback: None,
        };
        assert_eq!(err.to_report(), "ModuleNotFoundError: No module named 'x'");
    }

    #[test]
    fn test_display() {
        let err = BridgeError::BufferTooSmall { needed: 16, capacity: 8 };
        assert_eq!(err.to_string(), "Buffer too small: need 16 bytes, have 8");

        let err = BridgeError::InvalidJson { field: "args", detail: "expected value".to_string() };
        assert_eq!(err.to_string(), "Invalid JSON in args: expected value");
    }
}
