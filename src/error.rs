use std::path::Path;

/// Local file I/O failed, or a landing input from an earlier stage is missing.
pub const EXIT_IO: u8 = 2;
/// The inputs were readable but contained nothing usable.
pub const EXIT_NO_DATA: u8 = 3;
/// A remote source (search site or catalog API) could not be reached.
pub const EXIT_SOURCE: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// File-level failure with the offending path in the message.
    pub fn io(action: &str, path: &Path, err: impl std::fmt::Display) -> Self {
        Self::new(EXIT_IO, format!("Failed to {action} '{}': {err}", path.display()))
    }

    pub fn source(message: impl Into<String>) -> Self {
        Self::new(EXIT_SOURCE, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = AppError::io("open", Path::new("landing/x.json"), "denied");
        assert_eq!(err.exit_code(), EXIT_IO);
        assert_eq!(err.to_string(), "Failed to open 'landing/x.json': denied");
    }
}
