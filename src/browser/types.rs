// Error types for the browser session adapter

/// Result type for browser session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Error types for browser session operations
#[derive(Debug)]
pub enum SessionError {
    /// Browser process could not be started or its first page opened
    Launch(String),

    /// Navigation to the target URL failed
    Navigation(String),

    /// An in-page expression could not be evaluated
    Evaluation(String),

    /// Screenshot capture or encoding failed
    Screenshot(String),

    /// The session was already closed
    Closed,

    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Launch(msg) => write!(f, "Browser launch failed: {}", msg),
            SessionError::Navigation(msg) => write!(f, "Navigation failed: {}", msg),
            SessionError::Evaluation(msg) => write!(f, "Evaluation failed: {}", msg),
            SessionError::Screenshot(msg) => write!(f, "Screenshot failed: {}", msg),
            SessionError::Closed => write!(f, "Browser session is closed"),
            SessionError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Io(err)
    }
}

impl From<image::ImageError> for SessionError {
    fn from(err: image::ImageError) -> Self {
        SessionError::Screenshot(err.to_string())
    }
}
