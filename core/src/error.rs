use std::path::PathBuf;

/// Error raised while loading a configuration.
///
/// Every variant carries enough context to point a user at the offending file
/// and line. No partially built configuration is ever returned alongside one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}:{column}: {message}", .path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{}:{line}: {message}", .path.display())]
    Invalid {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Raised by `Configuration::from_entries`, where no file location exists.
    #[error("Entry '{entry}': {message}")]
    Entry { entry: String, message: String },
}

/// Misuse of a [`ComboHandle`](crate::ComboHandle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ComboError {
    #[error("Combo handle used after it was freed")]
    Freed,

    #[error("Combo handle is not bound to a combo")]
    Unbound,

    #[error("Combo handle is bound to command {bound}, but the cursor is at {cursor}")]
    CursorMismatch { cursor: u64, bound: u64 },
}

/// Failure of one of the bounded formatting routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Formatted command needs {needed} bytes, buffer holds {capacity}")]
    Truncated { needed: usize, capacity: usize },

    #[error(transparent)]
    Combo(#[from] ComboError),
}
