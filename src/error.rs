use std::path::PathBuf;

#[derive(Debug)]
pub struct Error {
    message: String,
}

impl Error {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

/// Failure to turn a texture file into a GPU texture. Always fatal.
#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidContainer(String),
    UnsupportedTexture(String),
    Gpu(String),
}

impl LoadError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidContainer(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedTexture(message.into())
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path, .. } => {
                write!(f, "Unable to read texture file {}", path.display())
            }
            LoadError::InvalidContainer(message) => {
                write!(f, "Invalid texture container: {message}")
            }
            LoadError::UnsupportedTexture(message) => {
                write!(f, "Unsupported texture: {message}")
            }
            LoadError::Gpu(message) => write!(f, "Failed to upload texture: {message}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
