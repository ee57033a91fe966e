use thiserror::Error;

/// A byte source could not be turned into a buffer
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read {source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name} is empty")]
    Empty { source_name: String },
}

/// The engine rejected a batch of buffers
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("No files to load")]
    Empty,

    #[error("File {index} is not a readable DICOM file: {message}")]
    Parse { index: usize, message: String },

    #[error("File {index} is missing {attribute}")]
    MissingAttribute { index: usize, attribute: &'static str },

    #[error("File {index} has no decodable pixel data: {message}")]
    PixelData { index: usize, message: String },

    #[error("Decoding stopped before all files were processed")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidOperation {
    #[error("The viewer is not initialized")]
    NotInitialized,

    #[error("No files loaded")]
    NotLoaded,

    #[error("Files are still loading")]
    LoadInProgress,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("The viewer is already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    InvalidOperation(#[from] InvalidOperation),
}

/// A serialized hierarchy snapshot did not have the expected shape
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("Malformed hierarchy snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
