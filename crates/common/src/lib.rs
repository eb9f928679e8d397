/// Common error types shared by the ethbind crates

/// Error type for ABI handling, binding generation and contract operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed ABI document or type string
    #[error("Invalid ABI: {0}")]
    Abi(String),

    /// No ABI entry matches the requested name
    #[error("Unknown ABI item: {0}")]
    UnknownItem(String),

    /// A value could not be encoded against its declared type
    #[error("Failed to encode `{path}`: {message}")]
    Encoding { path: String, message: String },

    /// A payload did not match the declared outputs
    #[error("Failed to decode `{path}`: {message}")]
    Decoding { path: String, message: String },

    /// Link references exist but no address was supplied for a library
    #[error("Missing library address for {file}:{contract}")]
    MissingLibraryAddress { file: String, contract: String },

    /// A library address was not 20 bytes of hex
    #[error("Invalid address for library {file}:{contract}: {address}")]
    InvalidLibraryAddress {
        file: String,
        contract: String,
        address: String,
    },

    /// A link reference points outside the bytecode
    #[error("Link reference {file}:{contract} at byte {start} is out of range")]
    LinkOffset {
        file: String,
        contract: String,
        start: usize,
    },

    /// Deployment attempted without bytecode
    #[error("Contract has no bytecode")]
    MissingBytecode,

    /// Operation needs a bound contract address
    #[error("Contract address is not set")]
    MissingAddress,

    /// Deployment submitted but the receipt is unusable
    #[error("Deployment failed: {0}")]
    Deployment(String),

    /// Binding generation failed
    #[error("Code generation error: {0}")]
    Codegen(String),

    /// Failure reported by the transport collaborator
    #[error(transparent)]
    Transport(anyhow::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new ABI error
    pub fn abi<S: Into<String>>(msg: S) -> Self {
        Error::Abi(msg.into())
    }

    /// Create a new unknown item error
    pub fn unknown_item<S: Into<String>>(name: S) -> Self {
        Error::UnknownItem(name.into())
    }

    /// Create a new encoding error for the value at `path`
    pub fn encoding<P: Into<String>, S: Into<String>>(path: P, msg: S) -> Self {
        Error::Encoding {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a new decoding error for the value at `path`
    pub fn decoding<P: Into<String>, S: Into<String>>(path: P, msg: S) -> Self {
        Error::Decoding {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a new missing library error
    pub fn missing_library<F: Into<String>, C: Into<String>>(file: F, contract: C) -> Self {
        Error::MissingLibraryAddress {
            file: file.into(),
            contract: contract.into(),
        }
    }

    /// Create a new code generation error
    pub fn codegen<S: Into<String>>(msg: S) -> Self {
        Error::Codegen(msg.into())
    }

    /// Wrap a transport failure without altering it
    pub fn transport<E: Into<anyhow::Error>>(err: E) -> Self {
        Error::Transport(err.into())
    }

    /// Whether the error was raised locally before reaching the transport
    pub fn is_local(&self) -> bool {
        !matches!(self, Error::Transport(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
