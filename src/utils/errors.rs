use thiserror::Error;

/// Unified error type for the flood node
#[derive(Error, Debug)]
pub enum NetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Address resolution error: {0}")]
    AddressResolution(String),

    #[error("Already connected to {0}")]
    AlreadyConnected(String),

    #[error("Refusing to dial own address {0}")]
    SelfDial(String),

    #[error("Channel closed")]
    ChannelClosed,
}

impl From<serde_json::Error> for NetError {
    fn from(e: serde_json::Error) -> Self {
        NetError::Codec(e.to_string())
    }
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, NetError>;
