use thiserror::Error;

pub use nest_crypto::CryptoError;

#[derive(Error, Debug)]
pub enum NestError {
    /// Any failure of the cryptographic primitives, passed through unmodified
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Represents a malformed or truncated container, or a wrong stego key
    #[error("Container format error: {0}")]
    Format(String),

    /// The position generator cannot produce more distinct indices than there are units
    #[error("Cannot place {requested} bits on {available} addressable units")]
    PositionCapacity { requested: usize, available: usize },

    /// The payload does not fit, raised before the carrier is touched
    #[error("Capacity exceeded: {required} bits required but the carrier only takes {capacity} bits")]
    CapacityExceeded { required: usize, capacity: usize },

    /// The selected video frames cannot take all payload bytes
    #[error("Insufficient capacity: only {placed} of {required} bytes can be placed in the selected frames")]
    InsufficientCapacity { placed: usize, required: usize },

    /// Represents an unsupported carrier media. For example, a JPEG file is not supported
    #[error("Media format is not supported")]
    UnsupportedMedia,

    /// Represents an invalid carrier audio media. For example, a broken or 24 bit WAV file
    #[error("Audio media is invalid")]
    InvalidAudioMedia,

    /// Represents an invalid carrier image media. For example, a broken PNG file
    #[error("Image media is invalid")]
    InvalidImageMedia,

    /// Represents an invalid video frame set. For example, an empty frame directory
    #[error("Video media is invalid")]
    InvalidVideoMedia,

    /// Represents a text carrier that is not valid UTF-8
    #[error("Text media is invalid")]
    InvalidTextMedia,

    /// Represents a failure to read from input.
    #[error("Read error")]
    ReadError { source: std::io::Error },

    /// Represents a failure to write target file.
    #[error("Write error")]
    WriteError { source: std::io::Error },

    /// Represents a failure when encoding an audio file.
    #[error("Audio encoding error")]
    AudioEncodingError,

    /// Represents a failure when encoding an image file.
    #[error("Image encoding error")]
    ImageEncodingError,

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("No carrier media set")]
    CarrierNotSet,

    #[error("No target file set")]
    TargetNotSet,

    #[error("API Error: Missing payload")]
    MissingPayload,

    /// Neither a passphrase nor a suitable key was given for the requested operation
    #[error("API Error: Missing key material: {0}")]
    MissingKey(&'static str),
}
