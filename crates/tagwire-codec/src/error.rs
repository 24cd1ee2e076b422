/// Errors that can occur while encoding or decoding values.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A codec was handed a value of a type it does not accept.
    #[error("{codec} codec cannot encode a value of type {found}")]
    TypeMismatch { codec: &'static str, found: String },

    /// The value lies outside the range the codec can represent.
    #[error("value {value} is out of range for the {codec} codec")]
    OutOfRange { codec: &'static str, value: String },

    /// No codec is registered for the value's exact type.
    #[error("no serializer registered for type {0}")]
    UnregisteredType(String),

    /// The envelope carries a tag nobody registered.
    #[error("no deserializer registered for tag {0:?}")]
    UnknownTag(String),

    /// Tags must be non-empty ASCII.
    #[error("invalid tag {0:?} (tags must be non-empty ASCII)")]
    InvalidTag(String),

    /// The input ended before a complete segment could be read.
    #[error("truncated data: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// A delimited segment contained bytes its decoder did not consume.
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),

    /// A string payload is not valid UTF-8.
    #[error("invalid UTF-8 in string payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The bytes are structurally present but semantically invalid.
    #[error("invalid data in {context}: {message}")]
    InvalidData {
        context: &'static str,
        message: String,
    },

    /// The element count of an array does not match its shape.
    #[error("shape {shape:?} holds {expected} elements, data has {found}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, CodecError>;
