use strum::EnumIs;
use thiserror::Error;

#[derive(Debug, Error, EnumIs)]
pub enum CodecError {
    /// An exact-type binding is already matched by an earlier binding.
    #[error(
        "A binding for `{type_name}` would never be selected: binding #{existing_tag} already matches this type."
    )]
    DuplicateBinding { type_name: String, existing_tag: u8 },

    /// Too many bindings for a single signed tag byte.
    #[error("Cannot register more than {max} bindings, tags must fit in a single signed byte.")]
    CapacityExceeded { max: usize },

    /// No registered binding matches the concrete type of a value.
    #[error("Don't know how to serialize an object of type `{type_name}`.")]
    UnsupportedType { type_name: String },

    /// A tag byte that names neither a binding nor the null sentinel.
    #[error("Corrupt stream: tag {tag} does not identify any of the {bindings} registered bindings.")]
    CorruptStream { tag: i8, bindings: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A typed codec was handed a value of another type.
    #[error("Codec for `{expected}` cannot encode a value of type `{found}`.")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid UTF-8 in string payload: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Malformed varint: no terminating byte within {max} bytes or value overflows 64 bits.")]
    MalformedVarint { max: usize },

    #[error("Payload length {len} exceeds the configured limit of {max} bytes.")]
    PayloadTooLarge { len: u64, max: usize },

    #[error("Value nesting exceeds the configured depth limit of {max}.")]
    DepthExceeded { max: usize },

    #[error("Failed to parse codec settings from '{file}': {source}")]
    ConfigParse {
        source: toml::de::Error,
        file: String,
    },

    /// Failure reported by a binding's own payload format.
    #[error("{0}")]
    Payload(String),

    #[error("An unknown error occurred: {0}")]
    Unknown(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
