/// Tag byte written in place of an absent value (`0xFF` on the wire).
pub const NULL_TAG: i8 = -1;

/// Maximum number of bindings a single registry accepts.
///
/// Tags occupy `0..MAX_BINDINGS` (at most 126), which keeps every tag in the positive range of an
/// `i8` and disjoint from [`NULL_TAG`].
pub const MAX_BINDINGS: usize = i8::MAX as usize;

/// Longest LEB128 encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Default limit on how deeply tagged values may nest inside each other.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default limit for any single length-prefixed payload (64 MiB).
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 64 * 1024 * 1024;

/// Name of the environment variable containing the path to the codec settings file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/hybind/codec.toml` or `$HOME/.config/hybind/codec.toml`
///  (2) on Windows: `%APPDATA%\hybind\codec.toml`
pub const ENV_CODEC_CONFIG_PATH: &str = "HYBIND_CONFIG_PATH";
