//! Reference leaf codecs for the std scalar types, strings, byte blobs and heterogeneous lists.
//!
//! [`builtin_bindings`] registers all of them in a fixed order; callers with their own shapes
//! usually register these first and append their own bindings.

mod list;
mod scalar;

pub use list::{ValueList, ValueListCodec};
pub use scalar::{
    BoolCodec, BytesCodec, F64Codec, I32Codec, I64Codec, StringCodec, U8Codec, U64Codec,
};

use crate::{binding::BindingsBuilder, utils::error::CodecResult};

/// Register every bundled codec, in this order (tags 0 to 8 on an empty builder):
/// `bool`, `u8`, `i32`, `i64`, `u64`, `f64`, `String`, `Vec<u8>`, [`ValueList`].
pub fn builtin_bindings(builder: &mut BindingsBuilder) -> CodecResult<()> {
    builder
        .bind_typed(BoolCodec)?
        .bind_typed(U8Codec)?
        .bind_typed(I32Codec)?
        .bind_typed(I64Codec)?
        .bind_typed(U64Codec)?
        .bind_typed(F64Codec)?
        .bind_typed(StringCodec)?
        .bind_typed(BytesCodec)?
        .bind_typed(ValueListCodec)?;
    Ok(())
}
