use async_trait::async_trait;

use crate::{
    codec::TypedCodec,
    context::{ReadContext, WriteContext},
    utils::error::{CodecError, CodecResult},
};

/// `bool` as a single `0`/`1` byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

#[async_trait]
impl TypedCodec for BoolCodec {
    type Value = bool;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &bool) -> CodecResult<()> {
        ctx.write_u8(*value as u8).await
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<bool> {
        match ctx.read_u8().await? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::Payload(format!("invalid boolean byte {other:#04x}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct U8Codec;

#[async_trait]
impl TypedCodec for U8Codec {
    type Value = u8;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &u8) -> CodecResult<()> {
        ctx.write_u8(*value).await
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<u8> {
        ctx.read_u8().await
    }
}

/// `i32` as a zig-zag varint.
#[derive(Debug, Clone, Copy, Default)]
pub struct I32Codec;

#[async_trait]
impl TypedCodec for I32Codec {
    type Value = i32;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &i32) -> CodecResult<()> {
        ctx.write_zigzag(*value as i64).await
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<i32> {
        let wide = ctx.read_zigzag().await?;
        i32::try_from(wide).map_err(|_| CodecError::Payload(format!("{wide} does not fit in an i32")))
    }
}

/// `i64` as a zig-zag varint.
#[derive(Debug, Clone, Copy, Default)]
pub struct I64Codec;

#[async_trait]
impl TypedCodec for I64Codec {
    type Value = i64;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &i64) -> CodecResult<()> {
        ctx.write_zigzag(*value).await
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<i64> {
        ctx.read_zigzag().await
    }
}

/// `u64` as a varint.
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Codec;

#[async_trait]
impl TypedCodec for U64Codec {
    type Value = u64;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &u64) -> CodecResult<()> {
        ctx.write_varint(*value).await
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<u64> {
        ctx.read_varint().await
    }
}

/// `f64` as its 8 little-endian IEEE-754 bytes, so NaN payloads survive.
#[derive(Debug, Clone, Copy, Default)]
pub struct F64Codec;

#[async_trait]
impl TypedCodec for F64Codec {
    type Value = f64;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &f64) -> CodecResult<()> {
        ctx.write_bytes(&value.to_le_bytes()).await
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<f64> {
        let mut bytes = [0u8; 8];
        ctx.read_exact(&mut bytes).await?;
        Ok(f64::from_le_bytes(bytes))
    }
}

/// `String` as a varint byte length followed by UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

#[async_trait]
impl TypedCodec for StringCodec {
    type Value = String;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &String) -> CodecResult<()> {
        ctx.write_str(value).await
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<String> {
        ctx.read_str().await
    }
}

/// `Vec<u8>` as a varint length followed by the raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

#[async_trait]
impl TypedCodec for BytesCodec {
    type Value = Vec<u8>;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &Vec<u8>) -> CodecResult<()> {
        ctx.write_varint(value.len() as u64).await?;
        ctx.write_bytes(value).await
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<Vec<u8>> {
        let len = ctx.read_len().await?;
        ctx.read_bytes(len).await
    }
}
