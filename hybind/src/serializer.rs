//! Adapter for synchronous, buffer-oriented serializers.
//!
//! A [`Serializer`] never suspends: it writes into a [`DynBuf`] and reads from a byte slice.
//! [`SerializerCodec`] frames that output with a varint length so the payload stays
//! self-delimiting on the tagged stream.

use async_trait::async_trait;

use crate::{
    codec::TypedCodec,
    context::{ReadContext, WriteContext},
    encoding::DynBuf,
    shape::Shape,
    utils::error::{CodecError, CodecResult},
};

/// Blocking serializer for a single value type.
pub trait Serializer: Send + Sync + 'static {
    type Value: Shape;

    fn write(&self, value: &Self::Value, buf: &mut DynBuf) -> CodecResult<()>;

    /// Read a value from the front of `bytes`, advancing the slice past what was consumed.
    fn read(&self, bytes: &mut &[u8]) -> CodecResult<Self::Value>;
}

/// Length-prefixed [`TypedCodec`] over a [`Serializer`].
#[derive(Debug, Clone, Default)]
pub struct SerializerCodec<S>(S);

impl<S: Serializer> SerializerCodec<S> {
    pub fn new(serializer: S) -> Self {
        Self(serializer)
    }
}

#[async_trait]
impl<S: Serializer> TypedCodec for SerializerCodec<S> {
    type Value = S::Value;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &S::Value) -> CodecResult<()> {
        let mut buf = DynBuf::new();
        self.0.write(value, &mut buf)?;
        ctx.write_varint(buf.len() as u64).await?;
        ctx.write_bytes(&buf).await
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<S::Value> {
        let len = ctx.read_len().await?;
        let bytes = ctx.read_bytes(len).await?;

        let mut rest = bytes.as_slice();
        let value = self.0.read(&mut rest)?;
        if !rest.is_empty() {
            return Err(CodecError::Payload(format!(
                "serializer for `{}` left {} of {} bytes unread",
                std::any::type_name::<S::Value>(),
                rest.len(),
                len
            )));
        }
        Ok(value)
    }
}
