//! Capabilities a binding is made of.
//!
//! The tagged codec only deals with erased values: an [`Encoding`] writes the payload of a
//! `&dyn DynShape`, a [`Decoding`] reads one back into a `Box<dyn DynShape>`. Most leaf codecs are
//! easier to write against a single concrete type, which is what [`TypedCodec`] is for; the
//! [`Typed`] adapter bridges the two.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    context::{ReadContext, WriteContext},
    shape::{DynShape, RuntimeType, Shape},
    utils::error::{CodecError, CodecResult},
};

/// Writes the payload of a value, without the tag byte.
///
/// The payload must be self-delimiting: the paired [`Decoding`] has to consume exactly the bytes
/// written here, as nothing else frames it on the wire.
#[async_trait]
pub trait Encoding: Send + Sync {
    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &dyn DynShape) -> CodecResult<()>;
}

/// Reads a payload written by the matching [`Encoding`].
#[async_trait]
pub trait Decoding: Send + Sync {
    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<Box<dyn DynShape>>;
}

/// Both directions of a payload format.
pub trait Codec: Encoding + Decoding {}
impl<T: Encoding + Decoding + ?Sized> Codec for T {}

/// The match predicate of a binding.
///
/// Returns the encoding to use for values of the given runtime type, or `None` if the binding
/// does not cover that type. It must be pure: the tagged codec memoizes its answer per type.
pub type EncodingProducer = Arc<dyn Fn(&RuntimeType) -> Option<Arc<dyn Encoding>> + Send + Sync>;

/// A single object acting as its own match predicate and decoder.
///
/// Useful for bindings covering an open family of types that cannot be described by a single
/// [`Shape`] and its subtypes.
pub trait ProducingCodec: Decoding {
    fn encoding_for_type(&self, ty: &RuntimeType) -> Option<Arc<dyn Encoding>>;
}

/// Statically typed codec for a single [`Shape`].
#[async_trait]
pub trait TypedCodec: Send + Sync + 'static {
    type Value: Shape;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &Self::Value) -> CodecResult<()>;

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<Self::Value>;
}

/// Adapter exposing a [`TypedCodec`] as an erased [`Codec`].
///
/// Values are recovered with a downcast, so a typed codec only ever encodes its exact
/// [`TypedCodec::Value`]; any other type, subtypes included, is a
/// [`CodecError::TypeMismatch`]. Bindings that must cover subtypes implement [`Encoding`]
/// directly.
#[derive(Debug, Clone, Default)]
pub struct Typed<C>(C);

impl<C: TypedCodec> Typed<C> {
    pub fn new(inner: C) -> Self {
        Self(inner)
    }

    pub fn into_inner(self) -> C {
        self.0
    }
}

#[async_trait]
impl<C: TypedCodec> Encoding for Typed<C> {
    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &dyn DynShape) -> CodecResult<()> {
        let typed =
            value
                .downcast_ref::<C::Value>()
                .ok_or_else(|| CodecError::TypeMismatch {
                    expected: std::any::type_name::<C::Value>(),
                    found: value.runtime_type().name(),
                })?;
        TypedCodec::encode(&self.0, ctx, typed).await
    }
}

#[async_trait]
impl<C: TypedCodec> Decoding for Typed<C> {
    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<Box<dyn DynShape>> {
        let value = TypedCodec::decode(&self.0, ctx).await?;
        Ok(Box::new(value))
    }
}
