//! The tagged codec: one tag byte identifying a binding, followed by that binding's payload.
//!
//! Wire format of a single value:
//! - absent value: the single byte `0xFF` ([`NULL_TAG`]);
//! - present value: the tag of the first binding matching its runtime type, in `0..=126`,
//!   immediately followed by the binding's self-delimiting payload.
//!
//! There is no header, length prefix or version marker.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;

use crate::{
    binding::{Bindings, BindingsBuilder},
    codec::{Decoding, Encoding},
    config::CodecSettings,
    context::{ReadContext, WriteContext},
    magic::NULL_TAG,
    shape::{DynShape, RuntimeType, TypeKey},
    utils::error::{CodecError, CodecResult},
};

#[derive(Clone)]
struct TaggedEncoding {
    tag: u8,
    encoding: Arc<dyn Encoding>,
}

/// Encodes and decodes values of any registered shape, dispatching on their runtime type.
///
/// Resolving a type scans the bindings in registration order and keeps the first match. The
/// outcome is memoized per concrete type for the lifetime of the codec, so the scan runs at most
/// once per type (twice if two tasks race on the same unseen type; both reach the same answer).
///
/// ```
/// use hybind::{TaggedCodec, codecs::{I32Codec, StringCodec}};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let codec = TaggedCodec::build(|b| {
///     b.bind_typed(I32Codec)?.bind_typed(StringCodec)?;
///     Ok(())
/// })?;
///
/// let bytes = codec.encode_to_vec(Some(&String::from("hi"))).await?;
/// assert_eq!(bytes, [0x01, 0x02, b'h', b'i']);
/// assert_eq!(codec.encode_to_vec(None).await?, [0xFF]);
///
/// let value = codec.decode_from_slice(&bytes).await?.unwrap();
/// assert_eq!(value.downcast_ref::<String>().unwrap(), "hi");
/// # Ok::<(), hybind::CodecError>(())
/// # }).unwrap();
/// ```
pub struct TaggedCodec {
    bindings: Bindings,
    encodings: DashMap<TypeKey, TaggedEncoding>,
    settings: CodecSettings,
    resolutions: AtomicUsize,
}

impl TaggedCodec {
    pub fn new(bindings: Bindings) -> Self {
        Self::with_settings(bindings, CodecSettings::default())
    }

    pub fn with_settings(bindings: Bindings, settings: CodecSettings) -> Self {
        debug!(
            "creating tagged codec over {} bindings ({:?})",
            bindings.len(),
            settings
        );
        Self {
            bindings,
            encodings: DashMap::new(),
            settings,
            resolutions: AtomicUsize::new(0),
        }
    }

    /// Register bindings through `f` and build a codec over them.
    pub fn build(f: impl FnOnce(&mut BindingsBuilder) -> CodecResult<()>) -> CodecResult<Self> {
        let mut builder = BindingsBuilder::new();
        f(&mut builder)?;
        Ok(Self::new(builder.build()))
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn settings(&self) -> &CodecSettings {
        &self.settings
    }

    /// Number of binding scans performed so far, i.e. resolution cache misses.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }

    /// Number of concrete types whose resolution is memoized.
    pub fn cached_types(&self) -> usize {
        self.encodings.len()
    }

    /// Tag that values of type `ty` are written with.
    pub fn tag_for(&self, ty: &RuntimeType) -> CodecResult<u8> {
        Ok(self.tagged_encoding_for(ty)?.tag)
    }

    /// Write `value` as a tag byte followed by its payload.
    ///
    /// Nothing is written if the value's type is not supported or the depth limit is reached.
    /// The nesting depth of `ctx` is restored whether or not the payload succeeds.
    pub async fn encode(
        &self,
        ctx: &mut WriteContext<'_>,
        value: Option<&dyn DynShape>,
    ) -> CodecResult<()> {
        let Some(value) = value else {
            return ctx.write_i8(NULL_TAG).await;
        };

        let tagged = self.tagged_encoding_for(&value.runtime_type())?;
        ctx.descend()?;
        let written = Self::encode_tagged(ctx, &tagged, value).await;
        ctx.ascend();
        written
    }

    /// Read one tagged value; `None` stands for the null sentinel.
    pub async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<Option<Box<dyn DynShape>>> {
        let tag = ctx.read_i8().await?;
        if tag == NULL_TAG {
            return Ok(None);
        }

        let binding = usize::try_from(tag)
            .ok()
            .and_then(|index| self.bindings.get(index))
            .ok_or(CodecError::CorruptStream {
                tag,
                bindings: self.bindings.len(),
            })?;

        ctx.descend()?;
        let value = binding.decoding().decode(ctx).await;
        ctx.ascend();
        Ok(Some(value?))
    }

    /// Encode a single value into a fresh buffer.
    pub async fn encode_to_vec(&self, value: Option<&dyn DynShape>) -> CodecResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut ctx = WriteContext::new(self, &mut out);
        self.encode(&mut ctx, value).await?;
        Ok(out)
    }

    /// Decode a single value from the front of `bytes`. Trailing bytes are ignored.
    pub async fn decode_from_slice(&self, bytes: &[u8]) -> CodecResult<Option<Box<dyn DynShape>>> {
        let mut source = bytes;
        let mut ctx = ReadContext::new(self, &mut source);
        self.decode(&mut ctx).await
    }

    async fn encode_tagged(
        ctx: &mut WriteContext<'_>,
        tagged: &TaggedEncoding,
        value: &dyn DynShape,
    ) -> CodecResult<()> {
        ctx.write_u8(tagged.tag).await?;
        tagged.encoding.encode(ctx, value).await
    }

    fn tagged_encoding_for(&self, ty: &RuntimeType) -> CodecResult<TaggedEncoding> {
        if let Some(hit) = self.encodings.get(&ty.key()) {
            return Ok(hit.clone());
        }

        // Computed outside of any shard lock: predicates may be slow, and a duplicate
        // computation on a race yields the same binding.
        let computed = self.compute_encoding(ty)?;
        Ok(self.encodings.entry(ty.key()).or_insert(computed).clone())
    }

    fn compute_encoding(&self, ty: &RuntimeType) -> CodecResult<TaggedEncoding> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);

        for binding in self.bindings.iter() {
            if let Some(encoding) = binding.encoding_for(ty) {
                debug!("resolved `{}` to binding #{}", ty.name(), binding.tag());
                return Ok(TaggedEncoding {
                    tag: binding.tag(),
                    encoding,
                });
            }
        }

        Err(CodecError::UnsupportedType {
            type_name: ty.name().to_string(),
        })
    }
}

/// A tagged codec can itself be bound inside another registry. Null values cannot be
/// represented this way: decoding the sentinel fails.
#[async_trait]
impl Encoding for TaggedCodec {
    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &dyn DynShape) -> CodecResult<()> {
        TaggedCodec::encode(self, ctx, Some(value)).await
    }
}

#[async_trait]
impl Decoding for TaggedCodec {
    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<Box<dyn DynShape>> {
        TaggedCodec::decode(self, ctx)
            .await?
            .ok_or_else(|| CodecError::Payload("unexpected null value in nested tagged codec".into()))
    }
}
