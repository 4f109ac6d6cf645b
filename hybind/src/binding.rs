//! Registration of bindings and the frozen binding list.

use std::{fmt, ops::Deref, sync::Arc};

use log::trace;

use crate::{
    codec::{Codec, Decoding, Encoding, EncodingProducer, ProducingCodec, Typed, TypedCodec},
    magic::MAX_BINDINGS,
    serializer::{Serializer, SerializerCodec},
    shape::{RuntimeType, Shape},
    utils::error::{CodecError, CodecResult},
};

/// A registered (tag, match predicate, decoder) unit.
///
/// The tag is the binding's position in registration order and is what goes on the wire.
#[derive(Clone)]
pub struct Binding {
    tag: u8,
    encoding_for_type: EncodingProducer,
    decoding: Arc<dyn Decoding>,
}

impl Binding {
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Evaluate the match predicate against `ty`.
    pub fn encoding_for(&self, ty: &RuntimeType) -> Option<Arc<dyn Encoding>> {
        (self.encoding_for_type)(ty)
    }

    pub fn decoding(&self) -> &Arc<dyn Decoding> {
        &self.decoding
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("tag", &self.tag).finish()
    }
}

/// Immutable, ordered list of bindings produced by [`BindingsBuilder::build`].
///
/// Indexing by tag and by position are the same thing. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Bindings(Arc<[Binding]>);

impl Deref for Bindings {
    type Target = [Binding];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Accumulates bindings in registration order.
///
/// Registration order matters: when several bindings match a type, the first one registered
/// wins, even if a later one is more specific. Every failing registration leaves the builder
/// untouched.
///
/// ```
/// use hybind::{binding::BindingsBuilder, codecs::{I32Codec, StringCodec}};
///
/// let mut builder = BindingsBuilder::new();
/// builder.bind_typed(I32Codec)?.bind_typed(StringCodec)?;
/// assert!(builder.bind_typed(I32Codec).unwrap_err().is_duplicate_binding());
///
/// let bindings = builder.build();
/// assert_eq!(bindings.len(), 2);
/// assert_eq!(bindings[1].tag(), 1);
/// # Ok::<(), hybind::CodecError>(())
/// ```
#[derive(Debug, Default)]
pub struct BindingsBuilder {
    bindings: Vec<Binding>,
}

impl BindingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Register `codec` for `T` and every shape declaring `T` in its lineage.
    ///
    /// Fails with [`CodecError::DuplicateBinding`] if an existing binding already matches `T`,
    /// since the new binding could then never be selected for `T`.
    pub fn bind<T: Shape>(&mut self, codec: impl Codec + 'static) -> CodecResult<&mut Self> {
        let ty = RuntimeType::of::<T>();
        if let Some(existing) = self.bindings.iter().find(|b| b.encoding_for(&ty).is_some()) {
            return Err(CodecError::DuplicateBinding {
                type_name: ty.name().to_string(),
                existing_tag: existing.tag,
            });
        }

        let codec = Arc::new(codec);
        let encoding: Arc<dyn Encoding> = codec.clone();
        let key = ty.key();
        self.bind_with(
            move |candidate: &RuntimeType| {
                candidate
                    .is_assignable_to(key)
                    .then(|| Arc::clone(&encoding))
            },
            codec,
        )
    }

    /// Register a [`TypedCodec`] for its value type.
    ///
    /// Like [`bind`](Self::bind), the binding claims every shape declaring `C::Value` in its
    /// lineage, but a typed codec can only encode its exact value type: a subtype value routed
    /// here fails with [`CodecError::TypeMismatch`]. Use it for shapes without subtypes, and
    /// implement [`Encoding`] directly for a binding that must cover a family.
    pub fn bind_typed<C: TypedCodec>(&mut self, codec: C) -> CodecResult<&mut Self> {
        self.bind::<C::Value>(Typed::new(codec))
    }

    /// Register a synchronous [`Serializer`] for its value type.
    pub fn bind_serializer<S: Serializer>(&mut self, serializer: S) -> CodecResult<&mut Self> {
        self.bind_typed(SerializerCodec::new(serializer))
    }

    /// Register a codec that acts as its own match predicate. No uniqueness check is performed.
    pub fn bind_producer<C: ProducingCodec + 'static>(&mut self, codec: C) -> CodecResult<&mut Self> {
        let codec = Arc::new(codec);
        let producer = Arc::clone(&codec);
        self.bind_with(move |ty: &RuntimeType| producer.encoding_for_type(ty), codec)
    }

    /// Register an arbitrary predicate/decoder pair.
    ///
    /// No uniqueness check is performed; keeping resolution unambiguous is up to the caller.
    pub fn bind_with<P>(&mut self, producer: P, decoding: Arc<dyn Decoding>) -> CodecResult<&mut Self>
    where
        P: Fn(&RuntimeType) -> Option<Arc<dyn Encoding>> + Send + Sync + 'static,
    {
        let tag = self.bindings.len();
        if tag >= MAX_BINDINGS {
            return Err(CodecError::CapacityExceeded { max: MAX_BINDINGS });
        }

        trace!("registering binding #{tag}");
        self.bindings.push(Binding {
            tag: tag as u8,
            encoding_for_type: Arc::new(producer),
            decoding,
        });
        Ok(self)
    }

    /// Freeze the registered bindings.
    pub fn build(self) -> Bindings {
        Bindings(self.bindings.into())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        context::ReadContext,
        shape::{DynShape, TypeKey},
    };

    struct Unreachable;

    #[async_trait]
    impl Decoding for Unreachable {
        async fn decode(&self, _ctx: &mut ReadContext<'_>) -> CodecResult<Box<dyn DynShape>> {
            Err(CodecError::Payload("unreachable".into()))
        }
    }

    fn never(_: &RuntimeType) -> Option<Arc<dyn Encoding>> {
        None
    }

    #[test]
    fn tags_follow_registration_order() {
        let mut builder = BindingsBuilder::new();
        for _ in 0..5 {
            builder.bind_with(never, Arc::new(Unreachable)).unwrap();
        }
        let bindings = builder.build();
        for (index, binding) in bindings.iter().enumerate() {
            assert_eq!(binding.tag() as usize, index);
        }
    }

    #[test]
    fn capacity_is_one_below_i8_max() {
        let mut builder = BindingsBuilder::new();
        for _ in 0..127 {
            builder.bind_with(never, Arc::new(Unreachable)).unwrap();
        }
        assert_eq!(builder.len(), 127);

        let err = builder.bind_with(never, Arc::new(Unreachable)).unwrap_err();
        assert!(matches!(err, CodecError::CapacityExceeded { max: 127 }));
        assert_eq!(builder.len(), 127);
        assert_eq!(builder.build().last().map(Binding::tag), Some(126));
    }

    #[test]
    fn duplicate_check_uses_existing_predicates() {
        let mut builder = BindingsBuilder::new();
        let u32_key = TypeKey::of::<u32>();
        // A broad predicate that claims every u32.
        builder
            .bind_with(
                move |ty: &RuntimeType| {
                    ty.is_assignable_to(u32_key)
                        .then(|| Arc::new(Typed::new(crate::codecs::U64Codec)) as Arc<dyn Encoding>)
                },
                Arc::new(Unreachable),
            )
            .unwrap();

        let err = builder
            .bind::<u32>(Typed::new(crate::codecs::U64Codec))
            .unwrap_err();
        match err {
            CodecError::DuplicateBinding {
                type_name,
                existing_tag,
            } => {
                assert!(type_name.contains("u32"));
                assert_eq!(existing_tag, 0);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(builder.len(), 1);
    }
}
