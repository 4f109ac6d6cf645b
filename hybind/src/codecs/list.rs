use async_trait::async_trait;

use crate::{
    codec::TypedCodec,
    context::{ReadContext, WriteContext},
    impl_shape,
    shape::DynShape,
    utils::error::CodecResult,
};

/// Heterogeneous list whose elements are themselves tagged values. `None` elements are allowed.
#[derive(Debug, Default)]
pub struct ValueList(pub Vec<Option<Box<dyn DynShape>>>);

impl_shape!(ValueList);

impl ValueList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl DynShape) {
        self.0.push(Some(Box::new(value)));
    }

    pub fn push_null(&mut self) {
        self.0.push(None);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element at `index`, downcast to `T`. `None` for nulls, type mismatches and out of range.
    pub fn get<T: DynShape>(&self, index: usize) -> Option<&T> {
        self.0.get(index)?.as_deref()?.downcast_ref::<T>()
    }
}

/// [`ValueList`] as a varint element count followed by each element as a nested tagged value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueListCodec;

#[async_trait]
impl TypedCodec for ValueListCodec {
    type Value = ValueList;

    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &ValueList) -> CodecResult<()> {
        ctx.write_varint(value.len() as u64).await?;
        for element in &value.0 {
            ctx.write_value(element.as_deref()).await?;
        }
        Ok(())
    }

    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<ValueList> {
        let count = ctx.read_len().await?;
        // Each element takes at least one byte, but do not trust the count for preallocation.
        let mut elements = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            elements.push(ctx.read_value().await?);
        }
        Ok(ValueList(elements))
    }
}
