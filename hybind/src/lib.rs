//! Hybind: a tag-dispatched binary codec for graphs of heterogeneous values.
//!
//! Values are serialized without the stream format depending on Rust's type system: each value
//! is written as a one-byte tag naming a registered binding, followed by that binding's payload.
//! New value shapes are supported by registering a binding, never by adding an encoding method
//! to the value type.
//!
//! The pieces, leaf first:
//! - [`shape`]: runtime type identities ([`Shape`], [`DynShape`], [`RuntimeType`]) and the
//!   declared subtype lineage used for matching;
//! - [`codec`]: what a binding is made of, erased ([`Encoding`], [`Decoding`]) or typed
//!   ([`TypedCodec`]);
//! - [`binding`]: the [`BindingsBuilder`] assigning tags in registration order and the frozen
//!   [`Bindings`] list;
//! - [`tagged`]: the [`TaggedCodec`] facade with its per-type resolution cache;
//! - [`context`]: the async byte sink/source handed to bindings.
//!
//! [`codecs`] and [`serializer`] provide ready-made leaf bindings; [`config`] holds the limits
//! applied while reading and writing.

pub mod binding;
pub mod codec;
pub mod codecs;
pub mod config;
pub mod context;
pub mod encoding;
pub mod magic;
pub mod serializer;
pub mod shape;
pub mod tagged;
pub mod utils;

pub extern crate async_trait;

pub use binding::{Binding, Bindings, BindingsBuilder};
pub use codec::{Codec, Decoding, Encoding, EncodingProducer, ProducingCodec, Typed, TypedCodec};
pub use config::CodecSettings;
pub use context::{ReadContext, WriteContext};
pub use shape::{DynShape, RuntimeType, Shape, TypeKey};
pub use tagged::TaggedCodec;
pub use utils::error::{CodecError, CodecResult};
