use std::sync::Arc;

use hybind::{
    BindingsBuilder, CodecError, CodecResult, CodecSettings, Decoding, DynShape, Encoding,
    ProducingCodec, ReadContext, RuntimeType, TaggedCodec, TypedCodec, WriteContext,
    async_trait::async_trait,
    codecs::{I32Codec, StringCodec, builtin_bindings},
    encoding::{
        DynBuf,
        integer::{decode_u64, encode_u64, zigzag_decode, zigzag_encode},
    },
    impl_shape,
    serializer::Serializer,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: i16,
    y: i16,
}

impl_shape!(Point);

struct PointSerializer;

impl PointSerializer {
    fn read_coord(bytes: &mut &[u8]) -> CodecResult<i16> {
        let raw = decode_u64(bytes)?
            .ok_or_else(|| CodecError::Payload("point coordinate is truncated".into()))?;
        let wide = zigzag_decode(raw);
        i16::try_from(wide).map_err(|_| CodecError::Payload(format!("{wide} does not fit in an i16")))
    }
}

impl Serializer for PointSerializer {
    type Value = Point;

    fn write(&self, value: &Point, buf: &mut DynBuf) -> CodecResult<()> {
        for coord in [value.x, value.y] {
            encode_u64(zigzag_encode(coord.into()), &mut |b| buf.extend_from_slice(b));
        }
        Ok(())
    }

    fn read(&self, bytes: &mut &[u8]) -> CodecResult<Point> {
        Ok(Point {
            x: Self::read_coord(bytes)?,
            y: Self::read_coord(bytes)?,
        })
    }
}

#[tokio::test]
async fn serializer_binding_is_length_framed() {
    let codec = TaggedCodec::build(|b| {
        b.bind_typed(StringCodec)?
            .bind_serializer(PointSerializer)?;
        Ok(())
    })
    .unwrap();

    let point = Point { x: 1, y: -300 };
    let bytes = codec.encode_to_vec(Some(&point)).await.unwrap();
    assert_eq!(bytes, [0x01, 0x03, 0x02, 0xD7, 0x04]);

    let decoded = codec.decode_from_slice(&bytes).await.unwrap().unwrap();
    assert_eq!(decoded.downcast_ref::<Point>(), Some(&point));

    // A frame longer than what the serializer consumes is rejected.
    let err = codec
        .decode_from_slice(&[0x01, 0x03, 0x02, 0x04, 0x09])
        .await
        .unwrap_err();
    assert!(err.is_payload());

    // So is a frame ending in the middle of a coordinate.
    let err = codec
        .decode_from_slice(&[0x01, 0x02, 0x02, 0x80])
        .await
        .unwrap_err();
    assert!(err.is_payload());
}

/// Writes every narrow unsigned integer as a u32 varint and reads them back as `u32`.
struct NarrowUnsigned;

#[async_trait]
impl Encoding for NarrowUnsigned {
    async fn encode(&self, ctx: &mut WriteContext<'_>, value: &dyn DynShape) -> CodecResult<()> {
        let widened = if let Some(v) = value.downcast_ref::<u16>() {
            u64::from(*v)
        } else if let Some(v) = value.downcast_ref::<u32>() {
            u64::from(*v)
        } else {
            return Err(CodecError::TypeMismatch {
                expected: "u16 or u32",
                found: value.runtime_type().name(),
            });
        };
        ctx.write_varint(widened).await
    }
}

#[async_trait]
impl Decoding for NarrowUnsigned {
    async fn decode(&self, ctx: &mut ReadContext<'_>) -> CodecResult<Box<dyn DynShape>> {
        let value = ctx.read_varint().await?;
        let value = u32::try_from(value)
            .map_err(|_| CodecError::Payload(format!("{value} does not fit in a u32")))?;
        Ok(Box::new(value))
    }
}

impl ProducingCodec for NarrowUnsigned {
    fn encoding_for_type(&self, ty: &RuntimeType) -> Option<Arc<dyn Encoding>> {
        (ty.is::<u16>() || ty.is::<u32>()).then(|| Arc::new(NarrowUnsigned) as Arc<dyn Encoding>)
    }
}

#[tokio::test]
async fn producing_codec_covers_a_family_of_types() {
    let codec = TaggedCodec::build(|b| {
        b.bind_typed(I32Codec)?.bind_producer(NarrowUnsigned)?;
        Ok(())
    })
    .unwrap();

    let bytes = codec.encode_to_vec(Some(&300_u16)).await.unwrap();
    assert_eq!(bytes, [0x01, 0xAC, 0x02]);
    let decoded = codec.decode_from_slice(&bytes).await.unwrap().unwrap();
    assert_eq!(decoded.downcast_ref::<u32>(), Some(&300));

    let bytes = codec.encode_to_vec(Some(&u32::MAX)).await.unwrap();
    assert_eq!(bytes[0], 0x01);
    let decoded = codec.decode_from_slice(&bytes).await.unwrap().unwrap();
    assert_eq!(decoded.downcast_ref::<u32>(), Some(&u32::MAX));

    assert_eq!(codec.cached_types(), 2);
    assert!(
        codec
            .encode_to_vec(Some(&7_u64))
            .await
            .unwrap_err()
            .is_unsupported_type()
    );
}

#[derive(Debug)]
struct Vehicle;
#[derive(Debug)]
struct Car;
#[derive(Debug)]
struct RaceCar;

impl_shape!(Vehicle);
impl_shape!(Car => [Vehicle]);
impl_shape!(RaceCar => [Car, Vehicle]);

macro_rules! unit_codec {
    ($codec:ident, $ty:ident) => {
        struct $codec;

        #[async_trait]
        impl TypedCodec for $codec {
            type Value = $ty;

            async fn encode(&self, _ctx: &mut WriteContext<'_>, _value: &$ty) -> CodecResult<()> {
                Ok(())
            }

            async fn decode(&self, _ctx: &mut ReadContext<'_>) -> CodecResult<$ty> {
                Ok($ty)
            }
        }
    };
}

unit_codec!(VehicleCodec, Vehicle);
unit_codec!(CarCodec, Car);
unit_codec!(RaceCarCodec, RaceCar);

#[test]
fn binding_covered_by_an_ancestor_is_a_duplicate() {
    let mut builder = BindingsBuilder::new();
    builder.bind_typed(VehicleCodec).unwrap();

    let err = builder.bind_typed(CarCodec).unwrap_err();
    match err {
        CodecError::DuplicateBinding {
            type_name,
            existing_tag,
        } => {
            assert!(type_name.ends_with("Car"));
            assert_eq!(existing_tag, 0);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(
        builder
            .bind_typed(RaceCarCodec)
            .unwrap_err()
            .is_duplicate_binding()
    );
    assert_eq!(builder.len(), 1);
}

#[tokio::test]
async fn descendants_registered_before_ancestors_keep_their_own_tags() {
    let codec = TaggedCodec::build(|b| {
        b.bind_typed(RaceCarCodec)?
            .bind_typed(CarCodec)?
            .bind_typed(VehicleCodec)?;
        Ok(())
    })
    .unwrap();

    assert_eq!(codec.tag_for(&RuntimeType::of::<RaceCar>()).unwrap(), 0);
    assert_eq!(codec.tag_for(&RuntimeType::of::<Car>()).unwrap(), 1);
    assert_eq!(codec.tag_for(&RuntimeType::of::<Vehicle>()).unwrap(), 2);

    let decoded = codec.decode_from_slice(&[0x01]).await.unwrap().unwrap();
    assert!(decoded.is::<Car>());
}

#[test]
fn builtin_bindings_refuse_a_second_registration() {
    let mut builder = BindingsBuilder::new();
    builtin_bindings(&mut builder).unwrap();
    assert_eq!(builder.len(), 9);

    assert!(builtin_bindings(&mut builder).unwrap_err().is_duplicate_binding());
    assert_eq!(builder.len(), 9);
}

#[test]
fn builder_errors_abort_the_codec_build() {
    let result = TaggedCodec::build(|b| {
        b.bind_typed(StringCodec)?.bind_typed(StringCodec)?;
        Ok(())
    });
    assert!(matches!(
        result,
        Err(CodecError::DuplicateBinding { existing_tag: 0, .. })
    ));
}

#[tokio::test]
async fn settings_loaded_from_toml_apply_to_the_codec() {
    let dir = std::env::temp_dir().join(format!("hybind-settings-{}", std::process::id()));
    let path = dir.join("codec.toml");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(&path, "max_payload_len = 3\n").unwrap();

    let settings = CodecSettings::load_from_toml(&path).unwrap();
    assert_eq!(settings.max_payload_len, 3);
    assert_eq!(settings.max_depth, CodecSettings::default().max_depth);

    let mut builder = BindingsBuilder::new();
    builder.bind_typed(StringCodec).unwrap();
    let codec = TaggedCodec::with_settings(builder.build(), settings);

    let bytes = codec
        .encode_to_vec(Some(&String::from("four")))
        .await
        .unwrap();
    assert!(
        codec
            .decode_from_slice(&bytes)
            .await
            .unwrap_err()
            .is_payload_too_large()
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn typed_binding_claims_subtypes_it_cannot_encode() {
    let codec = TaggedCodec::build(|b| {
        b.bind_typed(VehicleCodec)?;
        Ok(())
    })
    .unwrap();

    assert_eq!(codec.tag_for(&RuntimeType::of::<Car>()).unwrap(), 0);
    match codec.encode_to_vec(Some(&Car)).await.unwrap_err() {
        CodecError::TypeMismatch { expected, found } => {
            assert!(expected.ends_with("Vehicle"));
            assert!(found.ends_with("Car"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(codec.encode_to_vec(Some(&Vehicle)).await.is_ok());
}
