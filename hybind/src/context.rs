//! Byte sink and byte source handed to bindings while encoding and decoding.
//!
//! Both contexts wrap a `tokio` async stream, so every primitive is a suspension point. They also
//! carry the root [`TaggedCodec`], which lets a binding write nested tagged values (list
//! elements, fields of a composite, ...) without knowing which bindings exist.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    encoding::integer::{VarintDecoder, encode_u64, zigzag_decode, zigzag_encode},
    magic::MAX_VARINT_LEN,
    shape::DynShape,
    tagged::TaggedCodec,
    utils::error::{CodecError, CodecResult},
};

/// Write side of a codec call.
pub struct WriteContext<'a> {
    sink: &'a mut (dyn AsyncWrite + Unpin + Send),
    codec: &'a TaggedCodec,
    depth: usize,
}

impl<'a> WriteContext<'a> {
    pub fn new(codec: &'a TaggedCodec, sink: &'a mut (dyn AsyncWrite + Unpin + Send)) -> Self {
        Self {
            sink,
            codec,
            depth: 0,
        }
    }

    /// The codec nested values are dispatched through.
    pub fn codec(&self) -> &'a TaggedCodec {
        self.codec
    }

    /// Current nesting depth; `0` outside of any tagged value.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub async fn write_u8(&mut self, byte: u8) -> CodecResult<()> {
        self.sink.write_u8(byte).await?;
        Ok(())
    }

    pub async fn write_i8(&mut self, byte: i8) -> CodecResult<()> {
        self.sink.write_i8(byte).await?;
        Ok(())
    }

    pub async fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.sink.write_all(bytes).await?;
        Ok(())
    }

    /// Write `value` as an LEB128 varint.
    pub async fn write_varint(&mut self, value: u64) -> CodecResult<()> {
        let mut scratch = [0u8; MAX_VARINT_LEN];
        let mut len = 0;
        encode_u64(value, &mut |b: &[u8]| {
            scratch[len..len + b.len()].copy_from_slice(b);
            len += b.len();
        });
        self.write_bytes(&scratch[..len]).await
    }

    /// Write a signed integer as a zig-zag varint.
    pub async fn write_zigzag(&mut self, value: i64) -> CodecResult<()> {
        self.write_varint(zigzag_encode(value)).await
    }

    /// Write a length-prefixed UTF-8 string.
    pub async fn write_str(&mut self, value: &str) -> CodecResult<()> {
        self.write_varint(value.len() as u64).await?;
        self.write_bytes(value.as_bytes()).await
    }

    /// Write a nested tagged value through the root codec.
    pub async fn write_value(&mut self, value: Option<&dyn DynShape>) -> CodecResult<()> {
        let codec = self.codec;
        codec.encode(self, value).await
    }

    pub async fn flush(&mut self) -> CodecResult<()> {
        self.sink.flush().await?;
        Ok(())
    }

    pub(crate) fn descend(&mut self) -> CodecResult<()> {
        descend(&mut self.depth, self.codec.settings().max_depth)
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Read side of a codec call.
pub struct ReadContext<'a> {
    source: &'a mut (dyn AsyncRead + Unpin + Send),
    codec: &'a TaggedCodec,
    depth: usize,
}

impl<'a> ReadContext<'a> {
    pub fn new(codec: &'a TaggedCodec, source: &'a mut (dyn AsyncRead + Unpin + Send)) -> Self {
        Self {
            source,
            codec,
            depth: 0,
        }
    }

    pub fn codec(&self) -> &'a TaggedCodec {
        self.codec
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub async fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.source.read_u8().await?)
    }

    pub async fn read_i8(&mut self) -> CodecResult<i8> {
        Ok(self.source.read_i8().await?)
    }

    /// Fill `buf` completely; a short stream fails with an `UnexpectedEof` I/O error.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> CodecResult<()> {
        self.source.read_exact(buf).await?;
        Ok(())
    }

    /// Read exactly `len` bytes, refusing lengths above the configured payload limit.
    pub async fn read_bytes(&mut self, len: usize) -> CodecResult<Vec<u8>> {
        self.check_len(len as u64)?;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf).await?;
        Ok(buf)
    }

    pub async fn read_varint(&mut self) -> CodecResult<u64> {
        let mut decoder = VarintDecoder::new();
        loop {
            let byte = self.read_u8().await?;
            if let Some(value) = decoder.push(byte)? {
                return Ok(value);
            }
        }
    }

    pub async fn read_zigzag(&mut self) -> CodecResult<i64> {
        Ok(zigzag_decode(self.read_varint().await?))
    }

    /// Read a varint length or element count, bounded by the configured payload limit.
    pub async fn read_len(&mut self) -> CodecResult<usize> {
        let len = self.read_varint().await?;
        self.check_len(len)?;
        Ok(len as usize)
    }

    pub async fn read_str(&mut self) -> CodecResult<String> {
        let len = self.read_len().await?;
        let bytes = self.read_bytes(len).await?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Read a nested tagged value through the root codec.
    pub async fn read_value(&mut self) -> CodecResult<Option<Box<dyn DynShape>>> {
        let codec = self.codec;
        codec.decode(self).await
    }

    fn check_len(&self, len: u64) -> CodecResult<()> {
        let max = self.codec.settings().max_payload_len;
        if len > max as u64 {
            return Err(CodecError::PayloadTooLarge { len, max });
        }
        Ok(())
    }

    pub(crate) fn descend(&mut self) -> CodecResult<()> {
        descend(&mut self.depth, self.codec.settings().max_depth)
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

fn descend(depth: &mut usize, max: usize) -> CodecResult<()> {
    if *depth >= max {
        return Err(CodecError::DepthExceeded { max });
    }
    *depth += 1;
    Ok(())
}
