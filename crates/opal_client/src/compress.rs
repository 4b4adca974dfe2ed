//! Per-packet compression envelopes.
//!
//! When compression is negotiated, every Data block travels inside one or
//! more envelopes:
//!
//! ```text
//! checksum(16) || method(1) || compressed_size(u32 LE) ||
//! uncompressed_size(u32 LE) || payload
//! ```
//!
//! `compressed_size` counts from the method byte inclusive; the checksum is
//! CityHash128 (v1.0.2, the server's function) over that same span.

use crate::binary::{Encoder, WireReader};
use crate::errors::{CompressionError, Result};

/// Compression negotiated for Data packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// No envelopes at all; block bytes travel verbatim.
    #[default]
    None,
    Lz4,
    Zstd,
}

impl Compression {
    /// Whether Data packet bodies are wrapped in envelopes.
    pub(crate) fn is_enabled(self) -> bool {
        !matches!(self, Compression::None)
    }
}

/// Method byte for a verbatim payload.
const METHOD_NONE: u8 = 0x02;
/// Method byte for LZ4 raw-block payloads.
const METHOD_LZ4: u8 = 0x82;
/// Method byte for ZSTD payloads.
const METHOD_ZSTD: u8 = 0x90;

/// method + compressed_size + uncompressed_size.
const ENVELOPE_HEADER_SIZE: usize = 9;
/// Upper bound accepted for either declared size.
const MAX_ENVELOPE_SIZE: usize = 1 << 30;
/// Uncompressed bytes per envelope on the write path.
const MAX_CHUNK_SIZE: usize = 1 << 20;

const ZSTD_LEVEL: i32 = 3;

/// Read one envelope off the socket, verify it, and append the inflated
/// payload to `out`.
pub(crate) async fn read_envelope(reader: &mut WireReader, out: &mut Vec<u8>) -> Result<()> {
    let mut checksum = [0u8; 16];
    reader.read_exact(&mut checksum).await?;
    let declared_checksum = u128::from_le_bytes(checksum);

    let mut header = [0u8; ENVELOPE_HEADER_SIZE];
    reader.read_exact(&mut header).await?;
    let method = header[0];
    let compressed_size = u32::from_le_bytes(header[1..5].try_into().unwrap()) as usize;
    let uncompressed_size = u32::from_le_bytes(header[5..9].try_into().unwrap()) as usize;

    if compressed_size < ENVELOPE_HEADER_SIZE
        || compressed_size > MAX_ENVELOPE_SIZE
        || uncompressed_size > MAX_ENVELOPE_SIZE
    {
        return Err(
            CompressionError::OversizedEnvelope(compressed_size.max(uncompressed_size)).into(),
        );
    }

    // The checksum covers the header and payload contiguously.
    let mut frame = vec![0u8; compressed_size];
    frame[..ENVELOPE_HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut frame[ENVELOPE_HEADER_SIZE..]).await?;
    if cityhash_rs::cityhash_102_128(&frame) != declared_checksum {
        return Err(CompressionError::ChecksumMismatch.into());
    }

    let payload = &frame[ENVELOPE_HEADER_SIZE..];
    let inflated = match method {
        METHOD_NONE => {
            if payload.len() != uncompressed_size {
                return Err(CompressionError::SizeMismatch {
                    got: payload.len(),
                    declared: uncompressed_size,
                }
                .into());
            }
            out.extend_from_slice(payload);
            return Ok(());
        }
        METHOD_LZ4 => lz4_flex::block::decompress(payload, uncompressed_size).map_err(|e| {
            CompressionError::Codec { method: "lz4", reason: e.to_string() }
        })?,
        METHOD_ZSTD => zstd::bulk::decompress(payload, uncompressed_size).map_err(|e| {
            CompressionError::Codec { method: "zstd", reason: e.to_string() }
        })?,
        other => return Err(CompressionError::UnknownMethod(other).into()),
    };

    if inflated.len() != uncompressed_size {
        return Err(CompressionError::SizeMismatch {
            got: inflated.len(),
            declared: uncompressed_size,
        }
        .into());
    }
    out.extend_from_slice(&inflated);
    Ok(())
}

/// Wrap `body` into checksummed envelopes appended to `enc`, splitting
/// bodies larger than the chunk bound across several envelopes.
pub(crate) fn write_envelopes(method: Compression, body: &[u8], enc: &mut Encoder) -> Result<()> {
    if body.is_empty() {
        return write_one_envelope(method, body, enc);
    }
    for chunk in body.chunks(MAX_CHUNK_SIZE) {
        write_one_envelope(method, chunk, enc)?;
    }
    Ok(())
}

fn write_one_envelope(method: Compression, chunk: &[u8], enc: &mut Encoder) -> Result<()> {
    let (method_byte, payload) = match method {
        Compression::None => (METHOD_NONE, chunk.to_vec()),
        Compression::Lz4 => (METHOD_LZ4, lz4_flex::block::compress(chunk)),
        Compression::Zstd => (
            METHOD_ZSTD,
            zstd::bulk::compress(chunk, ZSTD_LEVEL).map_err(|e| CompressionError::Codec {
                method: "zstd",
                reason: e.to_string(),
            })?,
        ),
    };

    let mut frame = Vec::with_capacity(ENVELOPE_HEADER_SIZE + payload.len());
    frame.push(method_byte);
    frame.extend_from_slice(&((ENVELOPE_HEADER_SIZE + payload.len()) as u32).to_le_bytes());
    frame.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);

    let checksum = cityhash_rs::cityhash_102_128(&frame);
    enc.raw(&checksum.to_le_bytes());
    enc.raw(&frame);
    Ok(())
}
