//! Wire primitives: little-endian fixed-width codecs, LEB128 varints,
//! length-prefixed strings, and the byte-source plumbing packet bodies are
//! parsed from.

pub(crate) mod encoder;
pub(crate) mod stream;

pub(crate) use encoder::Encoder;
pub(crate) use stream::{DecompressStream, MemoryInput, PacketInput, WireReader, WireWriter};

/// Reject absurd length prefixes before allocating.
pub(crate) const MAX_STRING_SIZE: u64 = 1 << 30;
