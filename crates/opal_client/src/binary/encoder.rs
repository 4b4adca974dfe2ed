//! Sync wire writer. All packet bodies are staged in memory before they hit
//! the socket, so encoding never suspends.

use bytes::{BufMut, BytesMut};
use uuid::Uuid;

/// Append-only encoder over a growable buffer.
///
/// Multi-byte integers are little-endian; varints are unsigned LEB128;
/// strings are `varuint length || bytes`.
pub(crate) struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: BytesMut::new() }
    }

    /// Encoded bytes so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the encoded bytes, leaving the encoder empty for reuse.
    pub fn take(&mut self) -> BytesMut {
        self.buf.split()
    }

    pub fn uvarint(&mut self, mut value: u64) {
        loop {
            let mut byte = (value & 0x7f) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.buf.put_u8(byte);
            if value == 0 {
                break;
            }
        }
    }

    pub fn string(&mut self, value: impl AsRef<[u8]>) {
        let value = value.as_ref();
        self.uvarint(value.len() as u64);
        self.buf.put_slice(value);
    }

    /// Fixed-length string: truncated to `n` or zero-padded up to `n`.
    pub fn fixed_string(&mut self, value: &[u8], n: usize) {
        let take = value.len().min(n);
        self.buf.put_slice(&value[..take]);
        for _ in take..n {
            self.buf.put_u8(0);
        }
    }

    pub fn raw(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn i8(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.put_u16_le(v);
    }

    pub fn i16(&mut self, v: i16) {
        self.buf.put_i16_le(v);
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    pub fn i32(&mut self, v: i32) {
        self.buf.put_i32_le(v);
    }

    pub fn u64(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    pub fn i64(&mut self, v: i64) {
        self.buf.put_i64_le(v);
    }

    /// Two LE u64 halves, low half first.
    pub fn u128(&mut self, v: u128) {
        self.buf.put_u128_le(v);
    }

    pub fn i128(&mut self, v: i128) {
        self.buf.put_i128_le(v);
    }

    pub fn f32(&mut self, v: f32) {
        self.buf.put_f32_le(v);
    }

    pub fn f64(&mut self, v: f64) {
        self.buf.put_f64_le(v);
    }

    /// UUID wire form: two LE u64 halves, most-significant half first.
    /// Round-trips the canonical dashed text form.
    pub fn uuid(&mut self, v: &Uuid) {
        let (hi, lo) = v.as_u64_pair();
        self.buf.put_u64_le(hi);
        self.buf.put_u64_le(lo);
    }
}
