//! Byte sources for packet parsing.
//!
//! A packet body is parsed either straight off the buffered socket, from a
//! stream that inflates compression envelopes on demand, or from an
//! in-memory buffer. [`PacketInput`] unifies the three so the block and
//! column decoders are written once.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, ReadHalf, WriteHalf,
};

use crate::binary::MAX_STRING_SIZE;
use crate::errors::{Error, ProtocolError, Result};

/// Transport object-safety bound: plain TCP or a TLS wrapper.
pub(crate) trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

pub(crate) type BoxedStream = Box<dyn AsyncStream>;

/// Buffered read half with the per-read receive deadline applied.
pub(crate) struct WireReader {
    io: BufReader<ReadHalf<BoxedStream>>,
    recv_timeout: Duration,
}

impl WireReader {
    pub fn new(half: ReadHalf<BoxedStream>, recv_timeout: Duration) -> Self {
        Self { io: BufReader::new(half), recv_timeout }
    }

    /// Fill `buf` completely. A zero `recv_timeout` waits forever.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let res = if self.recv_timeout.is_zero() {
            self.io.read_exact(buf).await
        } else {
            match tokio::time::timeout(self.recv_timeout, self.io.read_exact(buf)).await {
                Ok(res) => res,
                Err(_) => {
                    return Err(Error::Io(std::io::Error::new(
                        ErrorKind::TimedOut,
                        "receive timed out",
                    )))
                }
            }
        };
        match res {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(ProtocolError::UnexpectedEof.into())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Buffered write half with the per-write send deadline applied.
pub(crate) struct WireWriter {
    io: BufWriter<WriteHalf<BoxedStream>>,
    send_timeout: Duration,
}

impl WireWriter {
    pub fn new(half: WriteHalf<BoxedStream>, send_timeout: Duration) -> Self {
        Self { io: BufWriter::new(half), send_timeout }
    }

    /// Write all of `bytes` and flush. A zero `send_timeout` waits forever.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let res = if self.send_timeout.is_zero() {
            self.write_flush(bytes).await
        } else {
            match tokio::time::timeout(self.send_timeout, self.write_flush(bytes)).await {
                Ok(res) => res,
                Err(_) => {
                    return Err(Error::Io(std::io::Error::new(
                        ErrorKind::TimedOut,
                        "send timed out",
                    )))
                }
            }
        };
        res.map_err(Error::Io)
    }

    async fn write_flush(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.io.write_all(bytes).await?;
        self.io.flush().await
    }
}

/// Fully-buffered input; the codec unit tests decode from it.
pub(crate) struct MemoryInput {
    data: Vec<u8>,
    pos: usize,
}

#[allow(dead_code)] // exercised from #[cfg(test)] modules across the crate
impl MemoryInput {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed. Packet parsing must leave no residue.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.remaining() < buf.len() {
            return Err(ProtocolError::UnexpectedEof.into());
        }
        buf.copy_from_slice(&self.data[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }
}

/// Inflates compression envelopes one at a time as the parser pulls bytes.
///
/// A single Data packet body may carry several envelopes back to back; the
/// refill happens whenever the current envelope is exhausted mid-block.
pub(crate) struct DecompressStream<'a> {
    reader: &'a mut WireReader,
    buf: &'a mut Vec<u8>,
    pos: usize,
}

impl<'a> DecompressStream<'a> {
    /// `scratch` is the session-pooled decompression buffer; it is cleared
    /// on construction and on every refill.
    pub fn new(reader: &'a mut WireReader, scratch: &'a mut Vec<u8>) -> Self {
        scratch.clear();
        Self { reader, buf: scratch, pos: 0 }
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.pos == self.buf.len() {
                self.buf.clear();
                self.pos = 0;
                crate::compress::read_envelope(self.reader, self.buf).await?;
            }
            let take = (buf.len() - filled).min(self.buf.len() - self.pos);
            buf[filled..filled + take].copy_from_slice(&self.buf[self.pos..self.pos + take]);
            self.pos += take;
            filled += take;
        }
        Ok(())
    }
}

/// Unified byte source for packet-body parsing.
pub(crate) enum PacketInput<'a> {
    /// Straight off the socket (compression off, or non-block fields).
    Plain(&'a mut WireReader),
    /// Through the envelope inflater (compression on).
    Compressed(DecompressStream<'a>),
    /// From a fully-buffered body.
    #[allow(dead_code)] // constructed by the codec unit tests
    Memory(MemoryInput),
}

// The full fixed-width read set mirrors the write side; not every width is
// currently pulled by a column kind.
#[allow(dead_code)]
impl PacketInput<'_> {
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        match self {
            PacketInput::Plain(r) => r.read_exact(buf).await,
            PacketInput::Compressed(s) => s.read_exact(buf).await,
            PacketInput::Memory(m) => m.read_exact(buf),
        }
    }

    pub async fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b).await?;
        Ok(b[0])
    }

    pub async fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8().await? as i8)
    }

    pub async fn read_u16(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_exact(&mut b).await?;
        Ok(u16::from_le_bytes(b))
    }

    pub async fn read_i16(&mut self) -> Result<i16> {
        let mut b = [0u8; 2];
        self.read_exact(&mut b).await?;
        Ok(i16::from_le_bytes(b))
    }

    pub async fn read_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b).await?;
        Ok(u32::from_le_bytes(b))
    }

    pub async fn read_i32(&mut self) -> Result<i32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b).await?;
        Ok(i32::from_le_bytes(b))
    }

    pub async fn read_u64(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b).await?;
        Ok(u64::from_le_bytes(b))
    }

    pub async fn read_i64(&mut self) -> Result<i64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b).await?;
        Ok(i64::from_le_bytes(b))
    }

    /// Two LE u64 halves, low half first.
    pub async fn read_u128(&mut self) -> Result<u128> {
        let mut b = [0u8; 16];
        self.read_exact(&mut b).await?;
        Ok(u128::from_le_bytes(b))
    }

    pub async fn read_i128(&mut self) -> Result<i128> {
        let mut b = [0u8; 16];
        self.read_exact(&mut b).await?;
        Ok(i128::from_le_bytes(b))
    }

    pub async fn read_f32(&mut self) -> Result<f32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b).await?;
        Ok(f32::from_le_bytes(b))
    }

    pub async fn read_f64(&mut self) -> Result<f64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b).await?;
        Ok(f64::from_le_bytes(b))
    }

    /// Unsigned LEB128, must terminate within 10 bytes.
    pub async fn read_uvarint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        for _ in 0..10 {
            let byte = self.read_u8().await?;
            let payload = (byte & 0x7f) as u64;
            if shift >= 64 || (shift == 63 && payload > 1) {
                return Err(ProtocolError::VarintOverflow.into());
            }
            value |= payload << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
        Err(ProtocolError::VarintOverflow.into())
    }

    pub async fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_exact(&mut buf).await?;
        Ok(buf)
    }

    /// `varuint length || bytes`; bytes are opaque.
    pub async fn read_string(&mut self) -> Result<Vec<u8>> {
        let len = self.read_uvarint().await?;
        if len > MAX_STRING_SIZE {
            return Err(ProtocolError::OversizedString(len).into());
        }
        self.read_bytes(len as usize).await
    }

    /// String field the protocol requires to be valid UTF-8 (names, types).
    pub async fn read_utf8_string(&mut self, field: &'static str) -> Result<String> {
        let raw = self.read_string().await?;
        String::from_utf8(raw).map_err(|_| ProtocolError::BadUtf8 { field }.into())
    }
}
