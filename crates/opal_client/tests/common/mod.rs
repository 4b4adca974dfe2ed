//! Shared helpers for integration tests: a scripted protocol server over a
//! real TCP socket, plus minimal wire encode/decode utilities.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{bail, Context};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Revision the mock server reports; matches the client's.
pub const MOCK_REVISION: u64 = 54448;

pub const CLIENT_HELLO: u64 = 0;
pub const CLIENT_QUERY: u64 = 1;
pub const CLIENT_DATA: u64 = 2;
pub const CLIENT_CANCEL: u64 = 3;
pub const CLIENT_PING: u64 = 4;

pub const SERVER_HELLO: u64 = 0;
pub const SERVER_DATA: u64 = 1;
pub const SERVER_EXCEPTION: u64 = 2;
pub const SERVER_PROGRESS: u64 = 3;
pub const SERVER_PONG: u64 = 4;
pub const SERVER_END_OF_STREAM: u64 = 5;
pub const SERVER_PROFILE_INFO: u64 = 6;

/// A one-connection scripted server.
pub struct MockServer {
    pub addr: SocketAddr,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl MockServer {
    /// Bind an ephemeral port and serve exactly one connection with the
    /// given handler.
    pub async fn spawn<F, Fut>(handler: F) -> MockServer
    where
        F: FnOnce(TcpStream) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.context("accept")?;
            stream.set_nodelay(true).ok();
            handler(stream).await
        });
        MockServer { addr, handle }
    }

    /// Wait for the handler to finish and propagate scripting failures.
    pub async fn finish(self) -> anyhow::Result<()> {
        self.handle.await.context("mock server task")?
    }
}

// ---- wire encoding helpers ------------------------------------------------

pub fn put_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn put_string(buf: &mut Vec<u8>, value: impl AsRef<[u8]>) {
    let value = value.as_ref();
    put_uvarint(buf, value.len() as u64);
    buf.extend_from_slice(value);
}

/// Block info + header for `columns` columns and `rows` rows.
pub fn put_block_header(buf: &mut Vec<u8>, columns: u64, rows: u64) {
    put_uvarint(buf, 1);
    buf.push(0);
    put_uvarint(buf, 2);
    buf.extend_from_slice(&(-1i32).to_le_bytes());
    put_uvarint(buf, 0);
    put_uvarint(buf, columns);
    put_uvarint(buf, rows);
}

/// The empty-block sentinel body.
pub fn empty_block_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    put_block_header(&mut buf, 0, 0);
    buf
}

/// A two-column `(id UInt64, name String)` block body.
pub fn id_name_block_bytes(ids: &[u64], names: &[&str]) -> Vec<u8> {
    assert_eq!(ids.len(), names.len());
    let mut buf = Vec::new();
    put_block_header(&mut buf, 2, ids.len() as u64);
    put_string(&mut buf, "id");
    put_string(&mut buf, "UInt64");
    for id in ids {
        buf.extend_from_slice(&id.to_le_bytes());
    }
    put_string(&mut buf, "name");
    put_string(&mut buf, "String");
    for name in names {
        put_string(&mut buf, name);
    }
    buf
}

/// Wrap a block body in one LZ4 compression envelope.
pub fn lz4_envelope(body: &[u8]) -> Vec<u8> {
    let payload = lz4_flex::block::compress(body);
    let mut frame = vec![0x82u8];
    frame.extend_from_slice(&((9 + payload.len()) as u32).to_le_bytes());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    let mut out = cityhash_rs::cityhash_102_128(&frame).to_le_bytes().to_vec();
    out.extend_from_slice(&frame);
    out
}

// ---- wire decoding helpers ------------------------------------------------

pub async fn read_uvarint(stream: &mut (impl AsyncRead + Unpin)) -> anyhow::Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for _ in 0..10 {
        let byte = stream.read_u8().await?;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
    bail!("varint too long");
}

pub async fn read_string(stream: &mut (impl AsyncRead + Unpin)) -> anyhow::Result<Vec<u8>> {
    let len = read_uvarint(stream).await? as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn read_utf8(stream: &mut (impl AsyncRead + Unpin)) -> anyhow::Result<String> {
    Ok(String::from_utf8(read_string(stream).await?)?)
}

/// Read one LZ4/NONE envelope and return the inflated body.
pub async fn read_envelope(stream: &mut (impl AsyncRead + Unpin)) -> anyhow::Result<Vec<u8>> {
    let mut checksum = [0u8; 16];
    stream.read_exact(&mut checksum).await?;
    let mut header = [0u8; 9];
    stream.read_exact(&mut header).await?;
    let compressed_size = u32::from_le_bytes(header[1..5].try_into().unwrap()) as usize;
    let uncompressed_size = u32::from_le_bytes(header[5..9].try_into().unwrap()) as usize;
    let mut frame = vec![0u8; compressed_size];
    frame[..9].copy_from_slice(&header);
    stream.read_exact(&mut frame[9..]).await?;
    if cityhash_rs::cityhash_102_128(&frame) != u128::from_le_bytes(checksum) {
        bail!("client envelope checksum mismatch");
    }
    let payload = &frame[9..];
    match header[0] {
        0x02 => Ok(payload.to_vec()),
        0x82 => Ok(lz4_flex::block::decompress(payload, uncompressed_size)?),
        0x90 => Ok(zstd::bulk::decompress(payload, uncompressed_size)?),
        other => bail!("unexpected envelope method {other:#x}"),
    }
}

// ---- protocol scripting ---------------------------------------------------

/// Consume the client Hello and answer with the mock identity.
pub async fn serve_handshake(stream: &mut TcpStream) -> anyhow::Result<()> {
    let packet = read_uvarint(stream).await?;
    if packet != CLIENT_HELLO {
        bail!("expected client hello, got packet {packet}");
    }
    let _client_name = read_string(stream).await?;
    let _major = read_uvarint(stream).await?;
    let _minor = read_uvarint(stream).await?;
    let revision = read_uvarint(stream).await?;
    if revision != MOCK_REVISION {
        bail!("client sent revision {revision}");
    }
    let _database = read_string(stream).await?;
    let _user = read_string(stream).await?;
    let _password = read_string(stream).await?;

    let mut reply = Vec::new();
    put_uvarint(&mut reply, SERVER_HELLO);
    put_string(&mut reply, "MockOLAP");
    put_uvarint(&mut reply, 23);
    put_uvarint(&mut reply, 3);
    put_uvarint(&mut reply, MOCK_REVISION);
    put_string(&mut reply, "UTC");
    put_string(&mut reply, "mock-node");
    put_uvarint(&mut reply, 1);
    stream.write_all(&reply).await?;
    Ok(())
}

/// Consume the client-info section of a Query packet (revision 54448 form).
async fn skip_client_info(stream: &mut TcpStream) -> anyhow::Result<()> {
    let _query_kind = stream.read_u8().await?;
    let _initial_user = read_string(stream).await?;
    let _initial_query_id = read_string(stream).await?;
    let _initial_address = read_string(stream).await?;
    let _interface = stream.read_u8().await?;
    let _os_user = read_string(stream).await?;
    let _hostname = read_string(stream).await?;
    let _client_name = read_string(stream).await?;
    let _major = read_uvarint(stream).await?;
    let _minor = read_uvarint(stream).await?;
    let _revision = read_uvarint(stream).await?;
    let _quota_key = read_string(stream).await?;
    let _distributed_depth = read_uvarint(stream).await?;
    let _patch = read_uvarint(stream).await?;
    let _otel = stream.read_u8().await?;
    Ok(())
}

/// Consume a full Query packet plus its terminating empty data block.
/// Returns the SQL text and whether the client negotiated compression.
pub async fn read_client_query(stream: &mut TcpStream) -> anyhow::Result<(String, bool)> {
    let packet = read_uvarint(stream).await?;
    if packet != CLIENT_QUERY {
        bail!("expected query packet, got {packet}");
    }
    let _query_id = read_string(stream).await?;
    skip_client_info(stream).await?;
    let settings_end = read_string(stream).await?;
    if !settings_end.is_empty() {
        bail!("expected empty settings list");
    }
    let _interserver_secret = read_string(stream).await?;
    let stage = read_uvarint(stream).await?;
    if stage != 2 {
        bail!("expected stage Complete, got {stage}");
    }
    let compression = read_uvarint(stream).await? != 0;
    let sql = read_utf8(stream).await?;

    // Trailing empty block.
    let block = read_client_data(stream, compression).await?;
    if !(block.columns.is_empty() && block.rows == 0) {
        bail!("query should end with the empty-block sentinel");
    }
    Ok((sql, compression))
}

/// A client data block parsed down to the column kinds the tests use.
#[derive(Debug, Default)]
pub struct ParsedBlock {
    pub rows: u64,
    /// `(name, type text, decoded cells)` per column.
    pub columns: Vec<(String, String, ParsedColumn)>,
}

#[derive(Debug)]
pub enum ParsedColumn {
    UInt64(Vec<u64>),
    String(Vec<Vec<u8>>),
}

/// Consume one client Data packet (optionally enveloped).
pub async fn read_client_data(
    stream: &mut TcpStream,
    compressed: bool,
) -> anyhow::Result<ParsedBlock> {
    let packet = read_uvarint(stream).await?;
    if packet != CLIENT_DATA {
        bail!("expected data packet, got {packet}");
    }
    let _temp_table = read_string(stream).await?;
    if compressed {
        // A large block spans several envelopes; keep inflating until the
        // block parses without running out of bytes.
        let mut body = read_envelope(stream).await?;
        loop {
            match parse_block(&mut body.as_slice()).await {
                Ok(block) => return Ok(block),
                Err(err) if is_eof(&err) => body.extend(read_envelope(stream).await?),
                Err(err) => return Err(err),
            }
        }
    } else {
        parse_block(stream).await
    }
}

fn is_eof(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::UnexpectedEof)
}

async fn parse_block(stream: &mut (impl AsyncRead + Unpin)) -> anyhow::Result<ParsedBlock> {
    loop {
        match read_uvarint(stream).await? {
            0 => break,
            1 => {
                let _overflows = stream.read_u8().await?;
            }
            2 => {
                let mut bucket = [0u8; 4];
                stream.read_exact(&mut bucket).await?;
            }
            other => bail!("unknown block info field {other}"),
        }
    }
    let n_columns = read_uvarint(stream).await?;
    let rows = read_uvarint(stream).await?;
    let mut columns = Vec::new();
    for _ in 0..n_columns {
        let name = read_utf8(stream).await?;
        let type_text = read_utf8(stream).await?;
        let column = match type_text.as_str() {
            "UInt64" => {
                let mut cells = Vec::with_capacity(rows as usize);
                for _ in 0..rows {
                    let mut raw = [0u8; 8];
                    stream.read_exact(&mut raw).await?;
                    cells.push(u64::from_le_bytes(raw));
                }
                ParsedColumn::UInt64(cells)
            }
            "String" => {
                let mut cells = Vec::with_capacity(rows as usize);
                for _ in 0..rows {
                    cells.push(read_string(stream).await?);
                }
                ParsedColumn::String(cells)
            }
            other => bail!("mock cannot parse column type {other}"),
        };
        columns.push((name, type_text, column));
    }
    Ok(ParsedBlock { rows, columns })
}

// ---- response senders -----------------------------------------------------

pub async fn send_data(
    stream: &mut (impl AsyncWrite + Unpin),
    body: &[u8],
    compressed: bool,
) -> anyhow::Result<()> {
    let mut out = Vec::new();
    put_uvarint(&mut out, SERVER_DATA);
    put_string(&mut out, "");
    if compressed {
        out.extend_from_slice(&lz4_envelope(body));
    } else {
        out.extend_from_slice(body);
    }
    stream.write_all(&out).await?;
    Ok(())
}

pub async fn send_end_of_stream(stream: &mut (impl AsyncWrite + Unpin)) -> anyhow::Result<()> {
    let mut out = Vec::new();
    put_uvarint(&mut out, SERVER_END_OF_STREAM);
    stream.write_all(&out).await?;
    Ok(())
}

pub async fn send_pong(stream: &mut (impl AsyncWrite + Unpin)) -> anyhow::Result<()> {
    let mut out = Vec::new();
    put_uvarint(&mut out, SERVER_PONG);
    stream.write_all(&out).await?;
    Ok(())
}

/// Progress in the revision-54448 layout.
pub async fn send_progress(
    stream: &mut (impl AsyncWrite + Unpin),
    rows: u64,
    bytes: u64,
    total_rows: u64,
) -> anyhow::Result<()> {
    let mut out = Vec::new();
    put_uvarint(&mut out, SERVER_PROGRESS);
    put_uvarint(&mut out, rows);
    put_uvarint(&mut out, bytes);
    put_uvarint(&mut out, total_rows);
    put_uvarint(&mut out, 0); // written rows
    put_uvarint(&mut out, 0); // written bytes
    stream.write_all(&out).await?;
    Ok(())
}

pub async fn send_profile_info(
    stream: &mut (impl AsyncWrite + Unpin),
    rows: u64,
    blocks: u64,
    bytes: u64,
) -> anyhow::Result<()> {
    let mut out = Vec::new();
    put_uvarint(&mut out, SERVER_PROFILE_INFO);
    put_uvarint(&mut out, rows);
    put_uvarint(&mut out, blocks);
    put_uvarint(&mut out, bytes);
    out.push(0);
    put_uvarint(&mut out, 0);
    out.push(0);
    stream.write_all(&out).await?;
    Ok(())
}

pub async fn send_exception(
    stream: &mut (impl AsyncWrite + Unpin),
    code: i32,
    message: &str,
) -> anyhow::Result<()> {
    let mut out = Vec::new();
    put_uvarint(&mut out, SERVER_EXCEPTION);
    out.extend_from_slice(&code.to_le_bytes());
    put_string(&mut out, "DB::Exception");
    put_string(&mut out, message);
    put_string(&mut out, "stack trace omitted");
    out.push(0);
    stream.write_all(&out).await?;
    Ok(())
}
