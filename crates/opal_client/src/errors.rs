//! Error taxonomy for the client.
//!
//! Every failure surfaces as one of the abstract kinds in [`Error`]; callers
//! inspect the kind (and [`Error::is_fatal`]) to decide whether the session
//! can still be used or must be reconnected.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error kind.
#[derive(Debug, Error)]
pub enum Error {
    /// TCP/TLS establishment failed: resolution, refusal, or connect timeout.
    #[error("connection: {0}")]
    Connection(#[from] ConnectionError),

    /// Socket I/O failed after connect (including send/recv timeouts).
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The peer violated the wire contract.
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),

    /// A compression envelope failed verification or (de)compression.
    #[error("compression: {0}")]
    Compression(#[from] CompressionError),

    /// Client-side precondition failed before any bytes were sent.
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    /// Structured exception reported by the server.
    #[error("server exception: {0}")]
    Server(ServerException),

    /// The peer negotiated a feature this client does not implement.
    #[error("unimplemented: {0}")]
    Unimplemented(String),
}

impl Error {
    /// Whether the owning session must be discarded after this error.
    ///
    /// `Validation` never touches the socket and `Server` exceptions arriving
    /// at a stable protocol point leave the connection reusable; everything
    /// else means the connection state is unknown.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Validation(_) | Error::Server(_))
    }

    /// Server error code, when this is a server exception.
    pub fn server_code(&self) -> Option<i32> {
        match self {
            Error::Server(e) => Some(e.code),
            _ => None,
        }
    }
}

/// Failures while establishing the transport.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("session is closed; reset() is required before further use")]
    Closed,
    #[error("connect to {addr} timed out after {millis}ms")]
    Timeout { addr: String, millis: u64 },
    #[error("tls handshake with {addr} failed: {reason}")]
    Tls { addr: String, reason: String },
    #[error("connect to {addr} failed: {source}")]
    Dial {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Wire-contract violations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("varint did not terminate within 10 bytes")]
    VarintOverflow,
    #[error("unexpected packet {got} while waiting for {expected}")]
    UnexpectedPacket { got: u64, expected: &'static str },
    #[error("unknown server packet {0}")]
    UnknownPacket(u64),
    #[error("low cardinality header has unsupported flags {flags:#x}")]
    BadLowCardinalityFlags { flags: u64 },
    #[error("low cardinality index {index} outside dictionary of {dict_size}")]
    BadLowCardinalityIndex { index: u64, dict_size: u64 },
    #[error("low cardinality index stream has {got} entries, column has {rows} rows")]
    IndexCountMismatch { got: u64, rows: usize },
    #[error("array offsets decrease at row {row}")]
    NonMonotonicOffsets { row: usize },
    #[error("unknown block info field {0}")]
    UnknownBlockInfoField(u64),
    #[error("block header declares unreasonable dimension {0}")]
    OversizedBlock(u64),
    #[error("string of {0} bytes exceeds the sanity limit")]
    OversizedString(u64),
    #[error("malformed utf-8 in {field}")]
    BadUtf8 { field: &'static str },
}

/// Compression envelope failures.
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("unknown compression method byte {0:#x}")]
    UnknownMethod(u8),
    #[error("envelope checksum mismatch")]
    ChecksumMismatch,
    #[error("decompressed {got} bytes, envelope declared {declared}")]
    SizeMismatch { got: usize, declared: usize },
    #[error("envelope declares unreasonable size {0}")]
    OversizedEnvelope(usize),
    #[error("{method} codec failed: {reason}")]
    Codec { method: &'static str, reason: String },
}

/// Client-side precondition failures.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("empty endpoint")]
    EmptyEndpoint,
    #[error("unknown column type `{0}`")]
    UnknownType(String),
    #[error("bad arguments for type `{type_name}`: {reason}")]
    BadTypeArgs { type_name: String, reason: String },
    #[error("column `{name}` has {len} rows, block has {rows}")]
    ColumnLengthMismatch { name: String, len: usize, rows: usize },
    #[error("decimal scale {got} cannot be losslessly rescaled to {want}")]
    ScaleMismatch { got: u8, want: u8 },
    #[error("value out of range for {type_name}: {value}")]
    ValueOutOfRange { type_name: String, value: String },
    #[error("`{label}` is not a declared enum label")]
    UnknownEnumLabel { label: String },
    #[error("enum value {0} has no declared label")]
    UnknownEnumValue(i64),
    #[error("column `{0}` not present in the insert target")]
    UnknownColumn(String),
    #[error("insert requires at least one named column")]
    EmptyInsert,
    #[error("column `{name}`: expected type `{expected}`, block carries `{got}`")]
    TypeMismatch { name: String, expected: String, got: String },
    #[error("value {value} does not fit column type `{type_name}`")]
    ValueTypeMismatch { type_name: String, value: String },
    #[error("type nesting exceeds depth limit {0}")]
    DepthLimit(usize),
}

/// Structured exception received from the server, with its nested chain.
#[derive(Debug, Clone)]
pub struct ServerException {
    pub code: i32,
    pub name: String,
    pub message: String,
    pub stack_trace: String,
    /// Nested causes, outermost first.
    pub nested: Vec<ServerException>,
}

impl std::fmt::Display for ServerException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.code, self.message)?;
        for cause in &self.nested {
            write!(f, "; caused by {} ({}): {}", cause.name, cause.code, cause.message)?;
        }
        Ok(())
    }
}

impl From<ServerException> for Error {
    fn from(e: ServerException) -> Self {
        Error::Server(e)
    }
}
