//! Native-protocol client for columnar OLAP servers.
//!
//! Speaks the server's binary TCP protocol (default port 9000): handshake,
//! SQL execution, block-oriented result streaming, and bulk columnar
//! inserts, with optional per-packet LZ4/ZSTD compression.
//!
//! ```no_run
//! use opal_client::{connect, Block, Options};
//!
//! # async fn demo() -> opal_client::Result<()> {
//! let session = connect(Options::new("localhost")).await?;
//! session
//!     .execute("CREATE TABLE t (id UInt64, name String) ENGINE=Memory")
//!     .await?;
//! let block = Block::new()
//!     .column("id", vec![1u64, 2, 3])?
//!     .column("name", vec!["Alice", "Bob", "Charlie"])?;
//! session.insert_block("t", block).await?;
//! let result = session.query("SELECT id, name FROM t ORDER BY id").await?;
//! assert_eq!(result.row_count(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! A [`Session`] owns exactly one socket; concurrent callers are serialized
//! FIFO. The API is block-oriented: callers receive and provide whole
//! [`Block`]s, never row streams.

mod binary;
mod block;
mod column;
mod compress;
mod connection;
mod convert;
mod errors;
mod options;
mod proto;
mod session;
mod types;
mod value;

pub use block::{Block, BlockColumn, BlockInfo, Row};
pub use column::ColumnData;
pub use compress::Compression;
pub use errors::{
    CompressionError, ConnectionError, Error, ProtocolError, Result, ServerException,
    ValidationError,
};
pub use options::Options;
pub use proto::{Progress, ProfileInfo, ServerInfo, CLIENT_REVISION, DEFAULT_CLIENT_NAME};
pub use session::{connect, QueryResult, Session};
pub use types::Type;
pub use value::Value;
