//! Server-to-client message decoding: handshake, progress, profile
//! counters, exceptions, and server log routing.

use super::{revisions, CLIENT_REVISION};
use crate::binary::PacketInput;
use crate::block::Block;
use crate::errors::{Result, ServerException};
use crate::value::Value;

/// Identity and capabilities reported by the server at handshake.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version_major: u64,
    pub version_minor: u64,
    pub version_patch: u64,
    pub revision: u64,
    /// Present when the negotiated revision carries it.
    pub timezone: Option<String>,
    pub display_name: Option<String>,
}

impl ServerInfo {
    /// Revision gating every later optional field.
    pub fn effective_revision(&self) -> u64 {
        self.revision.min(CLIENT_REVISION)
    }
}

/// Parse the server Hello body (the packet code is already consumed).
pub(crate) async fn read_hello(input: &mut PacketInput<'_>) -> Result<ServerInfo> {
    let name = input.read_utf8_string("server name").await?;
    let version_major = input.read_uvarint().await?;
    let version_minor = input.read_uvarint().await?;
    let revision = input.read_uvarint().await?;
    let effective = revision.min(CLIENT_REVISION);

    let timezone = if effective >= revisions::WITH_SERVER_TIMEZONE {
        Some(input.read_utf8_string("server timezone").await?)
    } else {
        None
    };
    let display_name = if effective >= revisions::WITH_SERVER_DISPLAY_NAME {
        Some(input.read_utf8_string("server display name").await?)
    } else {
        None
    };
    let version_patch = if effective >= revisions::WITH_VERSION_PATCH {
        input.read_uvarint().await?
    } else {
        0
    };

    Ok(ServerInfo {
        name,
        version_major,
        version_minor,
        version_patch,
        revision,
        timezone,
        display_name,
    })
}

/// Accumulated execution progress for the current statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub rows: u64,
    pub bytes: u64,
    pub total_rows: u64,
    pub written_rows: u64,
    pub written_bytes: u64,
    pub elapsed_ns: u64,
}

impl Progress {
    pub(crate) async fn read(input: &mut PacketInput<'_>, revision: u64) -> Result<Progress> {
        let mut progress = Progress {
            rows: input.read_uvarint().await?,
            bytes: input.read_uvarint().await?,
            ..Progress::default()
        };
        if revision >= revisions::WITH_TOTAL_ROWS_IN_PROGRESS {
            progress.total_rows = input.read_uvarint().await?;
        }
        if revision >= revisions::WITH_CLIENT_WRITE_INFO {
            progress.written_rows = input.read_uvarint().await?;
            progress.written_bytes = input.read_uvarint().await?;
        }
        if revision >= revisions::WITH_ELAPSED_NS_IN_PROGRESS {
            progress.elapsed_ns = input.read_uvarint().await?;
        }
        Ok(progress)
    }

    /// Fold an incremental report into the running totals.
    pub(crate) fn accumulate(&mut self, delta: Progress) {
        self.rows += delta.rows;
        self.bytes += delta.bytes;
        self.total_rows = self.total_rows.max(delta.total_rows);
        self.written_rows += delta.written_rows;
        self.written_bytes += delta.written_bytes;
        self.elapsed_ns += delta.elapsed_ns;
    }
}

/// Query execution statistics reported after the data stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileInfo {
    pub rows: u64,
    pub blocks: u64,
    pub bytes: u64,
    pub applied_limit: bool,
    pub rows_before_limit: u64,
    pub calculated_rows_before_limit: bool,
}

impl ProfileInfo {
    pub(crate) async fn read(input: &mut PacketInput<'_>) -> Result<ProfileInfo> {
        Ok(ProfileInfo {
            rows: input.read_uvarint().await?,
            blocks: input.read_uvarint().await?,
            bytes: input.read_uvarint().await?,
            applied_limit: input.read_u8().await? != 0,
            rows_before_limit: input.read_uvarint().await?,
            calculated_rows_before_limit: input.read_u8().await? != 0,
        })
    }
}

/// Decode a (possibly nested) server exception chain.
pub(crate) async fn read_exception(input: &mut PacketInput<'_>) -> Result<ServerException> {
    let mut chain = Vec::new();
    loop {
        let code = input.read_i32().await?;
        let name = input.read_utf8_string("exception name").await?;
        let message = input.read_utf8_string("exception message").await?;
        let stack_trace = input.read_utf8_string("exception stack trace").await?;
        let has_nested = input.read_u8().await? != 0;
        chain.push(ServerException { code, name, message, stack_trace, nested: Vec::new() });
        if !has_nested {
            break;
        }
    }
    let mut root = chain.remove(0);
    root.nested = chain;
    Ok(root)
}

/// Route one server Log block to the process logger.
///
/// Log rows carry `{time, host_name, query_id, thread_id, priority, source,
/// text}`; unknown layouts degrade to logging the whole row.
pub(crate) fn route_log_block(block: &Block) {
    for row in block.rows() {
        let text = string_field(&row, "text").unwrap_or_default();
        let source = string_field(&row, "source").unwrap_or_default();
        let query_id = string_field(&row, "query_id").unwrap_or_default();
        let priority = match row.get("priority") {
            Some(Value::Int8(p)) => p,
            _ => 6,
        };
        match priority {
            1..=3 => {
                tracing::error!(target: "opal_client::server", %source, %query_id, "{text}")
            }
            4 => tracing::warn!(target: "opal_client::server", %source, %query_id, "{text}"),
            7 => tracing::debug!(target: "opal_client::server", %source, %query_id, "{text}"),
            8 => tracing::trace!(target: "opal_client::server", %source, %query_id, "{text}"),
            _ => tracing::info!(target: "opal_client::server", %source, %query_id, "{text}"),
        }
    }
}

fn string_field(row: &crate::block::Row<'_>, name: &str) -> Option<String> {
    match row.get(name) {
        Some(Value::String(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{Encoder, MemoryInput};

    fn input(enc: Encoder) -> PacketInput<'static> {
        let mut enc = enc;
        PacketInput::Memory(MemoryInput::new(enc.take().to_vec()))
    }

    #[tokio::test]
    async fn hello_gates_fields_on_revision() {
        // A modern server: timezone, display name, and patch all present.
        let mut enc = Encoder::new();
        enc.string("ColumnStore");
        enc.uvarint(23);
        enc.uvarint(8);
        enc.uvarint(54460);
        enc.string("UTC");
        enc.string("node-1");
        enc.uvarint(2);
        let info = read_hello(&mut input(enc)).await.unwrap();
        assert_eq!(info.name, "ColumnStore");
        assert_eq!(info.timezone.as_deref(), Some("UTC"));
        assert_eq!(info.display_name.as_deref(), Some("node-1"));
        assert_eq!(info.version_patch, 2);
        // The server is ahead of us; gating clamps to the client revision.
        assert_eq!(info.effective_revision(), CLIENT_REVISION);

        // An old server stops after the revision.
        let mut enc = Encoder::new();
        enc.string("ColumnStore");
        enc.uvarint(19);
        enc.uvarint(1);
        enc.uvarint(54050);
        let info = read_hello(&mut input(enc)).await.unwrap();
        assert_eq!(info.timezone, None);
        assert_eq!(info.display_name, None);
        assert_eq!(info.version_patch, 0);
    }

    #[tokio::test]
    async fn progress_reads_write_info_when_gated() {
        let mut enc = Encoder::new();
        enc.uvarint(100);
        enc.uvarint(4096);
        enc.uvarint(1000);
        enc.uvarint(7);
        enc.uvarint(512);
        let progress = Progress::read(&mut input(enc), CLIENT_REVISION).await.unwrap();
        assert_eq!(
            progress,
            Progress {
                rows: 100,
                bytes: 4096,
                total_rows: 1000,
                written_rows: 7,
                written_bytes: 512,
                elapsed_ns: 0,
            }
        );

        let mut enc = Encoder::new();
        enc.uvarint(5);
        enc.uvarint(50);
        enc.uvarint(0);
        let progress = Progress::read(&mut input(enc), 54058).await.unwrap();
        assert_eq!(progress.written_rows, 0);
    }

    #[tokio::test]
    async fn exception_chain_decodes_nested() {
        let mut enc = Encoder::new();
        enc.i32(62);
        enc.string("DB::Exception");
        enc.string("Syntax error");
        enc.string("stack");
        enc.u8(1);
        enc.i32(100);
        enc.string("DB::Exception");
        enc.string("root cause");
        enc.string("");
        enc.u8(0);
        let exception = read_exception(&mut input(enc)).await.unwrap();
        assert_eq!(exception.code, 62);
        assert_eq!(exception.nested.len(), 1);
        assert_eq!(exception.nested[0].message, "root cause");
    }
}
