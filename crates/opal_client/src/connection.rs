//! One physical connection: socket ownership, handshake, and the packet
//! state machine for queries, inserts, ping, and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::TcpStream;

use crate::binary::{DecompressStream, Encoder, PacketInput, WireReader, WireWriter};
use crate::binary::stream::BoxedStream;
use crate::block::Block;
use crate::compress::{self, Compression};
use crate::errors::{
    ConnectionError, Error, ProtocolError, Result, ValidationError,
};
use crate::options::Options;
use crate::proto::{client, server, server_codes};
use crate::proto::{Progress, ProfileInfo, ServerInfo};

/// A decoded server packet, ready for dispatch.
pub(crate) enum ServerPacket {
    Data(Block),
    Totals(Block),
    Extremes(Block),
    Progress(Progress),
    ProfileInfo(ProfileInfo),
    /// Consumed and surfaced for diagnostics only.
    ProfileEvents(Block),
    /// Already routed to the process logger.
    Log,
    TableColumns,
    Pong,
    EndOfStream,
}

impl ServerPacket {
    /// Wire code of the decoded packet, for diagnostics.
    fn code(&self) -> u64 {
        match self {
            ServerPacket::Data(_) => server_codes::DATA,
            ServerPacket::Totals(_) => server_codes::TOTALS,
            ServerPacket::Extremes(_) => server_codes::EXTREMES,
            ServerPacket::Progress(_) => server_codes::PROGRESS,
            ServerPacket::ProfileInfo(_) => server_codes::PROFILE_INFO,
            ServerPacket::ProfileEvents(_) => server_codes::PROFILE_EVENTS,
            ServerPacket::Log => server_codes::LOG,
            ServerPacket::TableColumns => server_codes::TABLE_COLUMNS,
            ServerPacket::Pong => server_codes::PONG,
            ServerPacket::EndOfStream => server_codes::END_OF_STREAM,
        }
    }
}

/// Everything a completed statement produced.
#[derive(Debug, Default)]
pub(crate) struct QueryOutcome {
    pub blocks: Vec<Block>,
    pub totals: Option<Block>,
    pub extremes: Option<Block>,
    pub progress: Progress,
    pub profile: ProfileInfo,
}

/// An authenticated connection; exactly one exchange runs at a time.
pub(crate) struct Connection {
    reader: WireReader,
    writer: WireWriter,
    server: ServerInfo,
    /// `min(client, server)` revision gating optional fields.
    revision: u64,
    compression: Compression,
    /// Pooled decompression scratch, reused across Data packets.
    scratch: Vec<u8>,
    /// Set when a mid-stream failure leaves the wire state unknown.
    broken: bool,
}

impl Connection {
    /// Dial, optionally wrap in TLS, and run the handshake.
    pub async fn connect(options: &Options) -> Result<Connection> {
        if options.host.is_empty() {
            return Err(ValidationError::EmptyEndpoint.into());
        }
        let addr = options.endpoint();
        let dial = TcpStream::connect(&addr);
        let tcp = if options.connect_timeout.is_zero() {
            dial.await
        } else {
            match tokio::time::timeout(options.connect_timeout, dial).await {
                Ok(res) => res,
                Err(_) => {
                    return Err(ConnectionError::Timeout {
                        addr,
                        millis: options.connect_timeout.as_millis() as u64,
                    }
                    .into())
                }
            }
        }
        .map_err(|source| ConnectionError::Dial { addr: addr.clone(), source })?;
        let _ = tcp.set_nodelay(true);

        let stream: BoxedStream = if options.tls {
            let connector = native_tls::TlsConnector::new().map_err(|e| {
                ConnectionError::Tls { addr: addr.clone(), reason: e.to_string() }
            })?;
            let connector = tokio_native_tls::TlsConnector::from(connector);
            let handshake = connector.connect(&options.host, tcp);
            let tls = if options.connect_timeout.is_zero() {
                handshake.await
            } else {
                match tokio::time::timeout(options.connect_timeout, handshake).await {
                    Ok(res) => res,
                    Err(_) => {
                        return Err(ConnectionError::Timeout {
                            addr,
                            millis: options.connect_timeout.as_millis() as u64,
                        }
                        .into())
                    }
                }
            }
            .map_err(|e| ConnectionError::Tls { addr: addr.clone(), reason: e.to_string() })?;
            Box::new(tls)
        } else {
            Box::new(tcp)
        };

        let (read_half, write_half) = tokio::io::split(stream);
        let mut conn = Connection {
            reader: WireReader::new(read_half, options.recv_timeout),
            writer: WireWriter::new(write_half, options.send_timeout),
            server: ServerInfo {
                name: String::new(),
                version_major: 0,
                version_minor: 0,
                version_patch: 0,
                revision: 0,
                timezone: None,
                display_name: None,
            },
            revision: 0,
            compression: options.compression,
            scratch: Vec::new(),
            broken: false,
        };
        conn.handshake(options).await?;
        Ok(conn)
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    async fn handshake(&mut self, options: &Options) -> Result<()> {
        let mut enc = Encoder::new();
        client::write_hello(&mut enc, options);
        self.writer.send(enc.bytes()).await?;

        let mut input = PacketInput::Plain(&mut self.reader);
        match input.read_uvarint().await? {
            server_codes::HELLO => {
                self.server = server::read_hello(&mut input).await?;
                self.revision = self.server.effective_revision();
                tracing::debug!(
                    server = %self.server.name,
                    revision = self.server.revision,
                    timezone = self.server.timezone.as_deref().unwrap_or(""),
                    "handshake complete"
                );
                Ok(())
            }
            server_codes::EXCEPTION => {
                Err(Error::Server(server::read_exception(&mut input).await?))
            }
            other => {
                Err(ProtocolError::UnexpectedPacket { got: other, expected: "Hello" }.into())
            }
        }
    }

    /// Run one statement to EndOfStream, optionally keeping data blocks.
    pub async fn run_query(
        &mut self,
        sql: &str,
        query_id: &str,
        collect: bool,
        options: &Options,
        cancel: &AtomicBool,
    ) -> Result<QueryOutcome> {
        let result = self.run_query_inner(sql, query_id, collect, options, cancel).await;
        self.note_fatal(result)
    }

    async fn run_query_inner(
        &mut self,
        sql: &str,
        query_id: &str,
        collect: bool,
        options: &Options,
        cancel: &AtomicBool,
    ) -> Result<QueryOutcome> {
        let mut enc = Encoder::new();
        client::write_query(
            &mut enc,
            query_id,
            sql,
            self.revision,
            self.compression.is_enabled(),
            options,
        );
        // The empty block closes the (absent) external-data stream.
        self.encode_data_packet(&mut enc, &Block::new())?;
        self.writer.send(enc.bytes()).await?;
        self.response_loop(collect, cancel).await
    }

    /// Drive the response stream of a SELECT/DDL exchange.
    async fn response_loop(&mut self, collect: bool, cancel: &AtomicBool) -> Result<QueryOutcome> {
        let mut outcome = QueryOutcome::default();
        let mut saw_data = false;
        let mut cancel_sent = false;
        loop {
            if cancel.swap(false, Ordering::SeqCst) && !cancel_sent {
                let mut enc = Encoder::new();
                client::write_cancel(&mut enc);
                self.writer.send(enc.bytes()).await?;
                cancel_sent = true;
                tracing::debug!("cancel requested; draining response stream");
            }
            let packet = match self.read_packet().await {
                Ok(packet) => packet,
                Err(err) => {
                    // A server exception mid-data-stream leaves the wire in
                    // an unknown position; the connection must be discarded.
                    if saw_data && matches!(err, Error::Server(_)) {
                        self.broken = true;
                    }
                    return Err(err);
                }
            };
            match packet {
                ServerPacket::Data(block) => {
                    saw_data = true;
                    if collect && block.row_count() > 0 {
                        outcome.blocks.push(block);
                    }
                }
                ServerPacket::Totals(block) => {
                    saw_data = true;
                    outcome.totals = Some(block);
                }
                ServerPacket::Extremes(block) => {
                    saw_data = true;
                    outcome.extremes = Some(block);
                }
                ServerPacket::Progress(progress) => outcome.progress.accumulate(progress),
                ServerPacket::ProfileInfo(profile) => outcome.profile = profile,
                ServerPacket::ProfileEvents(_)
                | ServerPacket::Log
                | ServerPacket::TableColumns => {}
                ServerPacket::Pong => {
                    return Err(ProtocolError::UnexpectedPacket {
                        got: server_codes::PONG,
                        expected: "query response",
                    }
                    .into())
                }
                ServerPacket::EndOfStream => return Ok(outcome),
            }
        }
    }

    /// Run the INSERT flow: template handshake, data blocks, terminator.
    pub async fn insert(
        &mut self,
        table: &str,
        blocks: Vec<Block>,
        options: &Options,
    ) -> Result<QueryOutcome> {
        let result = self.insert_inner(table, blocks, options).await;
        self.note_fatal(result)
    }

    async fn insert_inner(
        &mut self,
        table: &str,
        blocks: Vec<Block>,
        options: &Options,
    ) -> Result<QueryOutcome> {
        let Some(first) = blocks.first() else {
            return Ok(QueryOutcome::default());
        };
        if first.is_empty() {
            return Err(ValidationError::EmptyInsert.into());
        }
        let column_list = first
            .columns()
            .iter()
            .map(|c| format!("`{}`", c.name()))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!("INSERT INTO {table} ({column_list}) VALUES");

        let mut enc = Encoder::new();
        client::write_query(
            &mut enc,
            "",
            &sql,
            self.revision,
            self.compression.is_enabled(),
            options,
        );
        self.encode_data_packet(&mut enc, &Block::new())?;
        self.writer.send(enc.bytes()).await?;

        // The first data packet is the zero-row schema template.
        let mut outcome = QueryOutcome::default();
        let template = loop {
            match self.read_packet().await? {
                ServerPacket::Data(block) if block.column_count() > 0 && block.row_count() == 0 => {
                    break block;
                }
                ServerPacket::Data(_) => {}
                ServerPacket::Progress(progress) => outcome.progress.accumulate(progress),
                ServerPacket::ProfileInfo(profile) => outcome.profile = profile,
                ServerPacket::ProfileEvents(_)
                | ServerPacket::Log
                | ServerPacket::TableColumns => {}
                ServerPacket::EndOfStream | ServerPacket::Pong | ServerPacket::Totals(_)
                | ServerPacket::Extremes(_) => {
                    return Err(ProtocolError::UnexpectedPacket {
                        got: server_codes::END_OF_STREAM,
                        expected: "insert schema template",
                    }
                    .into())
                }
            }
        };

        // Validate everything before the first data byte; on failure close
        // the insert cleanly so the session stays usable.
        if let Err(err) = validate_against_template(&blocks, &template) {
            self.send_data(&Block::new()).await?;
            self.drain_insert_tail(&mut outcome).await?;
            return Err(err);
        }

        for block in &blocks {
            self.send_data(block).await?;
        }
        self.send_data(&Block::new()).await?;
        self.drain_insert_tail(&mut outcome).await?;
        Ok(outcome)
    }

    /// Consume trailing packets of an INSERT until EndOfStream.
    async fn drain_insert_tail(&mut self, outcome: &mut QueryOutcome) -> Result<()> {
        loop {
            let packet = match self.read_packet().await {
                Ok(packet) => packet,
                Err(err) => {
                    // Data blocks are already on the wire; an exception here
                    // ends the session, not just the statement.
                    if matches!(err, Error::Server(_)) {
                        self.broken = true;
                    }
                    return Err(err);
                }
            };
            match packet {
                ServerPacket::EndOfStream => return Ok(()),
                ServerPacket::Progress(progress) => outcome.progress.accumulate(progress),
                ServerPacket::ProfileInfo(profile) => outcome.profile = profile,
                ServerPacket::Data(_)
                | ServerPacket::ProfileEvents(_)
                | ServerPacket::Log
                | ServerPacket::TableColumns => {}
                ServerPacket::Pong | ServerPacket::Totals(_) | ServerPacket::Extremes(_) => {
                    return Err(ProtocolError::UnexpectedPacket {
                        got: server_codes::PONG,
                        expected: "insert acknowledgement",
                    }
                    .into())
                }
            }
        }
    }

    pub async fn ping(&mut self) -> Result<()> {
        let result = self.ping_inner().await;
        self.note_fatal(result)
    }

    async fn ping_inner(&mut self) -> Result<()> {
        let mut enc = Encoder::new();
        client::write_ping(&mut enc);
        self.writer.send(enc.bytes()).await?;
        match self.read_packet().await? {
            ServerPacket::Pong => Ok(()),
            other => Err(ProtocolError::UnexpectedPacket {
                got: other.code(),
                expected: "Pong",
            }
            .into()),
        }
    }

    /// Read and pre-decode one server packet.
    async fn read_packet(&mut self) -> Result<ServerPacket> {
        let code = PacketInput::Plain(&mut self.reader).read_uvarint().await?;
        match code {
            server_codes::DATA => Ok(ServerPacket::Data(
                self.read_block(self.compression.is_enabled()).await?,
            )),
            server_codes::TOTALS => Ok(ServerPacket::Totals(
                self.read_block(self.compression.is_enabled()).await?,
            )),
            server_codes::EXTREMES => Ok(ServerPacket::Extremes(
                self.read_block(self.compression.is_enabled()).await?,
            )),
            server_codes::EXCEPTION => {
                let mut input = PacketInput::Plain(&mut self.reader);
                Err(Error::Server(server::read_exception(&mut input).await?))
            }
            server_codes::PROGRESS => {
                let mut input = PacketInput::Plain(&mut self.reader);
                Ok(ServerPacket::Progress(
                    Progress::read(&mut input, self.revision).await?,
                ))
            }
            server_codes::PONG => Ok(ServerPacket::Pong),
            server_codes::END_OF_STREAM => Ok(ServerPacket::EndOfStream),
            server_codes::PROFILE_INFO => {
                let mut input = PacketInput::Plain(&mut self.reader);
                Ok(ServerPacket::ProfileInfo(ProfileInfo::read(&mut input).await?))
            }
            // Log and profile-events blocks are never inside envelopes.
            server_codes::LOG => {
                let block = self.read_block(false).await?;
                server::route_log_block(&block);
                Ok(ServerPacket::Log)
            }
            server_codes::PROFILE_EVENTS => {
                Ok(ServerPacket::ProfileEvents(self.read_block(false).await?))
            }
            server_codes::TABLE_COLUMNS => {
                let mut input = PacketInput::Plain(&mut self.reader);
                let _table = input.read_string().await?;
                let _description = input.read_string().await?;
                Ok(ServerPacket::TableColumns)
            }
            // Responses to requests this client never sends; their bodies are
            // not self-describing enough to skip safely.
            server_codes::TABLES_STATUS_RESPONSE
            | server_codes::PART_UUIDS
            | server_codes::READ_TASK_REQUEST => {
                Err(Error::Unimplemented(format!("server packet {code}")))
            }
            other => Err(ProtocolError::UnknownPacket(other).into()),
        }
    }

    /// Read the block of a Data-format packet. The temporary-table name
    /// travels outside the compression envelope.
    async fn read_block(&mut self, compressed: bool) -> Result<Block> {
        {
            let mut input = PacketInput::Plain(&mut self.reader);
            let _temp_table = input.read_string().await?;
        }
        if compressed {
            let mut input = PacketInput::Compressed(DecompressStream::new(
                &mut self.reader,
                &mut self.scratch,
            ));
            Block::read(&mut input).await
        } else {
            let mut input = PacketInput::Plain(&mut self.reader);
            Block::read(&mut input).await
        }
    }

    async fn send_data(&mut self, block: &Block) -> Result<()> {
        let mut enc = Encoder::new();
        self.encode_data_packet(&mut enc, block)?;
        self.writer.send(enc.bytes()).await
    }

    fn encode_data_packet(&self, enc: &mut Encoder, block: &Block) -> Result<()> {
        enc.uvarint(crate::proto::client_codes::DATA);
        enc.string("");
        let mut body = Encoder::new();
        block.write(&mut body)?;
        let body = body.take();
        if self.compression.is_enabled() {
            compress::write_envelopes(self.compression, &body, enc)?;
        } else {
            enc.raw(&body);
        }
        Ok(())
    }

    /// Mark the connection unusable on errors that leave the wire state
    /// unknown: any fatal kind, or a server exception after data started.
    fn note_fatal<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_fatal() {
                self.broken = true;
            }
        }
        result
    }
}

/// Check caller blocks against the server's schema template: names must be
/// a subset, canonical type text must match exactly.
fn validate_against_template(blocks: &[Block], template: &Block) -> Result<()> {
    for block in blocks {
        for column in block.columns() {
            let Some(expected) = template.column_by_name(column.name()) else {
                return Err(ValidationError::UnknownColumn(column.name().to_string()).into());
            };
            if expected.column_type().to_string() != column.column_type().to_string() {
                return Err(ValidationError::TypeMismatch {
                    name: column.name().to_string(),
                    expected: expected.column_type().to_string(),
                    got: column.column_type().to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}
