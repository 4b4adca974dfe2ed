//! Packet constants, revision gates, and the client/server message codecs.
//!
//! Every optional wire field is conditioned on
//! `min(client revision, server revision) >= threshold`; the thresholds are
//! named here so no version branch hides elsewhere.

pub(crate) mod client;
pub(crate) mod server;

pub use server::{Progress, ProfileInfo, ServerInfo};

/// Revision this client implements; the effective revision is the minimum
/// of this and the server's.
pub const CLIENT_REVISION: u64 = 54448;

/// Default client display name sent at handshake.
pub const DEFAULT_CLIENT_NAME: &str = "opal-client";

/// Client-to-server packet codes.
pub(crate) mod client_codes {
    pub const HELLO: u64 = 0;
    pub const QUERY: u64 = 1;
    pub const DATA: u64 = 2;
    pub const CANCEL: u64 = 3;
    pub const PING: u64 = 4;
}

/// Server-to-client packet codes.
pub(crate) mod server_codes {
    pub const HELLO: u64 = 0;
    pub const DATA: u64 = 1;
    pub const EXCEPTION: u64 = 2;
    pub const PROGRESS: u64 = 3;
    pub const PONG: u64 = 4;
    pub const END_OF_STREAM: u64 = 5;
    pub const PROFILE_INFO: u64 = 6;
    pub const TOTALS: u64 = 7;
    pub const EXTREMES: u64 = 8;
    pub const TABLES_STATUS_RESPONSE: u64 = 9;
    pub const LOG: u64 = 10;
    pub const TABLE_COLUMNS: u64 = 11;
    pub const PART_UUIDS: u64 = 12;
    pub const READ_TASK_REQUEST: u64 = 13;
    pub const PROFILE_EVENTS: u64 = 14;
}

/// The query-processing stage the client always requests.
pub(crate) const STAGE_COMPLETE: u64 = 2;

/// Revision thresholds for optional fields.
pub(crate) mod revisions {
    pub const WITH_TOTAL_ROWS_IN_PROGRESS: u64 = 51554;
    pub const WITH_CLIENT_INFO: u64 = 54032;
    pub const WITH_SERVER_TIMEZONE: u64 = 54058;
    pub const WITH_QUOTA_KEY: u64 = 54060;
    pub const WITH_SERVER_DISPLAY_NAME: u64 = 54372;
    pub const WITH_VERSION_PATCH: u64 = 54401;
    pub const WITH_CLIENT_WRITE_INFO: u64 = 54420;
    /// Both settings encodings end with an empty name, and this client sends
    /// no settings, so no code branches on it.
    #[allow(dead_code)]
    pub const WITH_SETTINGS_AS_STRINGS: u64 = 54429;
    pub const WITH_INTERSERVER_SECRET: u64 = 54441;
    pub const WITH_OPENTELEMETRY: u64 = 54442;
    pub const WITH_DISTRIBUTED_DEPTH: u64 = 54448;
    /// Beyond [`super::CLIENT_REVISION`]; never negotiated today.
    pub const WITH_ELAPSED_NS_IN_PROGRESS: u64 = 54460;
}
