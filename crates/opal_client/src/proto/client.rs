//! Client-to-server packet writers.

use super::{client_codes, revisions, CLIENT_REVISION, STAGE_COMPLETE};
use crate::binary::Encoder;
use crate::options::Options;

/// Initial-query kind in the client info header.
const QUERY_KIND_INITIAL: u8 = 1;
/// TCP interface marker in the client info header.
const INTERFACE_TCP: u8 = 1;

/// Handshake packet: identity, credentials, and the revision to negotiate.
pub(crate) fn write_hello(enc: &mut Encoder, options: &Options) {
    enc.uvarint(client_codes::HELLO);
    enc.string(&options.client_name);
    enc.uvarint(options.client_version.0);
    enc.uvarint(options.client_version.1);
    enc.uvarint(CLIENT_REVISION);
    enc.string(&options.database);
    enc.string(&options.user);
    enc.string(&options.password);
}

/// Query packet up to and including the SQL text. The caller appends the
/// terminating empty Data block.
pub(crate) fn write_query(
    enc: &mut Encoder,
    query_id: &str,
    sql: &str,
    revision: u64,
    compression_enabled: bool,
    options: &Options,
) {
    enc.uvarint(client_codes::QUERY);
    enc.string(query_id);

    if revision >= revisions::WITH_CLIENT_INFO {
        write_client_info(enc, revision, options);
    }

    // No settings beyond the handshake defaults; an empty name terminates
    // the settings list in both the binary and the string-serialized
    // (revision >= WITH_SETTINGS_AS_STRINGS) encodings.
    enc.string("");

    if revision >= revisions::WITH_INTERSERVER_SECRET {
        enc.string("");
    }

    enc.uvarint(STAGE_COMPLETE);
    enc.uvarint(u64::from(compression_enabled));
    enc.string(sql);
}

/// Revision-gated client info carried by every query.
fn write_client_info(enc: &mut Encoder, revision: u64, options: &Options) {
    enc.u8(QUERY_KIND_INITIAL);
    enc.string(&options.user); // initial user
    enc.string(""); // initial query id
    enc.string("0.0.0.0:0"); // initial address
    enc.u8(INTERFACE_TCP);
    enc.string(std::env::var("USER").unwrap_or_default()); // os user
    enc.string(std::env::var("HOSTNAME").unwrap_or_default());
    enc.string(&options.client_name);
    enc.uvarint(options.client_version.0);
    enc.uvarint(options.client_version.1);
    enc.uvarint(CLIENT_REVISION);
    if revision >= revisions::WITH_QUOTA_KEY {
        enc.string("");
    }
    if revision >= revisions::WITH_DISTRIBUTED_DEPTH {
        enc.uvarint(0);
    }
    if revision >= revisions::WITH_VERSION_PATCH {
        enc.uvarint(options.client_version.2);
    }
    if revision >= revisions::WITH_OPENTELEMETRY {
        // No trace context; a zero byte keeps the field present.
        enc.u8(0);
    }
}

pub(crate) fn write_ping(enc: &mut Encoder) {
    enc.uvarint(client_codes::PING);
}

pub(crate) fn write_cancel(enc: &mut Encoder) {
    enc.uvarint(client_codes::CANCEL);
}
