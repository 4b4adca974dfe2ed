//! Session configuration.

use std::time::Duration;

use crate::compress::Compression;
use crate::proto::DEFAULT_CLIENT_NAME;

/// Connection and session parameters.
///
/// Send/receive timeouts default to zero (wait forever), matching the
/// server defaults; production callers should set explicit values so a hung
/// peer cannot wedge the session.
#[derive(Debug, Clone)]
pub struct Options {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub compression: Compression,
    pub tls: bool,
    pub connect_timeout: Duration,
    /// Bound for each socket write; zero waits forever.
    pub send_timeout: Duration,
    /// Bound for each socket read; zero waits forever.
    pub recv_timeout: Duration,
    pub client_name: String,
    /// (major, minor, patch) reported at handshake and in client info.
    pub client_version: (u64, u64, u64),
}

impl Default for Options {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 9000,
            database: "default".into(),
            user: "default".into(),
            password: String::new(),
            compression: Compression::None,
            tls: false,
            connect_timeout: Duration::from_secs(5),
            send_timeout: Duration::ZERO,
            recv_timeout: Duration::ZERO,
            client_name: DEFAULT_CLIENT_NAME.into(),
            client_version: (1, 0, 0),
        }
    }
}

impl Options {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), ..Self::default() }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub(crate) fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
