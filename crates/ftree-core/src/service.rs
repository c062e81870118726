//! Primitive interface to the remote directory service.
//!
//! Implementations wrap a concrete protocol client (handshake, data channels
//! and listing parsers live there). Every primitive is a single serial
//! request on the control connection. `Err` means the transport failed;
//! `Ok(false)` means the server understood and refused.

use std::fmt;
use std::io::{self, Read, Write};

use crate::node::Node;
use crate::path::RemotePath;

pub const DEFAULT_PORT: u16 = 21;
pub const ANONYMOUS_USER_NAME: &str = "anonymous";
pub const ANONYMOUS_USER_PASSWORD: &str = "";

pub trait RemoteDirectoryService {
    /// Opens the control connection and checks the greeting.
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()>;
    fn login(&mut self, user: &str, password: &str) -> io::Result<bool>;
    fn set_passive_mode(&mut self, enabled: bool) -> io::Result<()>;
    /// Lightweight request used only to check the control connection still answers.
    fn probe_alive(&mut self) -> bool;
    fn current_directory(&mut self) -> io::Result<RemotePath>;
    /// Changes into one child directory, or to the root when given `/`.
    fn change_directory(&mut self, component: &str) -> io::Result<bool>;
    fn change_to_parent(&mut self) -> io::Result<bool>;
    /// Lists a single directory level. A missing directory may be reported as
    /// an empty listing or as `ErrorKind::NotFound`.
    fn list(&mut self, path: &RemotePath) -> io::Result<Vec<Node>>;
    fn make_directory(&mut self, path: &RemotePath) -> io::Result<bool>;
    fn remove_directory(&mut self, path: &RemotePath) -> io::Result<bool>;
    fn delete_file(&mut self, path: &RemotePath) -> io::Result<bool>;
    fn rename(&mut self, from: &RemotePath, to: &RemotePath) -> io::Result<bool>;
    fn store(&mut self, path: &RemotePath, source: &mut dyn Read) -> io::Result<bool>;
    fn retrieve(&mut self, path: &RemotePath, sink: &mut dyn Write) -> io::Result<bool>;
    fn logout(&mut self) -> io::Result<()>;
    fn disconnect(&mut self) -> io::Result<()>;
}

/// Where and as whom to connect.
#[derive(Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl ConnectParams {
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn anonymous(host: impl Into<String>) -> Self {
        Self::new(host, ANONYMOUS_USER_NAME, ANONYMOUS_USER_PASSWORD)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.user == ANONYMOUS_USER_NAME
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
