//! The single logical connection and its liveness state machine.
//!
//! `Disconnected --connect--> Connected --probe fails--> Stale --reconnect--> Connected`,
//! and `terminate` always lands in `Disconnected`. A session never connects
//! on its own from `Disconnected`; recovery only happens for a session that
//! was connected before.

use std::io;

use crate::errors::{TreeError, TreeResult};
use crate::node::Node;
use crate::path::{self, RemotePath, ROOT_PATH};
use crate::service::{ConnectParams, RemoteDirectoryService};
use crate::walker::Namespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    /// The last liveness probe failed; the next check reconnects.
    Stale,
}

pub struct Session<S: RemoteDirectoryService> {
    service: S,
    state: SessionState,
    params: Option<ConnectParams>,
    cwd: RemotePath,
    passive_mode: bool,
}

impl<S: RemoteDirectoryService> Session<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: SessionState::Disconnected,
            params: None,
            cwd: RemotePath::root(),
            passive_mode: true,
        }
    }

    /// Whether data transfers use passive mode (on by default).
    pub fn with_passive_mode(mut self, enabled: bool) -> Self {
        self.passive_mode = enabled;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn host(&self) -> Option<&str> {
        self.params.as_ref().map(|p| p.host.as_str())
    }

    pub fn user(&self) -> Option<&str> {
        self.params.as_ref().map(|p| p.user.as_str())
    }

    pub fn working_directory(&self) -> &RemotePath {
        &self.cwd
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Resolves a user-supplied path against the working directory.
    pub fn resolve(&self, requested: &str) -> RemotePath {
        path::resolve(requested, &self.cwd)
    }

    /// Opens the connection, logs in, enables passive mode and moves to the root.
    pub fn connect(&mut self, params: ConnectParams) -> TreeResult<()> {
        if self.state == SessionState::Connected {
            return Err(TreeError::AlreadyConnected {
                host: self.host().unwrap_or(&params.host).to_string(),
            });
        }
        if self.state == SessionState::Stale {
            self.drop_connection();
        }

        self.open(&params)?;
        self.params = Some(params);
        Ok(())
    }

    fn open(&mut self, params: &ConnectParams) -> TreeResult<()> {
        self.service
            .connect(&params.host, params.port)
            .map_err(|err| rejected(params, err.to_string()))?;

        // Past this point the transport is up; any failure must close it again.
        if let Err(err) = self.handshake(params) {
            self.drop_connection();
            return Err(err);
        }

        self.cwd = RemotePath::root();
        self.state = SessionState::Connected;
        log::info!(
            "connected to {}:{} as {}",
            params.host,
            params.port,
            params.user
        );
        Ok(())
    }

    fn handshake(&mut self, params: &ConnectParams) -> TreeResult<()> {
        match self.service.login(&params.user, &params.password) {
            Ok(true) => {}
            Ok(false) => {
                return Err(rejected(
                    params,
                    format!("login rejected for user {}", params.user),
                ))
            }
            Err(err) => return Err(rejected(params, err.to_string())),
        }

        self.service
            .set_passive_mode(self.passive_mode)
            .map_err(|err| rejected(params, format!("cannot set data mode: {}", err)))?;

        match self.service.change_directory(ROOT_PATH) {
            Ok(true) => Ok(()),
            Ok(false) => Err(rejected(params, "cannot move to root directory".to_string())),
            Err(err) => Err(rejected(params, err.to_string())),
        }
    }

    fn drop_connection(&mut self) {
        if let Err(err) = self.service.disconnect() {
            log::debug!("disconnect after failure: {}", err);
        }
    }

    /// Makes sure the connection answers, reconnecting once if it does not.
    ///
    /// A stale connection is replaced by a fresh one and the previous working
    /// directory is restored, without the caller seeing the failure. A session
    /// that was never connected, or was terminated, is reported as closed.
    pub fn ensure_connectivity(&mut self) -> TreeResult<()> {
        match self.state {
            SessionState::Disconnected => Err(TreeError::SessionClosed),
            SessionState::Connected => {
                if self.service.probe_alive() {
                    return Ok(());
                }
                log::info!("liveness probe failed, session marked stale");
                self.state = SessionState::Stale;
                self.recover()
            }
            SessionState::Stale => self.recover(),
        }
    }

    fn recover(&mut self) -> TreeResult<()> {
        let params = self.params.clone().ok_or(TreeError::SessionClosed)?;
        let last_directory = self.cwd.clone();

        self.drop_connection();
        self.open(&params)?;
        if !last_directory.is_root() {
            self.navigate(&last_directory)?;
        }
        log::info!(
            "session to {} recovered in {}",
            params.host,
            last_directory
        );
        Ok(())
    }

    /// Moves to the root, then descends one component at a time.
    fn navigate(&mut self, target: &RemotePath) -> TreeResult<()> {
        let moved = self
            .service
            .change_directory(ROOT_PATH)
            .map_err(|err| TreeError::io("moving to root directory", err))?;
        if !moved {
            return Err(TreeError::Navigation {
                requested: target.to_string(),
                component: ROOT_PATH.to_string(),
                reached: self.cwd.to_string(),
            });
        }
        self.cwd = RemotePath::root();

        for component in target.components() {
            let moved = self
                .service
                .change_directory(component)
                .map_err(|err| TreeError::io(format!("moving to directory {}", component), err))?;
            if !moved {
                return Err(TreeError::Navigation {
                    requested: target.to_string(),
                    component: component.to_string(),
                    reached: self.cwd.to_string(),
                });
            }
            self.cwd = self.cwd.join(component);
        }
        Ok(())
    }

    /// Changes the working directory to `requested`, resolved against the current one.
    ///
    /// On failure the working directory is the last directory actually reached.
    pub fn change_working_directory(&mut self, requested: &str) -> TreeResult<RemotePath> {
        self.ensure_connectivity()?;
        let target = self.resolve(requested);
        self.navigate(&target)?;

        match self.service.current_directory() {
            Ok(reported) => self.cwd = reported,
            Err(err) => log::debug!("cannot read working directory back: {}", err),
        }
        Ok(self.cwd.clone())
    }

    pub fn move_to_root(&mut self) -> TreeResult<()> {
        self.ensure_connectivity()?;
        self.navigate(&RemotePath::root())
    }

    pub fn move_to_parent(&mut self) -> TreeResult<RemotePath> {
        self.ensure_connectivity()?;
        let moved = self
            .service
            .change_to_parent()
            .map_err(|err| TreeError::io("moving to parent directory", err))?;
        if !moved {
            return Err(TreeError::Navigation {
                requested: self.cwd.parent().to_string(),
                component: path::PARENT_PATH_ABBREVIATION.to_string(),
                reached: self.cwd.to_string(),
            });
        }
        self.cwd = self.cwd.parent();
        Ok(self.cwd.clone())
    }

    /// Looks up a single node by listing its parent. Does not probe liveness.
    pub fn lookup(&mut self, path: &RemotePath) -> TreeResult<Option<Node>> {
        let name = match path.name() {
            Some(name) => name,
            None => return Ok(Some(Node::root())),
        };
        let parent = path.parent();
        match self.service.list(&parent) {
            Ok(nodes) => Ok(nodes.into_iter().find(|node| node.name == name)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(TreeError::io(format!("listing {}", parent), err)),
        }
    }

    pub fn path_exists(&mut self, path: &RemotePath) -> TreeResult<bool> {
        Ok(self.lookup(path)?.is_some())
    }

    /// Logs out and disconnects. Disconnect runs even if logout fails.
    pub fn terminate(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        if let Err(err) = self.service.logout() {
            log::warn!("logout failed: {}", err);
        }
        if let Err(err) = self.service.disconnect() {
            log::warn!("disconnect failed: {}", err);
        }
        self.state = SessionState::Disconnected;
        self.cwd = RemotePath::root();
        log::info!("session to {} terminated", self.host().unwrap_or("?"));
    }
}

fn rejected(params: &ConnectParams, reason: String) -> TreeError {
    TreeError::Connection {
        host: params.host.clone(),
        reason,
    }
}

impl<S: RemoteDirectoryService> Drop for Session<S> {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl<S: RemoteDirectoryService> Namespace for Session<S> {
    type Path = RemotePath;

    fn list_dir(&mut self, dir: &RemotePath) -> io::Result<Vec<Node>> {
        self.service.list(dir)
    }

    fn child_path(&self, parent: &RemotePath, name: &str) -> RemotePath {
        parent.join(name)
    }
}
