#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::io::{self, Read, Write};
use std::path::Path;
use std::rc::Rc;

use ftree_core::path::resolve;
use ftree_core::staging::StagingArea;
use ftree_core::{
    ConnectParams, Node, RemoteDirectoryService, RemotePath, Session, StdFilesystem,
    TransferEngine,
};

pub const HOST: &str = "ftp.test";

#[derive(Debug, Clone)]
enum Entry {
    Dir,
    File(Vec<u8>),
}

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<RemotePath, Entry>,
    connected: bool,
    logged_in: bool,
    cwd: RemotePath,
    failing_probes: usize,
    refuse_connect: bool,
    refuse_login: bool,
    fail_passive_mode: bool,
    refused: HashSet<RemotePath>,
    connects: usize,
    mutations: usize,
    requests: usize,
}

/// In-memory server shared between a test and the engine under test.
#[derive(Debug, Clone, Default)]
pub struct MemoryService {
    state: Rc<RefCell<State>>,
}

pub fn p(path: &str) -> RemotePath {
    resolve(path, &RemotePath::root())
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.add_dir(path);
        self
    }

    pub fn with_file(self, path: &str, content: &[u8]) -> Self {
        self.add_file(path, content);
        self
    }

    /// Creates the directory and any missing parents.
    pub fn add_dir(&self, path: &str) {
        let mut state = self.state.borrow_mut();
        for prefix in p(path).ancestors_from_root() {
            state.entries.entry(prefix).or_insert(Entry::Dir);
        }
    }

    pub fn add_file(&self, path: &str, content: &[u8]) {
        let path = p(path);
        if !path.parent().is_root() {
            self.add_dir(path.parent().as_str());
        }
        self.state
            .borrow_mut()
            .entries
            .insert(path, Entry::File(content.to_vec()));
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.borrow().entries.get(&p(path)) {
            Some(Entry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        let path = p(path);
        path.is_root() || matches!(self.state.borrow().entries.get(&path), Some(Entry::Dir))
    }

    pub fn exists(&self, path: &str) -> bool {
        let path = p(path);
        path.is_root() || self.state.borrow().entries.contains_key(&path)
    }

    /// Every path below `root`, sorted.
    pub fn paths_under(&self, root: &str) -> Vec<String> {
        let root = p(root);
        self.state
            .borrow()
            .entries
            .keys()
            .filter(|path| **path != root && path.starts_with(&root))
            .map(|path| path.to_string())
            .collect()
    }

    /// The next `count` liveness probes fail and drop the connection.
    pub fn fail_next_probes(&self, count: usize) {
        self.state.borrow_mut().failing_probes = count;
    }

    pub fn set_refuse_connect(&self, refuse: bool) {
        self.state.borrow_mut().refuse_connect = refuse;
    }

    pub fn set_refuse_login(&self, refuse: bool) {
        self.state.borrow_mut().refuse_login = refuse;
    }

    /// Switching the data mode errors out after a successful login.
    pub fn set_fail_passive_mode(&self, fail: bool) {
        self.state.borrow_mut().fail_passive_mode = fail;
    }

    /// Every primitive touching `path` is refused from now on.
    pub fn refuse(&self, path: &str) {
        self.state.borrow_mut().refused.insert(p(path));
    }

    pub fn connects(&self) -> usize {
        self.state.borrow().connects
    }

    /// Mutating primitives issued so far, refused ones included.
    pub fn mutations(&self) -> usize {
        self.state.borrow().mutations
    }

    /// Every primitive issued so far.
    pub fn requests(&self) -> usize {
        self.state.borrow().requests
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    fn session_ready(&self) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.requests += 1;
        if state.connected && state.logged_in {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::NotConnected, "not connected"))
        }
    }

    fn mutation(&self, path: &RemotePath) -> io::Result<bool> {
        self.session_ready()?;
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        Ok(!state.refused.contains(path))
    }
}

impl State {
    fn is_dir(&self, path: &RemotePath) -> bool {
        path.is_root() || matches!(self.entries.get(path), Some(Entry::Dir))
    }

    fn children(&self, dir: &RemotePath) -> Vec<Node> {
        self.entries
            .iter()
            .filter(|(path, _)| !path.is_root() && path.parent() == *dir)
            .map(|(path, entry)| {
                let name = path.name().unwrap_or_default();
                match entry {
                    Entry::Dir => Node::directory(name),
                    Entry::File(content) => Node::file(name, content.len() as u64),
                }
            })
            .collect()
    }
}

impl RemoteDirectoryService for MemoryService {
    fn connect(&mut self, host: &str, _port: u16) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.connects += 1;
        if state.refuse_connect || host != HOST {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
        }
        state.connected = true;
        state.cwd = RemotePath::root();
        Ok(())
    }

    fn login(&mut self, _user: &str, _password: &str) -> io::Result<bool> {
        let mut state = self.state.borrow_mut();
        if state.refuse_login {
            return Ok(false);
        }
        state.logged_in = true;
        Ok(true)
    }

    fn set_passive_mode(&mut self, _enabled: bool) -> io::Result<()> {
        self.session_ready()?;
        if self.state.borrow().fail_passive_mode {
            return Err(io::Error::new(io::ErrorKind::Other, "mode switch rejected"));
        }
        Ok(())
    }

    fn probe_alive(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        state.requests += 1;
        if state.failing_probes > 0 {
            state.failing_probes -= 1;
            state.connected = false;
            state.logged_in = false;
            return false;
        }
        state.connected && state.logged_in
    }

    fn current_directory(&mut self) -> io::Result<RemotePath> {
        self.session_ready()?;
        Ok(self.state.borrow().cwd.clone())
    }

    fn change_directory(&mut self, component: &str) -> io::Result<bool> {
        self.session_ready()?;
        let mut state = self.state.borrow_mut();
        let target = if component == "/" {
            RemotePath::root()
        } else {
            state.cwd.join(component)
        };
        if state.refused.contains(&target) || !state.is_dir(&target) {
            return Ok(false);
        }
        state.cwd = target;
        Ok(true)
    }

    fn change_to_parent(&mut self) -> io::Result<bool> {
        self.session_ready()?;
        let mut state = self.state.borrow_mut();
        state.cwd = state.cwd.parent();
        Ok(true)
    }

    fn list(&mut self, path: &RemotePath) -> io::Result<Vec<Node>> {
        self.session_ready()?;
        let state = self.state.borrow();
        if state.refused.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "listing refused"));
        }
        if !state.is_dir(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }
        Ok(state.children(path))
    }

    fn make_directory(&mut self, path: &RemotePath) -> io::Result<bool> {
        if !self.mutation(path)? {
            return Ok(false);
        }
        let mut state = self.state.borrow_mut();
        if state.entries.contains_key(path) || !state.is_dir(&path.parent()) {
            return Ok(false);
        }
        state.entries.insert(path.clone(), Entry::Dir);
        Ok(true)
    }

    fn remove_directory(&mut self, path: &RemotePath) -> io::Result<bool> {
        if !self.mutation(path)? {
            return Ok(false);
        }
        let mut state = self.state.borrow_mut();
        if path.is_root() || !state.is_dir(path) || !state.children(path).is_empty() {
            return Ok(false);
        }
        state.entries.remove(path);
        Ok(true)
    }

    fn delete_file(&mut self, path: &RemotePath) -> io::Result<bool> {
        if !self.mutation(path)? {
            return Ok(false);
        }
        let mut state = self.state.borrow_mut();
        match state.entries.get(path) {
            Some(Entry::File(_)) => {
                state.entries.remove(path);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn rename(&mut self, from: &RemotePath, to: &RemotePath) -> io::Result<bool> {
        if !self.mutation(from)? {
            return Ok(false);
        }
        let mut state = self.state.borrow_mut();
        if !state.entries.contains_key(from) || state.is_dir(to) || !state.is_dir(&to.parent()) {
            return Ok(false);
        }
        let moved: Vec<RemotePath> = state
            .entries
            .keys()
            .filter(|path| path.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(entry) = state.entries.remove(&old) {
                let suffix = &old.as_str()[from.as_str().len()..];
                let new = p(&format!("{}{}", to, suffix));
                state.entries.insert(new, entry);
            }
        }
        Ok(true)
    }

    fn store(&mut self, path: &RemotePath, source: &mut dyn Read) -> io::Result<bool> {
        if !self.mutation(path)? {
            return Ok(false);
        }
        let mut content = Vec::new();
        source.read_to_end(&mut content)?;
        let mut state = self.state.borrow_mut();
        if state.is_dir(path) || !state.is_dir(&path.parent()) {
            return Ok(false);
        }
        state.entries.insert(path.clone(), Entry::File(content));
        Ok(true)
    }

    fn retrieve(&mut self, path: &RemotePath, sink: &mut dyn Write) -> io::Result<bool> {
        self.session_ready()?;
        let content = {
            let state = self.state.borrow();
            if state.refused.contains(path) {
                return Ok(false);
            }
            match state.entries.get(path) {
                Some(Entry::File(content)) => content.clone(),
                _ => return Ok(false),
            }
        };
        sink.write_all(&content)?;
        Ok(true)
    }

    fn logout(&mut self) -> io::Result<()> {
        self.state.borrow_mut().logged_in = false;
        Ok(())
    }

    fn disconnect(&mut self) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.connected = false;
        state.logged_in = false;
        Ok(())
    }
}

pub type TestEngine = TransferEngine<MemoryService, StdFilesystem>;

/// Engine connected to `service` as anonymous, staging under `staging_root`.
pub fn connected_engine(service: &MemoryService, staging_root: &Path) -> TestEngine {
    let mut engine = TransferEngine::from_parts(
        Session::new(service.clone()),
        StdFilesystem,
        StagingArea::new(staging_root),
    );
    engine
        .connect(ConnectParams::anonymous(HOST))
        .expect("memory service accepts anonymous login");
    engine
}

/// Keys of a remote report as strings, in recorded order.
pub fn keys<'a>(keys: impl Iterator<Item = &'a RemotePath>) -> Vec<String> {
    keys.map(RemotePath::to_string).collect()
}
