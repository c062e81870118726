pub mod config;
pub mod errors;
pub mod local;
pub mod naming;
pub mod node;
pub mod path;
pub mod render;
pub mod report;
pub mod service;
pub mod session;
pub mod staging;
pub mod transfer_engine;
pub mod walker;

pub use errors::{ErrorCategory, InvalidReason, TreeError, TreeResult};
pub use local::{LocalFilesystem, StdFilesystem};
pub use node::{Node, NodeKind};
pub use path::RemotePath;
pub use report::{Failure, LocalReport, RemoteReport, TransferReport};
pub use service::{ConnectParams, RemoteDirectoryService};
pub use session::{Session, SessionState};
pub use transfer_engine::{ListingOptions, TransferEngine, TreeCounts, TreeListing};
