//! High-level commands for stack maintenance.
//!
//! These are the entry points the CLI calls: a full update run, a local
//! status report, and a listing of matching remote tags.

pub mod context;
pub mod status;
pub mod update;

pub use context::StackContext;
pub use status::{
    ProductStatus, RemoteCommand, RemoteReport, RemoteTag, StatusCommand, StatusReport,
    VersionStatus,
};
pub use update::{UpdateCommand, UpdateReport};
