//! Input/output helpers.
//!
//! - observation file ingest + validation (`ingest`)
//! - control-file rendering (`control`)
//! - run layout and station workspaces (`workspace`)
//! - tenv3 conversion (`tenv3`)

pub mod control;
pub mod ingest;
pub mod tenv3;
pub mod workspace;

pub use control::*;
pub use ingest::*;
pub use workspace::*;
