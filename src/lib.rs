//! `geonoise` library crate.
//!
//! The binary (`geonoise`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable with a scripted engine instead of real processes
//! - control-file rules, tokenizer and gap policy are testable in isolation
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod models;
pub mod plot;
pub mod report;
pub mod stages;
