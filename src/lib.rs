//! Turn a time-ordered web request log into closed per-client sessions.
//!
//! A session is a run of requests from one client whose gaps never exceed
//! the inactivity period. Sessions are written as they close, one line
//! each: `key,first,last,duration,page_count`.

pub mod cli;
pub mod clock;
pub mod config;
pub mod emit;
pub mod error;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod scan;
pub mod session;

pub use error::{Result, SessionizeError};
pub use pipeline::{run, run_files, sessionize, RunStats, Sessionizer};
