//! solvedd - accepted answers for forum topics.
//!
//! Lets a topic's author or staff mark one reply as the accepted answer,
//! and keeps topic lists, detail views and the author's notification
//! consistent with that choice.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod metrics;
pub mod solved;
pub mod telemetry;

pub use error::{SolvedError, SolvedResult};
pub use solved::{Actor, SolvedService};
