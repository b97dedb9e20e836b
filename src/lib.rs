//! TPOps Console - operator console for transaction-processing middleware
//!
//! This library provides the building blocks of the console: the typed REST
//! gateway, the session holder, the debounced search engine, the telemetry
//! table engine, the role policy, and the background refresh poller. The
//! terminal surface in [`ui`] renders what these modules decide.

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod perf;
pub mod policy;
pub mod poller;
pub mod search;
pub mod session;
pub mod ui;
