//! Task expansion and execution engine
//!
//! Task tokens become [`TaskRequest`]s, requests expand into a [`Plan`] of
//! primitive actions, and the [`Executor`] runs the plan step by step.

pub mod command;
pub mod context;
pub mod dispatch;
pub mod executor;
pub mod fsops;
pub mod graph;
pub mod help;
pub mod interpolate;
pub mod request;
pub mod server_proc;
pub mod step;
pub mod watch;

// Re-export main types
pub use command::*;
pub use context::*;
pub use dispatch::{dispatch_test, monitor_requests};
pub use executor::Executor;
pub use graph::{expand, ExpandOptions, TaskGraph};
pub use interpolate::*;
pub use request::*;
pub use server_proc::{ServerProfile, ServerScope};
pub use step::*;
