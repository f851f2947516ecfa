//! Run lifecycle
//!
//! Owns the submit, poll and terminal-decision sequence for a single run and
//! is the only place that interprets lifecycle states. The platform and the
//! clock are supplied by the caller through the traits in [`platform`].

pub mod error;
pub mod monitor;
pub mod platform;
pub mod policy;

pub use error::{InvalidPollPolicy, PollError};
pub use monitor::{CompletedRun, RunLifecycleMonitor};
pub use platform::{BoxError, RunPlatform, Sleeper, TokioSleeper};
pub use policy::PollPolicy;
