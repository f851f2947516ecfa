//! Core domain types
//!
//! These types describe runs as the platform reports them and are shared
//! between the REST client (which produces them) and the lifecycle monitor
//! and its callers (which interpret them).

pub mod run;
