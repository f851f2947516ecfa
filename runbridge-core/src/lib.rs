//! Runbridge Core
//!
//! Core types and abstractions for driving runs on a managed compute platform.
//!
//! This crate contains:
//! - Domain types: Runs, lifecycle states and poll snapshots
//! - DTOs: Payloads exchanged with the platform's run API
//! - Lifecycle: The submit, poll and terminal-decision loop

pub mod domain;
pub mod dto;
pub mod lifecycle;
