//! Data Transfer Objects for the platform's run API
//!
//! Request and response payloads used by the REST client. They mirror the
//! platform's JSON shapes and carry no behaviour of their own.

pub mod run;
