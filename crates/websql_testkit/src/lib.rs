//! # WebSQL Bridge Testkit
//!
//! An in-memory stand-in for the remote SQL service, implementing both
//! client transports: the blocking control endpoint (open, version read,
//! close, file proxy, removal) and the session command protocol. It does
//! not parse SQL; statement outcomes are scripted. Every reply travels
//! through real envelope text and the protocol normalizer, so tests
//! exercise the same decode path as production.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod service;

pub use service::{ExecOutcome, MemoryService};
