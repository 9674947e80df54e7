//! Integration test common infrastructure.
//!
//! Provides an in-process server with a spawned owner thread, a fixed
//! identity table and a `ServerControl` that records lifecycle requests.

pub mod server;

#[allow(unused_imports)]
pub use server::{ALICE, BOB, CAROL, TestServer};
