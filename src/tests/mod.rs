//! Multi-node tests over loopback TCP.

pub mod integration;
