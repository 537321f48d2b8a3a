//! Embedded services exposed by the daemon.

pub mod queue;
