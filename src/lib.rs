//! Candidates API — proposal lifecycle service and strategy worker.

pub mod config;
pub mod domain;
pub mod error;
pub mod sandbox;
pub mod server;
pub mod service;
pub mod store;
pub mod strategies;
pub mod worker;
