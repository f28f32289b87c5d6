//! Worker process: claims proposals over HTTP and executes them.

mod client;
mod worker;

pub use client::ApiClient;
pub use worker::Worker;
