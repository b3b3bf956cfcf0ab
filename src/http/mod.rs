//! HTTP plumbing shared by the index clients: retries, probes and downloads.

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{NonRetryableError, check_retryable, with_retry};
