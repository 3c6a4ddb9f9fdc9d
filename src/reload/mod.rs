//! Outbound reload calls.

mod client;
mod transport;

pub use client::{DEFAULT_REQUEST_TIMEOUT, ReloadClient, check_response};
pub use transport::bearer_client;
