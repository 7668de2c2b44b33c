//! Public entry points
//!
//! [`Client`] suspends the calling task; [`BlockingClient`] blocks the
//! calling thread. Both share request definitions, the retry engine and the
//! generator core, and differ only in how they wait.
//!
//! Series and forge operations are reached through scoped handles:
//!
//! ```no_run
//! # fn example() -> slugkit::ClientResult<()> {
//! use slugkit::{BlockingClient, ClientConfig};
//!
//! let client = BlockingClient::new(ClientConfig::from_env()?)?;
//! let orders = client.series()?.named("orders");
//! println!("{:?}", orders.info()?);
//!
//! let ids = client.forge()?.forge("{adjective}-{noun}", Some("seed"), None, 3)?;
//! assert_eq!(ids.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod asynchronous;
pub mod blocking;
pub(crate) mod calls;

pub use asynchronous::{Client, ForgeClient, SeriesClient};
pub use blocking::{BlockingClient, BlockingForgeClient, BlockingSeriesClient};
pub use calls::DEFAULT_TAGS_LIMIT;

use crate::error::{ClientError, ClientResult};

/// Message of the error returned when a key-only operation has no key
pub const API_KEY_REQUIRED: &str = "API key is required";

fn require_api_key(has_api_key: bool) -> ClientResult<()> {
    if has_api_key {
        Ok(())
    } else {
        Err(ClientError::Configuration(API_KEY_REQUIRED.to_string()))
    }
}
