//! Generator and stream controller
//!
//! A [`GeneratorConfig`] describes what to generate. The blocking and async
//! generators turn it into batched calls through the retry engine and yield
//! identifiers in server order. Both drive the same [`StreamCursor`] and
//! [`BatchPlanner`], so identical configurations and server responses produce
//! identical sequences.
//!
//! ```no_run
//! # async fn example(client: slugkit::Client) -> slugkit::ClientResult<()> {
//! use futures::StreamExt;
//!
//! let preview = client
//!     .series()?
//!     .named("orders")
//!     .slice()
//!     .starting_from(1000)
//!     .with_limit(25);
//!
//! let mut slugs = preview.stream();
//! while let Some(slug) = slugs.next().await {
//!     println!("{}", slug?);
//! }
//! # Ok(())
//! # }
//! ```

use futures_util::Stream;
use std::pin::Pin;

use crate::error::ClientResult;

pub mod asynchronous;
pub mod blocking;
pub mod config;
pub mod plan;

pub use asynchronous::AsyncGenerator;
pub use blocking::{BlockingGenerator, BlockingSlugStream};
pub use config::{GeneratorConfig, Target, DEFAULT_BATCH_SIZE};
pub use plan::{BatchPlanner, BatchRequest, Pulled, StreamCursor};

/// Stream returned by [`AsyncGenerator::stream`]
pub type SlugStream = Pin<Box<dyn Stream<Item = ClientResult<String>> + Send>>;
