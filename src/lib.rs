//! orapost - generates blog posts about Oracle database error codes.
//!
//! Each run asks a generative-language API for a Markdown article about one
//! real `ORA-NNNNN` error that has not been covered before, writes it to a
//! dated file and records the code in a JSON ledger.
//!
//! # Architecture
//!
//! - [`config`] - Run configuration (paths, endpoint, retry bound, API key)
//! - [`error`] - Error taxonomy
//! - [`error_code`] - `ORA-NNNNN` codes and their extraction from text
//! - [`ledger`] - Persistent list of codes already written about
//! - [`http_client`] - HTTP client abstraction
//! - [`generator`] - Prompt building and the generation endpoint
//! - [`markdown`] - Heading and code fence conversion to HTML
//! - [`post_writer`] - Post filenames and writing
//! - [`providers`] - Injectable date source
//! - [`pipeline`] - The bounded retry loop tying everything together
//!
//! # Example
//!
//! ```ignore
//! use orapost::config::Config;
//! use orapost::generator::MockGenerator;
//! use orapost::pipeline::PostPipeline;
//! use orapost::providers::LocalDateProvider;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let pipeline = PostPipeline::new(
//!         &config,
//!         Box::new(MockGenerator::new()),
//!         Box::new(LocalDateProvider),
//!     )?;
//!     let article = pipeline.run().await?;
//!     println!("{} -> {}", article.code, article.path.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod error_code;
pub mod generator;
pub mod http_client;
pub mod ledger;
pub mod markdown;
pub mod pipeline;
pub mod post_writer;
pub mod providers;
