pub mod aggregate;
pub mod archive;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod retry;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunSummary};
