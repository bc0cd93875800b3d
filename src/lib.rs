pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::{openai::OpenAiClient, serpapi::SerpApiSearcher, storage::LocalStorage};
pub use crate::config::Settings;
pub use crate::core::{etl::EtlEngine, pipeline::StaffDirectoryPipeline, row::RowProcessor};
pub use crate::utils::error::{EtlError, Result};
