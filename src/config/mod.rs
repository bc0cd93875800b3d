#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::openai::{OpenAiClient, DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL};
use crate::adapters::serpapi::{SearchParams, SerpApiSearcher, DEFAULT_SERPAPI_BASE_URL};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_distinct_paths, validate_non_empty_string, validate_path, validate_url, Validate,
};
use std::fmt;

pub const DEFAULT_INPUT_PATH: &str = "AUTO.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "new_AUTO.csv";

/// Fully resolved run configuration.
///
/// Credentials are carried here and handed to the provider clients, so
/// nothing below `main` reads the environment.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub input_path: String,
    pub output_path: String,
    pub model: String,
    pub openai_base_url: String,
    pub serpapi_base_url: String,
    pub search: SearchParams,
    pub openai_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_path: DEFAULT_INPUT_PATH.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            serpapi_base_url: DEFAULT_SERPAPI_BASE_URL.to_string(),
            search: SearchParams::default(),
            openai_api_key: None,
            serpapi_api_key: None,
        }
    }
}

impl Settings {
    pub fn searcher(&self) -> SerpApiSearcher {
        SerpApiSearcher::new(self.serpapi_api_key.clone())
            .with_base_url(&self.serpapi_base_url)
            .with_params(self.search.clone())
    }

    pub fn llm_client(&self) -> OpenAiClient {
        OpenAiClient::new(self.openai_api_key.clone())
            .with_base_url(&self.openai_base_url)
            .with_model(&self.model)
    }
}

// 不要把金鑰印進日誌
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(key: &Option<String>) -> &'static str {
            if key.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("Settings")
            .field("input_path", &self.input_path)
            .field("output_path", &self.output_path)
            .field("model", &self.model)
            .field("openai_base_url", &self.openai_base_url)
            .field("serpapi_base_url", &self.serpapi_base_url)
            .field("search", &self.search)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("serpapi_api_key", &redact(&self.serpapi_api_key))
            .finish()
    }
}

impl ConfigProvider for Settings {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_path("input_path", &self.input_path)?;
        validate_path("output_path", &self.output_path)?;
        validate_distinct_paths(&self.input_path, &self.output_path)?;
        validate_url("openai_base_url", &self.openai_base_url)?;
        validate_url("serpapi_base_url", &self.serpapi_base_url)?;
        validate_non_empty_string("model", &self.model)?;
        validate_non_empty_string("search.engine", &self.search.engine)?;
        // API 金鑰留到實際呼叫時才檢查
        Ok(())
    }
}
