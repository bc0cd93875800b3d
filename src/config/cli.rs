use crate::adapters::serpapi::SearchParams;
use crate::config::toml_config::{is_unresolved, FileConfig};
use crate::config::Settings;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "staff-finder")]
#[command(about = "Find school staff contacts from a CSV of prompts using web search and an LLM")]
pub struct CliConfig {
    /// CSV file with a PROMPT column [default: AUTO.csv]
    #[arg(short, long)]
    pub input: Option<String>,

    /// Where to write the prompt,output CSV [default: new_AUTO.csv]
    #[arg(short, long)]
    pub output: Option<String>,

    /// Optional TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Chat model used for contact extraction
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub openai_base_url: Option<String>,

    #[arg(long)]
    pub serpapi_base_url: Option<String>,

    /// SerpAPI engine (google, bing, ...)
    #[arg(long)]
    pub search_engine: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_api_key: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage after each phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// Loads the settings file (if any) and layers flags over it.
    pub fn resolve(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Ok(self.merge(file))
    }

    /// 優先順序：命令列 > 設定檔 > 預設值
    pub fn merge(&self, file: FileConfig) -> Settings {
        let defaults = Settings::default();
        let FileConfig { io, search, llm } = file;

        let pick = |flag: &Option<String>, from_file: Option<String>, default: String| {
            flag.clone().or(from_file).unwrap_or(default)
        };
        let key = |flag: &Option<String>, from_file: Option<String>| {
            flag.clone()
                .or(from_file)
                .filter(|k| !k.trim().is_empty() && !is_unresolved(k))
        };

        Settings {
            input_path: pick(&self.input, io.input, defaults.input_path),
            output_path: pick(&self.output, io.output, defaults.output_path),
            model: pick(&self.model, llm.model, defaults.model),
            openai_base_url: pick(&self.openai_base_url, llm.base_url, defaults.openai_base_url),
            serpapi_base_url: pick(&self.serpapi_base_url, search.base_url, defaults.serpapi_base_url),
            search: SearchParams {
                engine: pick(&self.search_engine, search.engine, defaults.search.engine),
                google_domain: search.google_domain.unwrap_or(defaults.search.google_domain),
                gl: search.gl.unwrap_or(defaults.search.gl),
                hl: search.hl.unwrap_or(defaults.search.hl),
            },
            openai_api_key: key(&self.openai_api_key, llm.api_key),
            serpapi_api_key: key(&self.serpapi_api_key, search.api_key),
        }
    }
}
