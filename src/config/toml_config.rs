use crate::utils::error::{EtlError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder pattern"));

/// Optional settings file. Every field may be omitted; command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub io: IoSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoSection {
    pub input: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchSection {
    pub base_url: Option<String>,
    pub engine: Option<String>,
    pub google_domain: Option<String>,
    pub gl: Option<String>,
    pub hl: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl FileConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("Cannot read '{}': {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// 替換 ${VAR} 形式的環境變數，找不到的保留原樣
fn substitute_env_vars(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

/// True for values still holding an unresolved `${VAR}` placeholder.
pub fn is_unresolved(value: &str) -> bool {
    ENV_PLACEHOLDER.is_match(value)
}
