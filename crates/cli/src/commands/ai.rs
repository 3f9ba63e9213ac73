use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sitepack_assistant::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use sitepack_assistant::{AssistantError, GeminiClient};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the stored API key
pub const API_KEY_ENV: &str = "SITEPACK_API_KEY";

/// Global configuration, shared by every site folder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl AssistantConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }
}

/// Get path to global config file
fn config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".sitepack").join("config.toml"))
}

fn load_config_from(path: &Path) -> Result<Option<GlobalConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).context("Failed to read config file")?;
    let config: GlobalConfig = toml::from_str(&contents).context("Failed to parse config file")?;
    Ok(Some(config))
}

fn save_config_to(path: &Path, config: &GlobalConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create config directory")?;
    }
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}

pub fn load_config() -> Result<Option<GlobalConfig>> {
    load_config_from(&config_path()?)
}

/// Pick the API key: the environment wins over the config file
fn resolve_api_key(env: Option<String>, config: &AssistantConfig) -> Option<String> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| config.api_key.clone())
        .filter(|k| !k.trim().is_empty())
}

/// Build the assistant client from the global config
pub fn client() -> Result<GeminiClient> {
    let config = load_config()?.unwrap_or_default().assistant;
    let api_key = resolve_api_key(std::env::var(API_KEY_ENV).ok(), &config)
        .ok_or(AssistantError::MissingApiKey)?;

    tracing::debug!(model = config.model(), "using assistant");

    Ok(GeminiClient::with_options(
        &api_key,
        config.model(),
        config.endpoint(),
    )?)
}

/// Helper to read user input
fn read_input(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Keep `current` when the user just presses Enter
fn prompt_with_default(label: &str, current: &str, shown: &str) -> Result<String> {
    let input = if current.is_empty() {
        read_input(&format!("{}: ", label))?
    } else {
        read_input(&format!("{} [current: {}]: ", label, shown))?
    };
    Ok(if input.is_empty() { current.to_string() } else { input })
}

/// Store the API key and model used by the assistant
pub async fn configure() -> Result<()> {
    println!("🔧 Configuring the AI assistant...\n");

    let path = config_path()?;
    let existing = load_config_from(&path)?.unwrap_or_default().assistant;

    println!("📋 You'll need a Gemini API key");
    println!("      Create at: https://aistudio.google.com/app/apikey");
    println!("   The key can also be given per run with {}", API_KEY_ENV);
    println!();

    let current_key = existing.api_key.clone().unwrap_or_default();
    let shown_key = format!("{}...", current_key.chars().take(6).collect::<String>());
    let api_key = prompt_with_default("API Key", &current_key, &shown_key)?;
    if api_key.is_empty() {
        anyhow::bail!("API key is required");
    }

    let model = prompt_with_default("Model", existing.model(), existing.model())?;

    let config = GlobalConfig {
        assistant: AssistantConfig {
            api_key: Some(api_key),
            model: (model != DEFAULT_MODEL).then_some(model),
            endpoint: existing.endpoint,
        },
    };
    save_config_to(&path, &config)?;

    println!();
    println!("✅ Configuration saved to: {}", path.display());
    println!("   Try: sitepack suggest <site-folder>");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert!(load_config_from(&path).unwrap().is_none());

        let config = GlobalConfig {
            assistant: AssistantConfig {
                api_key: Some("abc".to_string()),
                model: None,
                endpoint: None,
            },
        };
        save_config_to(&path, &config).unwrap();

        let loaded = load_config_from(&path).unwrap().unwrap();
        assert_eq!(loaded.assistant.api_key.as_deref(), Some("abc"));
        assert_eq!(loaded.assistant.model(), DEFAULT_MODEL);
        assert_eq!(loaded.assistant.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_config_without_assistant_table() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert!(config.assistant.api_key.is_none());
    }

    #[test]
    fn test_resolve_api_key_prefers_env() {
        let config = AssistantConfig {
            api_key: Some("stored".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_api_key(Some("env".to_string()), &config).as_deref(),
            Some("env")
        );
        assert_eq!(resolve_api_key(Some(" ".to_string()), &config).as_deref(), Some("stored"));
        assert_eq!(resolve_api_key(None, &AssistantConfig::default()), None);
    }
}
