use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_TEMPERATURE: f64 = 1.0;
const DEFAULT_PROMPT_TEMPLATE: &str =
    "Answer the question from the user in simple terms:\n{question}";

const CONFIG_DIR_NAME: &str = ".gpt4shell";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub model: String,
    pub provider: String,
    pub temperature: f64,
    pub prompt_template: String,
    pub max_tokens: Option<u32>,
    pub api_base: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            max_tokens: None,
            api_base: None,
        }
    }
}

// Per-key overlay read from the user's config file. Unknown keys are
// accepted and ignored; a `null` optional keeps the default.
#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    model: Option<String>,
    provider: Option<String>,
    temperature: Option<f64>,
    prompt_template: Option<String>,
    max_tokens: Option<u32>,
    api_base: Option<String>,
}

impl Config {
    fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(provider) = overrides.provider {
            self.provider = provider;
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(prompt_template) = overrides.prompt_template {
            self.prompt_template = prompt_template;
        }
        if let Some(max_tokens) = overrides.max_tokens {
            self.max_tokens = Some(max_tokens);
        }
        if let Some(api_base) = overrides.api_base {
            self.api_base = Some(api_base);
        }
        self
    }
}

pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

// A config file that exists but cannot be used is never fatal: the tool
// still answers with the built-in defaults.
pub fn load_from(path: &Path) -> Config {
    let defaults = Config::default();

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file found, using defaults");
            return defaults;
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "could not read config file, using default configuration"
            );
            return defaults;
        }
    };

    match serde_json::from_str::<ConfigOverrides>(&raw) {
        Ok(overrides) => defaults.apply(overrides),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "could not parse config file, using default configuration"
            );
            defaults
        }
    }
}

pub struct ConfigStore {
    path: PathBuf,
    cached: Option<Config>,
}

impl ConfigStore {
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(config_path()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path, cached: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&mut self) -> &Config {
        let path = &self.path;
        self.cached.get_or_insert_with(|| load_from(path))
    }

    pub fn reload(&mut self) -> &Config {
        self.cached.insert(load_from(&self.path))
    }
}

pub fn example_config() -> Config {
    Config {
        model: "gpt-4".to_string(),
        provider: "openai".to_string(),
        temperature: 0.7,
        prompt_template:
            "You are a helpful assistant. Answer the question concisely and accurately:\n{question}"
                .to_string(),
        max_tokens: Some(1000),
        api_base: None,
    }
}

pub fn write_example(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }

    let body = serde_json::to_string_pretty(&example_config())
        .context("Failed to serialize example configuration")?;
    fs::write(path, body + "\n")
        .with_context(|| format!("Failed to write example config to '{}'", path.display()))?;
    Ok(())
}

pub fn create_example() -> Result<PathBuf> {
    let path = config_path()?;
    write_example(&path)?;
    Ok(path)
}
