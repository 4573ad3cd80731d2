//! Configuration
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. A TOML file: the builder's `config_path`, else `STRAND_CONFIG_PATH`,
//!    else `strand.toml` in the working directory (optional)
//! 3. `STRAND_*` environment variables, `__` between section and key
//!    (`STRAND_SCHEDULER__STEP_BUDGET=1000`), after `.env` is loaded
//! 4. Explicit builder overrides (CLI flags)

use anyhow::{Context, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::interpreter::trace::{TraceFormat, DEFAULT_DELIMITER};
use crate::interpreter::RunOptions;

const ENV_PREFIX: &str = "STRAND";
const CONFIG_PATH_VAR: &str = "STRAND_CONFIG_PATH";
const DEFAULT_CONFIG_FILE: &str = "strand.toml";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub trace: TraceConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Total instruction budget; unlimited when unset
    #[serde(default)]
    pub step_budget: Option<usize>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Separator for stack snapshots and call-stack markers
    pub delimiter: String,
    pub format: TraceFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            trace: TraceConfig {
                delimiter: DEFAULT_DELIMITER.to_string(),
                format: TraceFormat::default(),
            },
            log: LogConfig {
                filter: DEFAULT_LOG_FILTER.to_string(),
            },
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            step_budget: self.scheduler.step_budget,
            dry_run: self.scheduler.dry_run,
        }
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

/// Builder applying explicit overrides on top of file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    step_budget: Option<usize>,
    dry_run: Option<bool>,
    delimiter: Option<String>,
    format: Option<TraceFormat>,
}

impl ConfigBuilder {
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn step_budget(mut self, budget: Option<usize>) -> Self {
        self.step_budget = budget;
        self
    }

    pub fn dry_run(mut self, dry_run: Option<bool>) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn delimiter(mut self, delimiter: Option<String>) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn format(mut self, format: Option<TraceFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn build(self) -> Result<Config> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let mut builder = config::Config::builder()
            .set_default("scheduler.dry_run", defaults.scheduler.dry_run)?
            .set_default("trace.delimiter", defaults.trace.delimiter)?
            .set_default("trace.format", "json")?
            .set_default("log.filter", defaults.log.filter)?;

        // An explicitly named file must exist; the default one is optional
        let explicit = self
            .config_path
            .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));
        builder = match &explicit {
            Some(path) => builder.add_source(
                File::new(&path.to_string_lossy(), FileFormat::Toml).required(true),
            ),
            None => builder
                .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(budget) = self.step_budget {
            builder = builder.set_override("scheduler.step_budget", budget as u64)?;
        }
        if let Some(dry_run) = self.dry_run {
            builder = builder.set_override("scheduler.dry_run", dry_run)?;
        }
        if let Some(delimiter) = self.delimiter {
            builder = builder.set_override("trace.delimiter", delimiter)?;
        }
        if let Some(format) = self.format {
            let name = match format {
                TraceFormat::Json => "json",
                TraceFormat::Text => "text",
            };
            builder = builder.set_override("trace.format", name)?;
        }

        let config = builder
            .build()
            .with_context(|| match &explicit {
                Some(path) => format!("Failed to read config file {}", path.display()),
                None => "Failed to load configuration".to_string(),
            })?
            .try_deserialize::<Config>()
            .context("Invalid configuration")?;

        if config.trace.delimiter.is_empty() {
            anyhow::bail!("trace.delimiter must not be empty");
        }

        Ok(config)
    }
}
