use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use log::*;
use r2d2::Pool;
use serde::Deserialize;

use infra::cosmos::{CosmosAccount, CosmosConnectionManager};
use infra::memory::MemoryConnectionManager;

/// Settings read from the process environment.
#[derive(Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub recipe_store: StoreKind,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    pub cosmos_endpoint: Option<String>,
    pub cosmos_key: Option<String>,
    #[serde(default = "default_database")]
    pub cosmos_database: String,
    #[serde(default = "default_container")]
    pub cosmos_container: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Cosmos,
    Memory,
}

/// The optional TOML file given with `--config`.
#[derive(Deserialize, Debug, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub env_logger: EnvLogger,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Default)]
pub struct EnvLogger {
    #[serde(default)]
    level: Option<LogLevel>,
    #[serde(default)]
    modules: HashMap<String, LogLevel>,
    #[serde(default)]
    timestamp_nanos: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_pool_size() -> u32 {
    4
}

fn default_database() -> String {
    "RecipeBookDB".to_string()
}

fn default_container() -> String {
    "Recipes".to_string()
}

impl Default for StoreKind {
    fn default() -> Self {
        StoreKind::Cosmos
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_iter(std::env::vars())
    }

    pub fn from_iter<I: IntoIterator<Item = (String, String)>>(vars: I) -> Result<Self> {
        let config: Config = envy::from_iter(vars).context("read configuration from environment")?;
        Ok(config)
    }

    pub fn listen_addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    pub fn cosmos_account(&self) -> Result<CosmosAccount> {
        let (endpoint, key) = match (&self.cosmos_endpoint, &self.cosmos_key) {
            (Some(endpoint), Some(key)) if !endpoint.is_empty() && !key.is_empty() => {
                (endpoint, key)
            }
            _ => anyhow::bail!(
                "Azure Cosmos DB credentials not found (set COSMOS_ENDPOINT and COSMOS_KEY)"
            ),
        };
        let account = CosmosAccount::new(
            endpoint,
            key,
            &self.cosmos_database,
            &self.cosmos_container,
        )
        .context("configure Cosmos DB account")?;
        Ok(account)
    }

    pub fn cosmos_pool(&self) -> Result<Pool<CosmosConnectionManager>> {
        let manager = CosmosConnectionManager::new(self.cosmos_account()?);
        debug!("Build pool for {:?}", manager);
        self.pool(manager)
    }

    pub fn memory_pool(&self) -> Result<Pool<MemoryConnectionManager>> {
        warn!("Using an in-memory store; recipes are lost on exit");
        self.pool(MemoryConnectionManager::default())
    }

    fn pool<M: r2d2::ManageConnection>(&self, manager: M) -> Result<Pool<M>> {
        let builder = r2d2::Pool::builder().max_size(self.pool_size);
        debug!("Pool builder: {:?}", builder);
        let pool = builder.build(manager).context("build pool")?;
        Ok(pool)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("recipe_store", &self.recipe_store)
            .field("pool_size", &self.pool_size)
            .field("cosmos_endpoint", &self.cosmos_endpoint)
            .field("cosmos_database", &self.cosmos_database)
            .field("cosmos_container", &self.cosmos_container)
            .finish()
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config_buf = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut config_buf))
            .with_context(|| format!("read {}", path.display()))?;
        let config = toml::from_str(&config_buf).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }
}

impl LogLevel {
    fn to_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl EnvLogger {
    pub fn builder(&self) -> env_logger::Builder {
        let mut b = env_logger::Builder::from_default_env();
        if let Some(level) = self.level.as_ref() {
            b.filter_level(level.to_filter());
        }

        for (module, level) in self.modules.iter() {
            b.filter_module(&module, level.to_filter());
        }

        if self.timestamp_nanos {
            b.format_timestamp_nanos();
        }

        b
    }
}
