//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::drivers::s3::S3Config;

/// Global configuration instance / 全局配置实例
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Store instance configuration / 存储实例配置
    #[serde(default)]
    pub store: StoreSection,
    /// S3 connection configuration / S3连接配置
    #[serde(default)]
    pub s3: S3Config,
}

/// Store instance configuration / 存储实例配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// Store id in the manager / 存储ID
    pub id: String,
    /// Store type / 存储类型
    #[serde(default = "default_store_type")]
    pub store_type: String,
    /// Store display name / 存储名称
    pub name: String,
    /// Default namespace, empty means the S3 bucket / 默认命名空间
    #[serde(default)]
    pub namespace: String,
    /// Per-operation timeout in seconds, 0 disables it / 操作超时（秒）
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_store_type() -> String {
    "s3".to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            store_type: default_store_type(),
            name: "S3".to_string(),
            namespace: String::new(),
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Apply S3_ENDPOINT / S3_ACCESS_KEY / S3_SECRET_KEY overrides / 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(endpoint) = get("S3_ENDPOINT") {
            self.s3.endpoint = endpoint;
        }
        if let Some(access_key) = get("S3_ACCESS_KEY") {
            self.s3.access_key_id = access_key;
        }
        if let Some(secret_key) = get("S3_SECRET_KEY") {
            self.s3.secret_access_key = secret_key;
        }
    }

    /// Flat JSON handed to the store factory / 传给存储工厂的配置
    pub fn store_json(&self) -> Result<Value> {
        let mut value = serde_json::to_value(&self.s3)
            .map_err(|e| anyhow!("Failed to serialize store config: {}", e))?;
        if let Some(obj) = value.as_object_mut() {
            if !self.store.namespace.is_empty() {
                obj.insert("namespace".to_string(), Value::from(self.store.namespace.clone()));
            }
            obj.insert("timeout_secs".to_string(), Value::from(self.store.timeout_secs));
        }
        Ok(value)
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from config.json in the working directory / 加载配置文件
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&get_config_path())
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config_from(config_path: &Path) -> Result<AppConfig> {
    let mut config = if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| anyhow!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        config
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config_to(config_path, &config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        config
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Save configuration to file / 保存配置到文件
fn save_config_to(config_path: &Path, config: &AppConfig) -> Result<()> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| anyhow!("Failed to write config file: {}", e))?;

    Ok(())
}

/// Initialize global configuration / 初始化全局配置
pub fn init_config() -> Result<Arc<RwLock<AppConfig>>> {
    let config = load_config()?;

    let config_arc = Arc::new(RwLock::new(config));

    CONFIG
        .set(config_arc.clone())
        .map_err(|_| anyhow!("Config already initialized"))?;

    Ok(config_arc)
}
