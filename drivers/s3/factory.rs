//! S3存储工厂

use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::storage::{ConfigItem, Store, StoreConfig, StoreFactory, StoreOptions};
use super::config::S3Config;
use super::driver::S3Store;

/// 通用配置（与S3配置位于同一层级）
#[derive(Debug, Default, Deserialize)]
struct CommonSection {
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    timeout_secs: u64,
}

/// S3存储工厂
pub struct S3StoreFactory;

impl StoreFactory for S3StoreFactory {
    fn store_type(&self) -> &'static str {
        "s3"
    }

    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            name: "S3".to_string(),
            supports_timeout: true,
            default_namespace: None,
        }
    }

    fn additional_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("endpoint", "string")
                .title("端点地址")
                .help("S3端点URL，留空使用AWS（MinIO: http://localhost:9000）"),
            ConfigItem::new("region", "string")
                .title("区域")
                .help("S3区域，如 us-east-1、cn-hangzhou；自动创建存储桶时使用")
                .default("us-east-1"),
            ConfigItem::new("access_key_id", "string")
                .title("Access Key ID")
                .help("与 Secret Access Key 同时填写才生效，否则匿名访问"),
            ConfigItem::new("secret_access_key", "password")
                .title("Secret Access Key"),
            ConfigItem::new("session_token", "password")
                .title("Session Token")
                .help("临时凭证的会话令牌（可选）"),
            ConfigItem::new("bucket", "string")
                .title("默认存储桶")
                .help("未指定命名空间时使用的存储桶"),
            ConfigItem::new("force_path_style", "bool")
                .title("强制路径风格")
                .help("MinIO等需要开启此选项")
                .default("false"),
            ConfigItem::new("tls", "bool")
                .title("强制TLS")
                .help("端点不是 https:// 时也使用TLS")
                .default("false"),
        ]
    }

    fn create_store(&self, config: Value) -> Result<Box<dyn Store>> {
        let common: CommonSection = serde_json::from_value(config.clone())
            .map_err(|e| anyhow!("配置解析失败: {}", e))?;
        let s3_config: S3Config = serde_json::from_value(config)
            .map_err(|e| anyhow!("配置解析失败: {}", e))?;

        let store = S3Store::new(s3_config);

        let mut options = StoreOptions::new().timeout(Duration::from_secs(common.timeout_secs));
        if let Some(namespace) = common.namespace.filter(|ns| !ns.is_empty()) {
            options = options.namespace(&namespace);
        }
        store.init(options)?;

        Ok(Box::new(store))
    }
}
