use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use anyhow::{anyhow, Result};
use serde_json::Value;

use super::{get_common_items, ConfigItem, Store, StoreConfig, StoreInfo, StoreOptions};

pub type StoreBox = Arc<Box<dyn Store>>;

/// Store factory trait / 存储工厂 trait
pub trait StoreFactory: Send + Sync {
    /// Store type name / 存储类型名称
    fn store_type(&self) -> &'static str;

    /// 创建存储实例
    fn create_store(&self, config: Value) -> Result<Box<dyn Store>>;

    /// Return store basic config / 返回存储基本配置
    fn store_config(&self) -> StoreConfig;

    /// Return store specific config items / 返回存储特有配置项
    fn additional_items(&self) -> Vec<ConfigItem>;

    /// Generate complete store info (auto merge common + additional) / 生成完整的存储信息
    fn store_info(&self) -> StoreInfo {
        let config = self.store_config();
        let common = get_common_items(&config);
        let additional = self.additional_items();
        StoreInfo { common, additional, config }
    }
}

/// Store manager (manages all store instances) / 存储管理器
#[derive(Clone, Default)]
pub struct StoreManager {
    stores: Arc<RwLock<HashMap<String, StoreBox>>>,
    factories: Arc<RwLock<HashMap<String, Arc<Box<dyn StoreFactory>>>>>,
    /// Store error status (id -> error message) / 存储错误状态
    store_errors: Arc<RwLock<HashMap<String, String>>>,
}

impl StoreManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register store factory / 注册存储工厂
    pub async fn register_factory(&self, factory: Box<dyn StoreFactory>) -> Result<()> {
        let store_type = factory.store_type().to_string();
        let factory_box = Arc::new(factory);

        let mut factories = self.factories.write().await;
        factories.insert(store_type.clone(), factory_box);

        tracing::info!("Store factory registered: {}", store_type);
        Ok(())
    }

    /// Create store instance, then init and connect it (record error on failure) / 创建存储实例
    pub async fn create_store(&self, id: String, store_type: &str, config: Value) -> Result<String> {
        let factories = self.factories.read().await;
        let factory = factories
            .get(store_type)
            .ok_or_else(|| anyhow!("Store type not found: {}", store_type))?
            .clone();
        drop(factories);

        let created = factory.create_store(config).and_then(|store| {
            store.init(StoreOptions::new().name(&id))?;
            Ok(store)
        });

        let store = match created {
            Ok(store) => store,
            Err(e) => {
                let error_msg = e.to_string();
                self.set_store_error(&id, error_msg.clone()).await;
                tracing::error!("Store creation failed: {} ({}) - {}", id, store_type, error_msg);
                return Err(e);
            }
        };

        let store_box: StoreBox = Arc::new(store);
        let connect_result = store_box.connect().await;

        let mut stores = self.stores.write().await;
        stores.insert(id.clone(), store_box);
        drop(stores);

        match connect_result {
            Ok(()) => {
                self.clear_store_error(&id).await;
                tracing::info!("Store created and connected: {} ({})", id, store_type);
            }
            Err(e) => {
                // The store is kept so a later connect_all can retry / 保留实例以便重连
                let error_msg = e.to_string();
                self.set_store_error(&id, error_msg.clone()).await;
                tracing::warn!("Store created but connect failed: {} ({}) - {}", id, store_type, error_msg);
            }
        }

        Ok(id)
    }

    /// Add an already constructed store / 添加已创建的存储实例
    pub async fn insert_store(&self, id: &str, store: Box<dyn Store>) {
        let mut stores = self.stores.write().await;
        stores.insert(id.to_string(), Arc::new(store));
    }

    /// Set store error status / 设置存储错误状态
    pub async fn set_store_error(&self, id: &str, error: String) {
        let mut errors = self.store_errors.write().await;
        errors.insert(id.to_string(), error);
    }

    /// Clear store error status / 清除存储错误状态
    pub async fn clear_store_error(&self, id: &str) {
        let mut errors = self.store_errors.write().await;
        errors.remove(id);
    }

    /// Get store error status / 获取存储错误状态
    pub async fn get_store_error(&self, id: &str) -> Option<String> {
        let errors = self.store_errors.read().await;
        errors.get(id).cloned()
    }

    /// Get all store error statuses / 获取所有存储错误状态
    pub async fn get_all_store_errors(&self) -> HashMap<String, String> {
        let errors = self.store_errors.read().await;
        errors.clone()
    }

    /// Get store instance / 获取存储实例
    pub async fn get_store(&self, id: &str) -> Option<StoreBox> {
        let stores = self.stores.read().await;
        stores.get(id).cloned()
    }

    /// Remove store instance (disconnects it) / 移除存储实例
    pub async fn remove_store(&self, id: &str) -> Result<()> {
        let mut stores = self.stores.write().await;
        let store = stores
            .remove(id)
            .ok_or_else(|| anyhow!("Store not found: {}", id))?;
        drop(stores);

        store.disconnect().await?;
        self.clear_store_error(id).await;

        tracing::info!("Store removed: {}", id);
        Ok(())
    }

    /// List all stores / 列出所有存储
    pub async fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().await;
        stores.keys().cloned().collect()
    }

    /// List all available store types / 列出所有可用的存储类型
    pub async fn list_store_types(&self) -> Vec<String> {
        let factories = self.factories.read().await;
        factories.keys().cloned().collect()
    }

    /// Get store info of every registered factory / 获取所有工厂的存储信息
    pub async fn list_store_infos(&self) -> Vec<StoreInfo> {
        let factories = self.factories.read().await;
        factories.values().map(|f| f.store_info()).collect()
    }

    /// Connect every store, recording failures per id / 连接所有存储
    pub async fn connect_all(&self) -> HashMap<String, String> {
        let stores: Vec<(String, StoreBox)> = {
            let stores = self.stores.read().await;
            stores.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        let results = futures::future::join_all(
            stores.iter().map(|(_, store)| store.connect()),
        )
        .await;

        let mut failed = HashMap::new();
        for ((id, _), result) in stores.iter().zip(results) {
            match result {
                Ok(()) => self.clear_store_error(id).await,
                Err(e) => {
                    tracing::warn!("Store connect failed: {} - {}", id, e);
                    self.set_store_error(id, e.to_string()).await;
                    failed.insert(id.clone(), e.to_string());
                }
            }
        }
        failed
    }

    /// Disconnect every store / 断开所有存储
    pub async fn disconnect_all(&self) -> Result<()> {
        let stores = self.stores.read().await;
        for (id, store) in stores.iter() {
            store
                .disconnect()
                .await
                .map_err(|e| anyhow!("Store disconnect failed: {} - {}", id, e))?;
        }
        Ok(())
    }
}
