pub mod config;
pub mod sniff;
pub mod storage;
pub mod utils;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

// Register all store drivers (call unified registration function from drivers module) / 注册所有存储驱动
pub async fn register_store_drivers(manager: &storage::StoreManager) -> anyhow::Result<()> {
    drivers::register_all(manager).await
}
