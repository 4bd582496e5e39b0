// Store drivers / 存储驱动
pub mod s3;

use crate::storage::StoreManager;

/// Register all drivers to StoreManager / 注册所有驱动
pub async fn register_all(manager: &StoreManager) -> anyhow::Result<()> {
    // Register S3 driver / 注册S3对象存储驱动
    manager.register_factory(Box::new(s3::S3StoreFactory)).await?;
    Ok(())
}
