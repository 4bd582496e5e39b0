use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yaolist_store_s3::config;
use yaolist_store_s3::storage::{
    DeleteOptions, ExistsOptions, ListOptions, Payload, Store, StoreManager, WriteOptions,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yaolist_store_s3=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "yaolist-store-s3 {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME")
    );

    // Load configuration / 加载配置
    let app_config = config::init_config()?.read().clone();
    let section = &app_config.store;

    let store_manager = StoreManager::new();

    // Register all store factories / 注册所有存储工厂
    yaolist_store_s3::register_store_drivers(&store_manager).await?;

    store_manager
        .create_store(section.id.clone(), &section.store_type, app_config.store_json()?)
        .await?;

    if let Some(error) = store_manager.get_store_error(&section.id).await {
        tracing::warn!("Store {} ({}) is not ready: {}", section.name, section.id, error);
        return Ok(());
    }

    let store = store_manager
        .get_store(&section.id)
        .await
        .ok_or_else(|| anyhow::anyhow!("Store not found: {}", section.id))?;
    tracing::info!("Store {} ({}) ready, namespace={:?}", section.name, section.id, store.options().namespace);

    // Verify listing / 验证存储可用
    match store.list(ListOptions::new()).await {
        Ok(keys) => tracing::info!("Store {} holds {} keys at top level", section.id, keys.len()),
        Err(e) => tracing::warn!("Store {} verification failed: {}", section.id, e),
    }

    // Optional write/delete round trip / 可选的写入验证
    if std::env::args().any(|arg| arg == "--check-write") {
        let key = format!("check-{}", uuid::Uuid::new_v4());
        store
            .write(&key, Payload::from(b"yaolist check".to_vec()), WriteOptions::new())
            .await?;
        store.exists(&key, ExistsOptions::new()).await?;
        store.delete(&key, DeleteOptions::new()).await?;
        tracing::info!("Write check succeeded: {}", key);
    }

    store_manager.disconnect_all().await?;
    Ok(())
}
