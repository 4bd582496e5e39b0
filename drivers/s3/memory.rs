//! In-memory object client (for testing and local runs) / 内存对象存储客户端
//!
//! Behaves like a bucket-scoped object store: writes into a missing bucket
//! fail with `NotFound`, listings honour prefix and delimiter semantics.
//! 写入不存在的存储桶返回 `NotFound`，列表遵循前缀与分隔符语义。

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::storage::{StoreError, StoreResult};
use super::client::{ObjectClient, ObjectStat};

/// Stored object / 存储的对象
#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub data: Bytes,
    pub content_type: String,
    /// Size hint passed with the upload / 上传时的大小提示
    pub size_hint: Option<u64>,
}

/// Thread-safe via `RwLock`. Not persistent, data lost on drop. / 线程安全，不持久化
#[derive(Default)]
pub struct MemoryClient {
    buckets: RwLock<HashMap<String, BTreeMap<String, MemoryObject>>>,
    /// Bucket -> region it was created in / 存储桶所在区域
    regions: RwLock<HashMap<String, String>>,
    calls: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, used to exercise timeouts / 每次调用前延迟
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Number of remote calls served / 已处理的调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.write().entry(bucket.to_string()).or_default();
    }

    pub fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn bucket_region(&self, bucket: &str) -> Option<String> {
        self.regions.read().get(bucket).cloned()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<MemoryObject> {
        self.buckets.read().get(bucket)?.get(key).cloned()
    }

    /// Keys of a bucket, sorted / 存储桶内的键（有序）
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn lookup(&self, bucket: &str, key: &str) -> StoreResult<MemoryObject> {
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NotFound(bucket.to_string()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", bucket, key)))
    }
}

#[async_trait]
impl ObjectClient for MemoryClient {
    async fn bucket_exists(&self, bucket: &str) -> StoreResult<bool> {
        self.enter().await;
        Ok(self.buckets.read().contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str, region: &str) -> StoreResult<()> {
        self.enter().await;
        if bucket.is_empty() {
            return Err(StoreError::Transport("bucket name cannot be empty".to_string()));
        }
        self.create_bucket(bucket);
        self.regions.write().insert(bucket.to_string(), region.to_string());
        Ok(())
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectStat> {
        self.enter().await;
        let object = self.lookup(bucket, key)?;
        Ok(ObjectStat {
            size: Some(object.data.len() as u64),
            content_type: Some(object.content_type),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Bytes> {
        self.enter().await;
        Ok(self.lookup(bucket, key)?.data)
    }

    async fn get_object_to_writer(
        &self,
        bucket: &str,
        key: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> StoreResult<()> {
        self.enter().await;
        let object = self.lookup(bucket, key)?;
        writer.write_all(&object.data).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        size: Option<u64>,
        content_type: &str,
    ) -> StoreResult<()> {
        self.enter().await;
        if !self.buckets.read().contains_key(bucket) {
            return Err(StoreError::NotFound(bucket.to_string()));
        }

        let mut data = Vec::with_capacity(size.unwrap_or(0) as usize);
        reader.read_to_end(&mut data).await?;

        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NotFound(bucket.to_string()))?;
        objects.insert(
            key.to_string(),
            MemoryObject {
                data: Bytes::from(data),
                content_type: content_type.to_string(),
                size_hint: size,
            },
        );
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> StoreResult<()> {
        self.enter().await;
        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NotFound(bucket.to_string()))?;
        // S3 delete is idempotent / 删除不存在的对象不报错
        objects.remove(key);
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str, recursive: bool) -> StoreResult<Vec<String>> {
        self.enter().await;
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NotFound(bucket.to_string()))?;

        let mut names = Vec::new();
        let mut prefixes = BTreeSet::new();
        for key in objects.keys().filter(|k| k.starts_with(prefix)) {
            let rest = &key[prefix.len()..];
            match rest.find('/') {
                Some(pos) if !recursive => {
                    prefixes.insert(format!("{}{}", prefix, &rest[..=pos]));
                }
                _ => names.push(key.clone()),
            }
        }
        names.extend(prefixes);
        Ok(names)
    }
}
