//! S3存储核心实现
//!
//! 将通用键值存储操作映射为对象存储调用：
//! - 键先做安全化处理，再作为对象名
//! - 存储桶按 调用参数 > 命名空间 解析
//! - 未指定内容类型时根据前3072字节检测
//! - 写入前确保存储桶存在

use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;

use crate::sniff::{self, SNIFF_LEN};
use crate::storage::{
    CallScope, Codec, DeleteOptions, Destination, ExistsOptions, JsonCodec, ListOptions, Payload,
    ReadOptions, Store, StoreError, StoreOptions, StoreResult, WriteOptions,
};
use crate::utils::{join_key, sanitize_key};
use super::client::{ObjectClient, RustS3Client};
use super::config::S3Config;

/// 通过 init 累积的配置
struct State {
    name: String,
    namespace: String,
    /// 零表示不限时
    timeout: Duration,
    codec: Arc<dyn Codec>,
    config: S3Config,
}

/// S3存储
pub struct S3Store {
    state: RwLock<State>,
    /// connect 时惰性创建
    client: Mutex<Option<Arc<dyn ObjectClient>>>,
}

impl S3Store {
    /// 创建新的S3存储实例（未连接）
    pub fn new(config: S3Config) -> Self {
        Self {
            state: RwLock::new(State {
                name: String::new(),
                namespace: config.bucket.clone(),
                timeout: Duration::ZERO,
                codec: Arc::new(JsonCodec),
                config,
            }),
            client: Mutex::new(None),
        }
    }

    /// 使用现成的客户端（connect 不再创建新客户端）
    pub fn with_client(config: S3Config, client: Arc<dyn ObjectClient>) -> Self {
        let mut store = Self::new(config);
        store.client = Mutex::new(Some(client));
        store
    }

    async fn client(&self) -> StoreResult<Arc<dyn ObjectClient>> {
        self.client.lock().await.clone().ok_or(StoreError::NotConnected)
    }

    /// 调用参数中的命名空间，否则使用存储的命名空间
    fn namespace<S: CallScope>(&self, scope: &S) -> String {
        match scope.namespace_override().filter(|ns| !ns.is_empty()) {
            Some(ns) => ns.to_string(),
            None => self.state.read().namespace.clone(),
        }
    }

    /// 显式指定的存储桶优先，其次是命名空间
    fn resolve_bucket<S: CallScope>(&self, scope: &S) -> String {
        match scope.bucket_override() {
            Some(bucket) => bucket.to_string(),
            None => self.namespace(scope),
        }
    }

    fn timeout(&self) -> Duration {
        self.state.read().timeout
    }
}

/// 非零超时限制整个远程调用过程
async fn scoped<T, F>(timeout: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    if timeout.is_zero() {
        return fut.await;
    }
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| StoreError::DeadlineExceeded(timeout))?
}

/// 内存中的数据：按前缀检测内容类型，找不到时按原始键的扩展名推断
fn sniff_bytes(data: &[u8], key: &str) -> String {
    sniff::detect_with_key(data, data.len() > SNIFF_LEN, key)
}

#[async_trait]
impl Store for S3Store {
    fn kind(&self) -> &str {
        "s3"
    }

    fn name(&self) -> String {
        self.state.read().name.clone()
    }

    fn options(&self) -> StoreOptions {
        let state = self.state.read();
        let mut options = StoreOptions::new()
            .name(&state.name)
            .namespace(&state.namespace)
            .timeout(state.timeout)
            .codec(state.codec.clone())
            .tls(state.config.tls)
            .region(&state.config.region);
        if !state.config.endpoint.is_empty() {
            options = options.endpoint(&state.config.endpoint);
        }
        if let Some((access_key, secret_key, _)) = state.config.credentials() {
            options = options.access_key(access_key).secret_key(secret_key);
        }
        options
    }

    fn init(&self, options: StoreOptions) -> StoreResult<()> {
        let mut state = self.state.write();

        let mut config = state.config.clone();
        if let Some(endpoint) = options.endpoint.filter(|e| !e.is_empty()) {
            config.endpoint = endpoint;
        }
        if let Some(region) = options.region.filter(|r| !r.is_empty()) {
            config.region = region;
        }
        if let Some(tls) = options.tls {
            config.tls = tls;
        }
        // 凭证必须成对设置
        let access_key = options.access_key.filter(|k| !k.is_empty());
        let secret_key = options.secret_key.filter(|k| !k.is_empty());
        if let (Some(access_key), Some(secret_key)) = (access_key, secret_key) {
            config.access_key_id = access_key;
            config.secret_access_key = secret_key;
        }

        // 端点无效时不修改任何状态
        let endpoint = config.endpoint()?;

        if let Some(name) = options.name {
            state.name = name;
        }
        if let Some(namespace) = options.namespace {
            state.namespace = namespace;
        }
        if let Some(timeout) = options.timeout {
            state.timeout = timeout;
        }
        if let Some(codec) = options.codec {
            state.codec = codec;
        }
        state.config = config;

        tracing::info!(
            "S3 store initialized: name={}, endpoint={}, region={}, namespace={}",
            state.name,
            endpoint.url(),
            state.config.region,
            state.namespace
        );
        Ok(())
    }

    async fn connect(&self) -> StoreResult<()> {
        let mut slot = self.client.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        let config = self.state.read().config.clone();
        let client = RustS3Client::new(&config).map_err(|e| match e {
            StoreError::Connection(_) => e,
            other => StoreError::Connection(other.to_string()),
        })?;

        tracing::info!("S3 store connected: {}", client.endpoint());
        *slot = Some(Arc::new(client));
        Ok(())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn read(&self, key: &str, dest: Destination<'_>, options: ReadOptions) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        let key = sanitize_key(key);
        let bucket = self.resolve_bucket(&options);
        let codec = self.state.read().codec.clone();
        let client = self.client().await?;

        scoped(self.timeout(), async move {
            let stat = client.stat_object(&bucket, &key).await?;
            tracing::debug!(
                "S3 read: bucket={}, key={}, size={:?}, content_type={:?}",
                bucket,
                key,
                stat.size,
                stat.content_type
            );
            match dest {
                Destination::Bytes(buf) => {
                    // 按对象大小预留容量
                    buf.clear();
                    buf.reserve(stat.size.unwrap_or(0) as usize);
                    let data = client.get_object(&bucket, &key).await?;
                    buf.extend_from_slice(&data);
                }
                Destination::Writer(writer) => {
                    client.get_object_to_writer(&bucket, &key, writer).await?;
                }
                Destination::Value(value) => {
                    let data = client.get_object(&bucket, &key).await?;
                    *value = codec.unmarshal(&data)?;
                }
            }
            Ok(())
        })
        .await
    }

    async fn write(&self, key: &str, payload: Payload<'_>, options: WriteOptions) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        let raw_key = key;
        let key = sanitize_key(raw_key);
        let bucket = self.resolve_bucket(&options);
        let (codec, region) = {
            let state = self.state.read();
            (state.codec.clone(), state.config.region.clone())
        };
        let explicit_type = options.content_type.clone().filter(|ct| !ct.is_empty());
        let size_hint = options.size.filter(|size| *size > 0);

        let (mut body, size, content_type): (Box<dyn AsyncRead + Unpin + Send + '_>, Option<u64>, String) =
            match payload {
                Payload::Bytes(data) => {
                    let content_type = explicit_type.unwrap_or_else(|| sniff_bytes(&data, raw_key));
                    let size = size_hint.or(Some(data.len() as u64));
                    (Box::new(Cursor::new(data)), size, content_type)
                }
                Payload::Value(value) => {
                    let data = codec.marshal(&value)?;
                    let content_type = explicit_type.unwrap_or_else(|| sniff_bytes(&data, raw_key));
                    let size = size_hint.or(Some(data.len() as u64));
                    (Box::new(Cursor::new(data)), size, content_type)
                }
                Payload::Stream(reader) if explicit_type.is_some() => {
                    (reader, size_hint, explicit_type.unwrap_or_default())
                }
                Payload::Stream(mut reader) => {
                    // 读取前缀用于检测，再拼回数据流前面
                    // 多读一个字节，区分恰好 SNIFF_LEN 长的数据与被截断的数据
                    let mut prefix = Vec::with_capacity(SNIFF_LEN + 1);
                    (&mut reader).take(SNIFF_LEN as u64 + 1).read_to_end(&mut prefix).await?;
                    let truncated = prefix.len() > SNIFF_LEN;
                    let content_type = sniff::detect_with_key(&prefix, truncated, raw_key);
                    (Box::new(Cursor::new(prefix).chain(reader)), size_hint, content_type)
                }
            };

        let client = self.client().await?;

        tracing::debug!(
            "S3 write: bucket={}, key={}, size={:?}, content_type={}",
            bucket,
            key,
            size,
            content_type
        );

        scoped(self.timeout(), async {
            if !client.bucket_exists(&bucket).await? {
                tracing::warn!("S3 bucket {} does not exist, creating it in {}", bucket, region);
                client.make_bucket(&bucket, &region).await?;
            }
            client
                .put_object(&bucket, &key, &mut *body, size, &content_type)
                .await
        })
        .await
    }

    async fn delete(&self, key: &str, options: DeleteOptions) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        let key = sanitize_key(key);
        let namespace = options.namespace.clone().unwrap_or_default();
        let bucket = self.resolve_bucket(&options);

        // 解析出存储桶时对象名带上调用参数中的命名空间
        let (bucket, object) = if !bucket.is_empty() {
            let object = join_key(&[&namespace, &key]);
            (bucket, object)
        } else {
            (namespace, key)
        };

        let client = self.client().await?;
        tracing::debug!("S3 delete: bucket={}, key={}", bucket, object);

        scoped(self.timeout(), async {
            client.remove_object(&bucket, &object).await
        })
        .await
    }

    async fn exists(&self, key: &str, options: ExistsOptions) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        let key = sanitize_key(key);
        let bucket = self.resolve_bucket(&options);
        let client = self.client().await?;

        scoped(self.timeout(), async {
            let stat = client.stat_object(&bucket, &key).await?;
            tracing::debug!("S3 exists: bucket={}, key={}, size={:?}", bucket, key, stat.size);
            Ok(())
        })
        .await
    }

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<String>> {
        let bucket = self.resolve_bucket(&options);
        let prefix = options.prefix.clone().unwrap_or_default();
        let client = self.client().await?;

        tracing::debug!(
            "S3 list: bucket={}, prefix={}, recursive={}",
            bucket,
            prefix,
            options.recursive
        );

        scoped(self.timeout(), async {
            client.list_objects(&bucket, &prefix, options.recursive).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sniff::TEXT_PLAIN;
    use crate::storage::StoreExt;
    use super::super::memory::MemoryClient;
    use serde_json::json;

    fn memory_store() -> (S3Store, Arc<MemoryClient>) {
        let client = Arc::new(MemoryClient::new());
        let config = S3Config {
            bucket: "micro".to_string(),
            ..Default::default()
        };
        let store = S3Store::with_client(config, client.clone());
        (store, client)
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let (store, _) = memory_store();
        store.write("key", Payload::from(b"test".to_vec()), WriteOptions::new()).await.unwrap();

        let data = store.read_bytes("key", ReadOptions::new()).await.unwrap();
        assert_eq!(data, b"test");
    }

    #[tokio::test]
    async fn test_read_missing_key() {
        let (store, client) = memory_store();
        client.create_bucket("micro");
        let err = store.read_bytes("missing", ReadOptions::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_exists_follows_write_and_delete() {
        let (store, _) = memory_store();
        store.write("key", Payload::from(b"test".to_vec()), WriteOptions::new()).await.unwrap();
        store.exists("key", ExistsOptions::new()).await.unwrap();

        store.delete("key", DeleteOptions::new()).await.unwrap();
        let err = store.exists("key", ExistsOptions::new()).await.unwrap_err();
        assert!(err.is_not_found());
        let err = store.read_bytes("key", ReadOptions::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_contains_written_key() {
        let (store, _) = memory_store();
        store.write("key", Payload::from(b"test".to_vec()), WriteOptions::new()).await.unwrap();

        let keys = store.list(ListOptions::new()).await.unwrap();
        assert!(keys.contains(&"key".to_string()));
    }

    #[tokio::test]
    async fn test_list_prefix_and_recursive() {
        let (store, client) = memory_store();
        client.create_bucket("micro");
        for key in ["logs/a", "logs/2024/b", "other"] {
            let mut reader: &[u8] = b"x";
            client.put_object("micro", key, &mut reader, Some(1), "text/plain").await.unwrap();
        }

        let keys = store.list(ListOptions::new().prefix("logs/")).await.unwrap();
        assert_eq!(keys, vec!["logs/a".to_string(), "logs/2024/".to_string()]);

        let keys = store
            .list(ListOptions::new().prefix("logs/").recursive(true))
            .await
            .unwrap();
        assert_eq!(keys, vec!["logs/2024/b".to_string(), "logs/a".to_string()]);
    }

    #[tokio::test]
    async fn test_list_missing_bucket_is_an_error() {
        let (store, _) = memory_store();
        let err = store.list(ListOptions::new().bucket("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected_without_remote_calls() {
        let (store, client) = memory_store();

        let err = store.write("", Payload::from(b"test".to_vec()), WriteOptions::new()).await;
        assert!(matches!(err, Err(StoreError::InvalidKey)));
        let err = store.read_bytes("", ReadOptions::new()).await;
        assert!(matches!(err, Err(StoreError::InvalidKey)));
        let err = store.delete("", DeleteOptions::new()).await;
        assert!(matches!(err, Err(StoreError::InvalidKey)));
        let err = store.exists("", ExistsOptions::new()).await;
        assert!(matches!(err, Err(StoreError::InvalidKey)));

        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_operations_before_connect() {
        let store = S3Store::new(S3Config::default());

        // key validation comes first
        let err = store.read_bytes("", ReadOptions::new()).await;
        assert!(matches!(err, Err(StoreError::InvalidKey)));

        let err = store.read_bytes("key", ReadOptions::new()).await;
        assert!(matches!(err, Err(StoreError::NotConnected)));
        let err = store.list(ListOptions::new()).await;
        assert!(matches!(err, Err(StoreError::NotConnected)));
    }

    #[tokio::test]
    async fn test_double_init_and_connect() {
        let store = S3Store::new(S3Config::default());
        let options = StoreOptions::new()
            .endpoint("http://localhost:9000")
            .access_key("minioadmin")
            .secret_key("minioadmin");
        store.init(options.clone()).unwrap();
        store.init(options).unwrap();

        store.connect().await.unwrap();
        let first = store.client().await.unwrap();
        store.connect().await.unwrap();
        let second = store.client().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        store.disconnect().await.unwrap();
        store.disconnect().await.unwrap();
    }

    #[test]
    fn test_init_merges_options() {
        let store = S3Store::new(S3Config::default());
        store
            .init(StoreOptions::new().region("eu-west-1").endpoint("https://minio.example.com"))
            .unwrap();
        store
            .init(StoreOptions::new().name("files").timeout(Duration::from_secs(5)))
            .unwrap();

        let options = store.options();
        assert_eq!(options.name.as_deref(), Some("files"));
        assert_eq!(options.region.as_deref(), Some("eu-west-1"));
        assert_eq!(options.endpoint.as_deref(), Some("https://minio.example.com"));
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert_eq!(store.name(), "files");
        assert_eq!(store.kind(), "s3");
    }

    #[test]
    fn test_init_default_region() {
        let store = S3Store::new(S3Config::default());
        store.init(StoreOptions::new()).unwrap();
        assert_eq!(store.options().region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_init_requires_both_credentials() {
        let store = S3Store::new(S3Config::default());
        store.init(StoreOptions::new().access_key("AK")).unwrap();
        assert_eq!(store.options().access_key, None);

        store.init(StoreOptions::new().access_key("AK").secret_key("SK")).unwrap();
        assert_eq!(store.options().access_key.as_deref(), Some("AK"));
    }

    #[test]
    fn test_init_rejects_bad_endpoint() {
        let store = S3Store::new(S3Config::default());
        store.init(StoreOptions::new().endpoint("http://localhost:9000")).unwrap();

        let err = store.init(StoreOptions::new().endpoint("ftp://files.example.com").name("x"));
        assert!(matches!(err, Err(StoreError::Config(_))));
        // previous state is kept
        assert_eq!(store.options().endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(store.name(), "");
    }

    #[tokio::test]
    async fn test_sniffed_content_type() {
        let (store, client) = memory_store();
        store.write("key", Payload::from(b"test".to_vec()), WriteOptions::new()).await.unwrap();

        let object = client.object("micro", "key").unwrap();
        assert_eq!(object.content_type, TEXT_PLAIN);
    }

    #[tokio::test]
    async fn test_explicit_content_type() {
        let (store, client) = memory_store();
        let options = WriteOptions::new().content_type("application/x-custom");
        store.write("key", Payload::from(b"test".to_vec()), options).await.unwrap();

        let object = client.object("micro", "key").unwrap();
        assert_eq!(object.content_type, "application/x-custom");
    }

    #[tokio::test]
    async fn test_content_type_from_key_extension() {
        let (store, client) = memory_store();
        let blob = vec![0x00, 0x01, 0x02, 0xfe];
        store.write("clip.mp4", Payload::from(blob), WriteOptions::new()).await.unwrap();

        let object = client.object("micro", "clip-mp4").unwrap();
        assert_eq!(object.content_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_stream_payload_keeps_sniffed_prefix() {
        let (store, client) = memory_store();
        let data = "abcdefghij".repeat(700).into_bytes();
        assert!(data.len() > SNIFF_LEN);

        let reader = Box::new(Cursor::new(data.clone()));
        store.write("stream", Payload::Stream(reader), WriteOptions::new()).await.unwrap();

        let object = client.object("micro", "stream").unwrap();
        assert_eq!(object.content_type, TEXT_PLAIN);
        assert_eq!(&object.data[..], &data[..]);
    }

    #[tokio::test]
    async fn test_keys_are_sanitized() {
        let (store, client) = memory_store();
        store
            .write("user:42/avatar.png", Payload::from(b"\x89PNG\r\n\x1a\n".to_vec()), WriteOptions::new())
            .await
            .unwrap();

        assert_eq!(client.keys("micro"), vec!["user-42-avatar-png".to_string()]);
        assert_eq!(client.object("micro", "user-42-avatar-png").unwrap().content_type, "image/png");
        store.exists("user:42/avatar.png", ExistsOptions::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_creates_missing_bucket() {
        let (store, client) = memory_store();
        store
            .write("key", Payload::from(b"test".to_vec()), WriteOptions::new().bucket("photos"))
            .await
            .unwrap();

        assert_eq!(client.bucket_names(), vec!["photos".to_string()]);
        assert_eq!(client.bucket_region("photos").as_deref(), Some("us-east-1"));

        let data = store.read_bytes("key", ReadOptions::new().bucket("photos")).await.unwrap();
        assert_eq!(data, b"test");
        // default bucket untouched
        assert!(store.read_bytes("key", ReadOptions::new()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_namespace_selects_bucket() {
        let (store, client) = memory_store();
        store
            .write("key", Payload::from(b"test".to_vec()), WriteOptions::new().namespace("logs"))
            .await
            .unwrap();
        assert!(client.object("logs", "key").is_some());

        let data = store.read_bytes("key", ReadOptions::new().namespace("logs")).await.unwrap();
        assert_eq!(data, b"test");
    }

    #[tokio::test]
    async fn test_delete_joins_namespace_into_object_name() {
        let (store, client) = memory_store();
        client.create_bucket("b");
        let mut reader: &[u8] = b"x";
        client.put_object("b", "ns/key", &mut reader, Some(1), "text/plain").await.unwrap();

        store
            .delete("key", DeleteOptions::new().bucket("b").namespace("ns"))
            .await
            .unwrap();
        assert!(client.object("b", "ns/key").is_none());
    }

    #[tokio::test]
    async fn test_delete_with_namespace_targets_joined_name() {
        let (store, client) = memory_store();
        store
            .write("key", Payload::from(b"test".to_vec()), WriteOptions::new().namespace("logs"))
            .await
            .unwrap();

        // bucket "logs", object "logs/key": the plain object stays
        store.delete("key", DeleteOptions::new().namespace("logs")).await.unwrap();
        assert!(client.object("logs", "key").is_some());
    }

    #[tokio::test]
    async fn test_timeout_bounds_operation() {
        let client = Arc::new(MemoryClient::with_latency(Duration::from_millis(200)));
        let store = S3Store::with_client(S3Config::default(), client);
        store
            .init(StoreOptions::new().namespace("micro").timeout(Duration::from_millis(20)))
            .unwrap();

        let err = store.exists("key", ExistsOptions::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::DeadlineExceeded(_)));
    }

    #[tokio::test]
    async fn test_read_into_writer() {
        let (store, _) = memory_store();
        let data = b"streamed body".to_vec();
        store.write("key", Payload::from(data.clone()), WriteOptions::new()).await.unwrap();

        let mut out: Vec<u8> = Vec::new();
        store
            .read("key", Destination::Writer(&mut out), ReadOptions::new())
            .await
            .unwrap();
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_value_round_trip() {
        let (store, client) = memory_store();
        let value = json!({"name": "yaolist", "tags": ["a", "b"]});
        store.write_value("doc", &value, WriteOptions::new()).await.unwrap();

        assert_eq!(client.object("micro", "doc").unwrap().content_type, "application/json");
        let decoded: serde_json::Value = store.read_value("doc", ReadOptions::new()).await.unwrap();
        assert_eq!(decoded, value);
    }

    #[tokio::test]
    async fn test_value_decode_error() {
        let (store, _) = memory_store();
        store.write("doc", Payload::from(b"not json".to_vec()), WriteOptions::new()).await.unwrap();

        let result: StoreResult<serde_json::Value> = store.read_value("doc", ReadOptions::new()).await;
        assert!(matches!(result, Err(StoreError::Codec(_))));
    }

    #[tokio::test]
    async fn test_large_value_is_json() {
        let (store, client) = memory_store();
        let items: Vec<serde_json::Value> = (0..300)
            .map(|i| json!({"id": i, "name": "yaolist"}))
            .collect();
        let value = serde_json::Value::from(items);
        store.write_value("doc", &value, WriteOptions::new()).await.unwrap();

        let object = client.object("micro", "doc").unwrap();
        assert!(object.data.len() > SNIFF_LEN);
        assert_eq!(object.content_type, "application/json");
    }

    #[tokio::test]
    async fn test_size_hint_forwarded() {
        let (store, client) = memory_store();
        let data = b"hinted stream".to_vec();

        let reader = Box::new(Cursor::new(data.clone()));
        store
            .write("hinted", Payload::Stream(reader), WriteOptions::new().size(data.len() as u64))
            .await
            .unwrap();
        assert_eq!(client.object("micro", "hinted").unwrap().size_hint, Some(data.len() as u64));

        let reader = Box::new(Cursor::new(data.clone()));
        store.write("unhinted", Payload::Stream(reader), WriteOptions::new()).await.unwrap();
        assert_eq!(client.object("micro", "unhinted").unwrap().size_hint, None);

        // zero means unknown length
        let reader = Box::new(Cursor::new(data.clone()));
        store.write("zero", Payload::Stream(reader), WriteOptions::new().size(0)).await.unwrap();
        assert_eq!(client.object("micro", "zero").unwrap().size_hint, None);

        store.write("bytes", Payload::from(data.clone()), WriteOptions::new()).await.unwrap();
        assert_eq!(client.object("micro", "bytes").unwrap().size_hint, Some(data.len() as u64));
    }

    #[tokio::test]
    async fn test_stream_of_exactly_sniff_len() {
        let (store, client) = memory_store();

        // ends with the first two bytes of a three-byte character
        let mut broken = vec![b'a'; SNIFF_LEN - 2];
        broken.extend_from_slice(&"中".as_bytes()[..2]);
        assert_eq!(broken.len(), SNIFF_LEN);
        let reader = Box::new(Cursor::new(broken.clone()));
        store.write("broken", Payload::Stream(reader), WriteOptions::new()).await.unwrap();
        let object = client.object("micro", "broken").unwrap();
        assert_eq!(object.content_type, "application/octet-stream");
        assert_eq!(&object.data[..], &broken[..]);

        // one more byte makes the prefix a cut of a longer text
        let mut longer = broken.clone();
        longer.push(0xad);
        let reader = Box::new(Cursor::new(longer.clone()));
        store.write("longer", Payload::Stream(reader), WriteOptions::new()).await.unwrap();
        let object = client.object("micro", "longer").unwrap();
        assert_eq!(object.content_type, TEXT_PLAIN);
        assert_eq!(&object.data[..], &longer[..]);
    }

    #[tokio::test]
    async fn test_read_replaces_buffer() {
        let (store, _) = memory_store();
        store.write("key", Payload::from(b"test".to_vec()), WriteOptions::new()).await.unwrap();

        let mut buf = b"stale contents".to_vec();
        store.read("key", Destination::Bytes(&mut buf), ReadOptions::new()).await.unwrap();
        assert_eq!(buf, b"test");
    }

    /// Runs against a real S3 service when S3_INTEGRATION is set
    #[tokio::test]
    async fn test_live_store() {
        if std::env::var("S3_INTEGRATION").is_err() {
            return;
        }
        let env = |name: &str| std::env::var(name).unwrap_or_default();

        let store = S3Store::new(S3Config {
            force_path_style: true,
            ..Default::default()
        });
        let options = StoreOptions::new()
            .endpoint(&env("S3_ENDPOINT"))
            .access_key(&env("S3_ACCESS_KEY"))
            .secret_key(&env("S3_SECRET_KEY"));
        store.init(options.clone()).unwrap();
        store.init(options).unwrap();
        store.connect().await.unwrap();
        store.connect().await.unwrap();

        let bucket = format!("yaolist-store-s3-{}", uuid::Uuid::new_v4());
        store
            .write(
                "key",
                Payload::from(b"test".to_vec()),
                WriteOptions::new().bucket(&bucket).content_type("text/plain"),
            )
            .await
            .unwrap();
        store.exists("key", ExistsOptions::new().bucket(&bucket)).await.unwrap();

        let data = store.read_bytes("key", ReadOptions::new().bucket(&bucket)).await.unwrap();
        assert_eq!(data, b"test");

        let names = store.list(ListOptions::new().bucket(&bucket)).await.unwrap();
        assert!(names.contains(&"key".to_string()));

        store.delete("key", DeleteOptions::new().bucket(&bucket)).await.unwrap();
        let err = store.exists("key", ExistsOptions::new().bucket(&bucket)).await.unwrap_err();
        assert!(err.is_not_found());

        store.disconnect().await.unwrap();
    }
}
