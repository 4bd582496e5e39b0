use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};

pub mod codec;
pub mod error;
pub mod manager;
pub mod options;

pub use codec::{Codec, JsonCodec};
pub use error::{StoreError, StoreResult};
pub use manager::{StoreBox, StoreFactory, StoreManager};
pub use options::{
    CallScope, DeleteOptions, ExistsOptions, ListOptions, ReadOptions, StoreOptions, WriteOptions,
};

/// Configuration item definition / 配置项定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    /// Display title (friendly name) / 显示标题
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ConfigItem {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            item_type: item_type.to_string(),
            default: None,
            required: false,
            help: None,
        }
    }

    pub fn title(mut self, val: &str) -> Self {
        self.title = Some(val.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, val: &str) -> Self {
        self.default = Some(val.to_string());
        self
    }

    pub fn help(mut self, val: &str) -> Self {
        self.help = Some(val.to_string());
        self
    }
}

/// Store type information / 存储类型基本信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub name: String,
    /// Whether the store supports a per-operation timeout / 是否支持超时
    #[serde(default)]
    pub supports_timeout: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<String>,
}

/// Complete store information / 存储完整信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Common configuration items (name, namespace, timeout) / 通用配置项
    pub common: Vec<ConfigItem>,
    /// Store-specific configuration items / 存储特有配置项
    pub additional: Vec<ConfigItem>,
    pub config: StoreConfig,
}

/// Generate common configuration items (shared by all stores) / 生成通用配置项
pub fn get_common_items(config: &StoreConfig) -> Vec<ConfigItem> {
    let mut namespace = ConfigItem::new("namespace", "string")
        .help("Default namespace, used as bucket when none is given per call");
    if let Some(ns) = &config.default_namespace {
        namespace = namespace.default(ns);
    }

    let mut items = vec![
        ConfigItem::new("name", "string")
            .required()
            .help("Store name, must be unique"),
        namespace,
    ];

    if config.supports_timeout {
        items.push(
            ConfigItem::new("timeout_secs", "number")
                .default("0")
                .help("Per-operation timeout (seconds), 0 disables it"),
        );
    }

    items
}

/// Value accepted by `Store::write` / 写入的数据
pub enum Payload<'a> {
    /// Raw bytes, stored as-is / 原始字节
    Bytes(Bytes),
    /// Stream of unknown length / 数据流
    Stream(Box<dyn AsyncRead + Unpin + Send + 'a>),
    /// Structured value, encoded by the store codec / 结构化值
    Value(Value),
}

impl From<Vec<u8>> for Payload<'_> {
    fn from(data: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(data))
    }
}

impl From<&'static [u8]> for Payload<'_> {
    fn from(data: &'static [u8]) -> Self {
        Payload::Bytes(Bytes::from_static(data))
    }
}

impl From<Bytes> for Payload<'_> {
    fn from(data: Bytes) -> Self {
        Payload::Bytes(data)
    }
}

/// Where `Store::read` delivers the object / 读取的目标
pub enum Destination<'a> {
    /// Raw bytes are copied into the buffer / 复制原始字节
    Bytes(&'a mut Vec<u8>),
    /// Body is streamed without buffering the whole object / 流式写出
    Writer(&'a mut (dyn AsyncWrite + Unpin + Send)),
    /// Body is decoded by the store codec / 解码为结构化值
    Value(&'a mut Value),
}

/// Generic key-value store interface / 通用键值存储接口
#[async_trait]
pub trait Store: Send + Sync {
    /// Store kind (e.g. "s3") / 存储类型
    fn kind(&self) -> &str;

    /// Configured instance name / 实例名称
    fn name(&self) -> String;

    /// Snapshot of the accumulated options / 当前选项快照
    fn options(&self) -> StoreOptions;

    /// Merge options into the store; safe to call repeatedly / 合并配置
    fn init(&self, options: StoreOptions) -> StoreResult<()>;

    async fn connect(&self) -> StoreResult<()>;

    async fn disconnect(&self) -> StoreResult<()>;

    async fn read(&self, key: &str, dest: Destination<'_>, options: ReadOptions) -> StoreResult<()>;

    async fn write(&self, key: &str, payload: Payload<'_>, options: WriteOptions) -> StoreResult<()>;

    async fn delete(&self, key: &str, options: DeleteOptions) -> StoreResult<()>;

    /// `Ok(())` means the key exists, `StoreError::NotFound` that it does not
    async fn exists(&self, key: &str, options: ExistsOptions) -> StoreResult<()>;

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<String>>;
}

/// Typed helpers over `Store` / 类型化读写
#[async_trait]
pub trait StoreExt: Store {
    async fn write_value<T>(&self, key: &str, value: &T, options: WriteOptions) -> StoreResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(|e| StoreError::Codec(e.to_string()))?;
        self.write(key, Payload::Value(value), options).await
    }

    async fn read_value<T>(&self, key: &str, options: ReadOptions) -> StoreResult<T>
    where
        T: DeserializeOwned + Send,
    {
        let mut value = Value::Null;
        self.read(key, Destination::Value(&mut value), options).await?;
        serde_json::from_value(value).map_err(|e| StoreError::Codec(e.to_string()))
    }

    /// Read raw bytes / 读取原始字节
    async fn read_bytes(&self, key: &str, options: ReadOptions) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.read(key, Destination::Bytes(&mut buf), options).await?;
        Ok(buf)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
