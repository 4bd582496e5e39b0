//! Store options / 存储选项
//!
//! `StoreOptions` is accumulated by `Store::init`; every operation takes its
//! own typed option struct scoped to that single call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::codec::Codec;

/// Init-scoped options / 初始化选项
///
/// Fields left as `None` keep whatever an earlier `init` stored.
#[derive(Clone, Default)]
pub struct StoreOptions {
    /// Store instance name / 存储实例名称
    pub name: Option<String>,
    /// Default namespace, used as the fallback bucket / 默认命名空间
    pub namespace: Option<String>,
    /// Per-operation timeout (zero means none) / 单次操作超时
    pub timeout: Option<Duration>,
    pub codec: Option<Arc<dyn Codec>>,
    /// Force TLS transport regardless of endpoint scheme / 强制TLS
    pub tls: Option<bool>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, val: &str) -> Self {
        self.name = Some(val.to_string());
        self
    }

    pub fn namespace(mut self, val: &str) -> Self {
        self.namespace = Some(val.to_string());
        self
    }

    pub fn timeout(mut self, val: Duration) -> Self {
        self.timeout = Some(val);
        self
    }

    pub fn codec(mut self, val: Arc<dyn Codec>) -> Self {
        self.codec = Some(val);
        self
    }

    pub fn tls(mut self, val: bool) -> Self {
        self.tls = Some(val);
        self
    }

    pub fn endpoint(mut self, val: &str) -> Self {
        self.endpoint = Some(val.to_string());
        self
    }

    pub fn region(mut self, val: &str) -> Self {
        self.region = Some(val.to_string());
        self
    }

    pub fn access_key(mut self, val: &str) -> Self {
        self.access_key = Some(val.to_string());
        self
    }

    pub fn secret_key(mut self, val: &str) -> Self {
        self.secret_key = Some(val.to_string());
        self
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .field("codec", &self.codec.as_ref().map(|c| c.name().to_string()))
            .field("tls", &self.tls)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Bucket/namespace scope shared by every per-call option struct
pub trait CallScope {
    /// Explicit bucket override / 指定存储桶
    fn bucket_override(&self) -> Option<&str>;
    /// Namespace override for this call / 本次调用的命名空间
    fn namespace_override(&self) -> Option<&str>;
}

macro_rules! call_scope {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $ty {
                pub fn new() -> Self {
                    Self::default()
                }

                pub fn bucket(mut self, val: &str) -> Self {
                    self.bucket = Some(val.to_string());
                    self
                }

                pub fn namespace(mut self, val: &str) -> Self {
                    self.namespace = Some(val.to_string());
                    self
                }
            }

            impl CallScope for $ty {
                fn bucket_override(&self) -> Option<&str> {
                    self.bucket.as_deref().filter(|b| !b.is_empty())
                }

                fn namespace_override(&self) -> Option<&str> {
                    self.namespace.as_deref()
                }
            }
        )+
    };
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub namespace: Option<String>,
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub namespace: Option<String>,
    pub bucket: Option<String>,
    /// Explicit content type, skips sniffing / 指定内容类型
    pub content_type: Option<String>,
    /// Payload size hint, `None` means unknown length / 大小提示
    pub size: Option<u64>,
}

impl WriteOptions {
    pub fn content_type(mut self, val: &str) -> Self {
        self.content_type = Some(val.to_string());
        self
    }

    pub fn size(mut self, val: u64) -> Self {
        self.size = Some(val);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub namespace: Option<String>,
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExistsOptions {
    pub namespace: Option<String>,
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub namespace: Option<String>,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    /// Walk the whole key space instead of one level / 递归列出
    pub recursive: bool,
}

impl ListOptions {
    pub fn prefix(mut self, val: &str) -> Self {
        self.prefix = Some(val.to_string());
        self
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.recursive = val;
        self
    }
}

call_scope!(ReadOptions, WriteOptions, DeleteOptions, ExistsOptions, ListOptions);
