//! S3驱动配置

use serde::{Deserialize, Serialize};
use url::Url;

use crate::storage::{StoreError, StoreResult};

/// S3配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3端点地址
    /// AWS: 留空（https://s3.{region}.amazonaws.com）
    /// MinIO: http://localhost:9000
    /// 不带协议时视为 host[:port]
    #[serde(default)]
    pub endpoint: String,
    /// 区域
    #[serde(default = "default_region")]
    pub region: String,
    /// Access Key ID
    #[serde(default)]
    pub access_key_id: String,
    /// Secret Access Key
    #[serde(default)]
    pub secret_access_key: String,
    /// Session Token（用于临时凭证）
    #[serde(default)]
    pub session_token: String,
    /// 默认存储桶，未指定命名空间时使用
    #[serde(default)]
    pub bucket: String,
    /// 强制使用路径风格（而非虚拟主机风格）
    /// MinIO等需要设置为true
    #[serde(default)]
    pub force_path_style: bool,
    /// 强制TLS，即使端点不是 https://
    #[serde(default)]
    pub tls: bool,
}

pub(crate) fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: String::new(),
            bucket: String::new(),
            force_path_style: false,
            tls: false,
        }
    }
}

impl S3Config {
    /// 仅当 access key 与 secret key 都存在时返回凭证
    pub fn credentials(&self) -> Option<(&str, &str, Option<&str>)> {
        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            return None;
        }
        let token = if self.session_token.is_empty() {
            None
        } else {
            Some(self.session_token.as_str())
        };
        Some((&self.access_key_id, &self.secret_access_key, token))
    }

    /// 解析端点
    pub fn endpoint(&self) -> StoreResult<Endpoint> {
        if self.endpoint.is_empty() {
            return Ok(Endpoint {
                host: format!("s3.{}.amazonaws.com", self.region),
                secure: true,
            });
        }
        Endpoint::parse(&self.endpoint, self.tls)
    }
}

/// 端点：主机与是否使用TLS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// host[:port]
    pub host: String,
    pub secure: bool,
}

impl Endpoint {
    /// `https://` 前缀或显式TLS都会启用安全传输
    pub fn parse(raw: &str, force_tls: bool) -> StoreResult<Self> {
        let secure = raw.starts_with("https://") || force_tls;

        let host = match Url::parse(raw) {
            Ok(url) if url.has_host() => {
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(StoreError::Config(format!(
                        "unsupported endpoint scheme: {}",
                        url.scheme()
                    )));
                }
                let host = url.host_str().unwrap_or_default();
                match url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                }
            }
            // host[:port] without scheme
            _ => raw.trim_end_matches('/').to_string(),
        };

        if host.is_empty() {
            return Err(StoreError::Config(format!("invalid endpoint: {}", raw)));
        }

        Ok(Self { host, secure })
    }

    pub fn url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }
}
