//! S3客户端抽象
//!
//! `ObjectClient` 是驱动向对象存储发出的全部调用；
//! `RustS3Client` 基于 rust-s3 实现，协议、签名、分片上传都由 rust-s3 负责。

use async_trait::async_trait;
use bytes::Bytes;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{BucketConfiguration, Region};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::storage::{StoreError, StoreResult};
use super::config::S3Config;

/// 小于该大小且已知长度时使用单次PUT，否则走rust-s3的分片流式上传
pub const SINGLE_PUT_LIMIT: u64 = 8 * 1024 * 1024;

/// 对象元数据
#[derive(Debug, Clone, Default)]
pub struct ObjectStat {
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

/// Object storage calls issued by the S3 store / 对象存储调用接口
#[async_trait]
pub trait ObjectClient: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> StoreResult<bool>;

    /// 在指定区域创建存储桶
    async fn make_bucket(&self, bucket: &str, region: &str) -> StoreResult<()>;

    /// 对象不存在时返回 `StoreError::NotFound`
    async fn stat_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectStat>;

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Bytes>;

    /// 将对象内容流式写入 writer
    async fn get_object_to_writer(
        &self,
        bucket: &str,
        key: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> StoreResult<()>;

    /// `size` 为 None 表示长度未知
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        size: Option<u64>,
        content_type: &str,
    ) -> StoreResult<()>;

    async fn remove_object(&self, bucket: &str, key: &str) -> StoreResult<()>;

    /// 非递归时以 `/` 为分隔符，公共前缀也作为键返回
    async fn list_objects(&self, bucket: &str, prefix: &str, recursive: bool) -> StoreResult<Vec<String>>;
}

/// rust-s3 客户端
pub struct RustS3Client {
    endpoint: String,
    region: Region,
    credentials: Credentials,
    path_style: bool,
}

impl RustS3Client {
    /// 创建客户端（不发起网络请求）
    pub fn new(config: &S3Config) -> StoreResult<Self> {
        let endpoint = config.endpoint()?.url();

        let credentials = match config.credentials() {
            Some((access_key, secret_key, token)) => {
                Credentials::new(Some(access_key), Some(secret_key), token, None, None)
            }
            None => Credentials::anonymous(),
        }
        .map_err(|e| StoreError::Connection(format!("创建S3凭证失败: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: endpoint.clone(),
        };

        Ok(Self {
            endpoint,
            region,
            credentials,
            path_style: config.force_path_style,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 创建S3 Bucket句柄
    fn bucket(&self, name: &str) -> StoreResult<Box<Bucket>> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(|e| StoreError::Transport(format!("创建S3 Bucket失败: {}", e)))?;

        let bucket = if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(bucket)
    }
}

/// rust-s3 错误转换，404 视为不存在
fn map_s3_error(op: &str, bucket: &str, key: &str, err: S3Error) -> StoreError {
    match err {
        S3Error::HttpFailWithBody(404, _) => StoreError::NotFound(format!("{}/{}", bucket, key)),
        other => StoreError::Transport(format!("S3 {}失败: {}", op, other)),
    }
}

/// 未启用 fail-on-err 时rust-s3通过状态码返回错误
fn check_status(op: &str, bucket: &str, key: &str, code: u16) -> StoreResult<()> {
    match code {
        200..=299 => Ok(()),
        404 => Err(StoreError::NotFound(format!("{}/{}", bucket, key))),
        _ => Err(StoreError::Transport(format!("S3 {}失败: HTTP {}", op, code))),
    }
}

#[async_trait]
impl ObjectClient for RustS3Client {
    async fn bucket_exists(&self, bucket: &str) -> StoreResult<bool> {
        self.bucket(bucket)?
            .exists()
            .await
            .map_err(|e| map_s3_error("HeadBucket", bucket, "", e))
    }

    async fn make_bucket(&self, bucket: &str, region: &str) -> StoreResult<()> {
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: self.endpoint.clone(),
        };
        let config = BucketConfiguration::default();

        let response = if self.path_style {
            Bucket::create_with_path_style(bucket, region, self.credentials.clone(), config).await
        } else {
            Bucket::create(bucket, region, self.credentials.clone(), config).await
        }
        .map_err(|e| map_s3_error("CreateBucket", bucket, "", e))?;

        if !response.success() {
            return Err(StoreError::Transport(format!(
                "S3 CreateBucket失败: HTTP {}",
                response.response_code
            )));
        }
        Ok(())
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectStat> {
        let (head, code) = self
            .bucket(bucket)?
            .head_object(key)
            .await
            .map_err(|e| map_s3_error("HeadObject", bucket, key, e))?;
        check_status("HeadObject", bucket, key, code)?;

        Ok(ObjectStat {
            size: head.content_length.map(|len| len.max(0) as u64),
            content_type: head.content_type,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<Bytes> {
        let response = self
            .bucket(bucket)?
            .get_object(key)
            .await
            .map_err(|e| map_s3_error("GetObject", bucket, key, e))?;
        check_status("GetObject", bucket, key, response.status_code())?;

        Ok(Bytes::from(response.bytes().to_vec()))
    }

    async fn get_object_to_writer(
        &self,
        bucket: &str,
        key: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> StoreResult<()> {
        let mut sink = writer;
        let code = self
            .bucket(bucket)?
            .get_object_to_writer(key, &mut sink)
            .await
            .map_err(|e| map_s3_error("GetObject", bucket, key, e))?;
        check_status("GetObject", bucket, key, code)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        size: Option<u64>,
        content_type: &str,
    ) -> StoreResult<()> {
        let handle = self.bucket(bucket)?;

        match size {
            Some(size) if size <= SINGLE_PUT_LIMIT => {
                let mut data = Vec::with_capacity(size as usize);
                reader.read_to_end(&mut data).await?;

                let response = handle
                    .put_object_with_content_type(key, &data, content_type)
                    .await
                    .map_err(|e| map_s3_error("PutObject", bucket, key, e))?;
                check_status("PutObject", bucket, key, response.status_code())
            }
            _ => {
                let mut source = reader;
                handle
                    .put_object_stream_with_content_type(&mut source, key, content_type)
                    .await
                    .map_err(|e| map_s3_error("PutObject", bucket, key, e))?;
                Ok(())
            }
        }
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> StoreResult<()> {
        let response = self
            .bucket(bucket)?
            .delete_object(key)
            .await
            .map_err(|e| map_s3_error("DeleteObject", bucket, key, e))?;
        check_status("DeleteObject", bucket, key, response.status_code())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str, recursive: bool) -> StoreResult<Vec<String>> {
        let delimiter = if recursive { None } else { Some("/".to_string()) };

        let results = self
            .bucket(bucket)?
            .list(prefix.to_string(), delimiter)
            .await
            .map_err(|e| map_s3_error("ListObjects", bucket, prefix, e))?;

        let mut names = Vec::new();
        for result in results {
            for obj in result.contents {
                names.push(obj.key);
            }
            // 处理目录（公共前缀）
            for cp in result.common_prefixes.unwrap_or_default() {
                names.push(cp.prefix);
            }
        }
        Ok(names)
    }
}
