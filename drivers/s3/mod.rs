//! S3兼容对象存储
//!
//! 支持 AWS S3、MinIO、阿里云OSS 等兼容 S3 协议的服务

mod client;
mod config;
mod driver;
mod factory;
pub mod memory;

pub use client::{ObjectClient, ObjectStat, RustS3Client};
pub use config::{Endpoint, S3Config};
pub use driver::S3Store;
pub use factory::S3StoreFactory;
pub use memory::MemoryClient;
