//! 本地保存 - 基础设施层
//!
//! 只负责把二进制内容写到本地，不关心内容是什么

use crate::error::{AppResult, ExportError};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// 本地保存接口
#[async_trait]
pub trait SaveSink: Send + Sync {
    /// 保存文件，返回保存位置
    async fn save(&self, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf>;
}

/// 保存到指定目录
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SaveSink for DirectorySink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
        let path = self.dir.join(file_name);
        let save_failed = |source| ExportError::SaveFailed {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).await.map_err(save_failed)?;
        fs::write(&path, bytes).await.map_err(save_failed)?;

        debug!("已写入 {} 字节: {}", bytes.len(), path.display());
        Ok(path)
    }
}
