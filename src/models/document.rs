use crate::error::{AppError, AppResult};
use std::path::Path;
use tokio::fs;

/// 用户选择的简历文件
///
/// 只在"选择 → 提交/清空"之间存在
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub size: usize,
    pub content: Vec<u8>,
    pub media_type: String,
}

impl Document {
    /// 从内存数据创建
    pub fn from_bytes(name: impl Into<String>, content: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: content.len(),
            content,
            media_type: media_type.into(),
        }
    }

    /// 从磁盘读取文件，按扩展名推断媒体类型
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = fs::read(path).await.map_err(|source| AppError::Document {
            path: path.display().to_string(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::from_bytes(name, content, media_type_for(path)))
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("media_type", &self.media_type)
            .finish()
    }
}

/// 根据扩展名推断媒体类型
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
