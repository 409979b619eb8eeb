//! 会话存储 - 基础设施层
//!
//! 持久化的键值存储，进程重启后仍然可读。
//! 只暴露 put / get / clear 能力，不校验内容。

use crate::error::{AppError, AppResult, StoreError};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// 令牌的存储键
pub const TOKEN_KEY: &str = "token";
/// 上次已知余额的存储键（仅作提示）
pub const CREDITS_HINT_KEY: &str = "credits_hint";

/// 会话存储接口
pub trait SessionStore: Send + Sync {
    /// 写入键值，写入后立即可读
    fn put(&self, key: &str, value: &str) -> AppResult<()>;

    /// 读取键值
    fn get(&self, key: &str) -> Option<String>;

    /// 清空所有键值
    fn clear(&self) -> AppResult<()>;
}

/// 基于 TOML 文件的会话存储
///
/// 打开时读入内存，每次写入都同步落盘
pub struct FileSessionStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// 打开会话文件，文件不存在时视为空存储
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                }
                .into())
            }
        };

        debug!("会话文件已加载: {} ({} 项)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// 打开会话文件，文件损坏时记录警告、删除并以空存储继续
    pub fn open_or_reset(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        match Self::open(path.clone()) {
            Err(AppError::Store(StoreError::Parse { source, .. })) => {
                warn!("⚠️ 会话文件已损坏，将重新登录: {} ({})", path.display(), source);
                match std::fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(source) => {
                        return Err(StoreError::Io {
                            path: path.display().to_string(),
                            source,
                        }
                        .into())
                    }
                }
                Ok(Self {
                    path,
                    entries: Mutex::new(BTreeMap::new()),
                })
            }
            other => other,
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let content = toml::to_string(entries).map_err(StoreError::from)?;
        write_private(&self.path, content.as_bytes()).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

// 文件中保存着令牌，unix 下只允许所有者读写
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        let mut file = options.open(path)?;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        file.write_all(content)
    }
    #[cfg(not(unix))]
    {
        options.open(path)?.write_all(content)
    }
}

impl SessionStore for FileSessionStore {
    fn put(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&entries) {
            // 落盘失败时回滚内存，保证内存与文件一致
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn clear(&self) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e).into()),
        }
    }
}

/// 内存存储（测试与临时运行使用）
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn clear(&self) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.toml");

        let store = FileSessionStore::open(&path).unwrap();
        assert_eq!(store.get(TOKEN_KEY), None);
        store.put(TOKEN_KEY, "t1").unwrap();
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("t1"));

        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("t1"));
    }

    #[test]
    fn clear_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");

        let store = FileSessionStore::open(&path).unwrap();
        store.put(TOKEN_KEY, "t1").unwrap();
        store.put(CREDITS_HINT_KEY, "5").unwrap();
        store.clear().unwrap();
        store.clear().unwrap();

        assert_eq!(store.get(TOKEN_KEY), None);
        assert!(!path.exists());
        assert_eq!(FileSessionStore::open(&path).unwrap().get(CREDITS_HINT_KEY), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "token = [unterminated").unwrap();

        let err = FileSessionStore::open(&path).err().unwrap();
        assert!(matches!(err, crate::error::AppError::Store(StoreError::Parse { .. })));
    }

    #[test]
    fn corrupt_file_is_discarded_on_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "token = [unterminated").unwrap();

        let store = FileSessionStore::open_or_reset(&path).unwrap();

        assert_eq!(store.get(TOKEN_KEY), None);
        assert!(!path.exists());
        store.put(TOKEN_KEY, "t2").unwrap();
        assert_eq!(FileSessionStore::open(&path).unwrap().get(TOKEN_KEY).as_deref(), Some("t2"));
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSessionStore::open(&path).unwrap();
        store.put(TOKEN_KEY, "t1").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemorySessionStore::new();
        store.put(TOKEN_KEY, "a").unwrap();
        store.put(TOKEN_KEY, "b").unwrap();
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("b"));
        store.clear().unwrap();
        assert_eq!(store.get(TOKEN_KEY), None);
    }
}
