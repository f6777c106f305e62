//! 元数据存储 - 业务能力层
//!
//! 只负责"读写元数据文件"能力。元数据文件同时是唯一的进度检查点：
//! 读取失败降级为空映射，写入则整体替换（临时文件 + 重命名）。

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_METADATA_FILE};
use crate::error::MetadataError;
use crate::models::Metadata;

/// 元数据存储
#[derive(Debug, Clone)]
pub struct MetadataStore {
    dir: PathBuf,
    file_name: String,
}

impl MetadataStore {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.asset_dir, &config.metadata_file)
    }

    /// 元数据文件路径（写入目标）
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// 读取元数据
    ///
    /// 文件缺失或损坏时记录警告并返回空映射，不会失败。
    /// 自定义文件名读取失败时回退到默认的 `gifs_metadata.json`。
    pub fn load(&self) -> Metadata {
        let path = self.path();
        match read_metadata(&path) {
            Ok(metadata) => {
                debug!("已加载元数据: {} ({} 条)", path.display(), metadata.len());
                metadata
            }
            Err(e) => {
                warn!("⚠️ 无法加载元数据 {}: {}", self.file_name, e);
                if self.file_name != DEFAULT_METADATA_FILE {
                    let fallback = self.dir.join(DEFAULT_METADATA_FILE);
                    match read_metadata(&fallback) {
                        Ok(metadata) => {
                            info!("已加载备用元数据: {}", fallback.display());
                            return metadata;
                        }
                        Err(e) => warn!("⚠️ 备用元数据 {} 也无法加载: {}", DEFAULT_METADATA_FILE, e),
                    }
                }
                Metadata::new()
            }
        }
    }

    /// 整体写入元数据
    ///
    /// 先写同目录下的临时文件再重命名覆盖，进程在任何时刻被终止，
    /// 磁盘上要么是旧文件，要么是完整的新文件。
    pub fn save(&self, metadata: &Metadata) -> Result<(), MetadataError> {
        let path = self.path();
        let mut json = serde_json::to_string_pretty(metadata)?;
        json.push('\n');

        let write_failed = |source: std::io::Error| MetadataError::WriteFailed {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_failed)?;
        tmp.write_all(json.as_bytes()).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;
        tmp.persist(&path).map_err(|e| write_failed(e.error))?;

        debug!("已保存元数据: {} ({} 条)", path.display(), metadata.len());
        Ok(())
    }

    /// 将一批文件标记为已发布并立即写盘
    ///
    /// 写入前重新读取文件，合并其他工具在会话期间做的修改。
    pub fn mark_published<'a>(
        &self,
        filenames: impl IntoIterator<Item = &'a str>,
    ) -> Result<usize, MetadataError> {
        let mut metadata = self.load();
        let mut count = 0;
        for filename in filenames {
            metadata.entry(filename.to_string()).or_default().mark_published();
            count += 1;
        }
        self.save(&metadata)?;
        Ok(count)
    }
}

fn read_metadata(path: &Path) -> anyhow::Result<Metadata> {
    let raw = std::fs::read_to_string(path)?;
    let metadata = serde_json::from_str(&raw)?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &Path) -> MetadataStore {
        MetadataStore::new(dir, DEFAULT_METADATA_FILE)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(dir.path()).load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_save_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(store.path(), "{ \"clip.gif\": { \"quote\": ").unwrap();

        let mut metadata = store.load();
        assert!(metadata.is_empty());

        metadata.entry("clip.gif".to_string()).or_default().mark_published();
        store.save(&metadata).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw, json!({ "clip.gif": { "giphy_uploaded": true } }));
    }

    #[test]
    fn test_non_object_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(store.path(), "[1, 2, 3]").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_custom_name_falls_back_to_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_METADATA_FILE),
            r#"{ "a.gif": { "quote": "Hi" } }"#,
        )
        .unwrap();

        let store = MetadataStore::new(dir.path(), "gifs_metadata_Heat.json");
        let metadata = store.load();
        assert_eq!(metadata["a.gif"].quote(), Some("Hi"));
        assert_eq!(store.path(), dir.path().join("gifs_metadata_Heat.json"));
    }

    #[test]
    fn test_mark_published_merges_with_disk_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(
            store.path(),
            r#"{ "a.gif": { "description": "Bank heist", "rating": 5 }, "b.gif": {} }"#,
        )
        .unwrap();

        let marked = store.mark_published(["a.gif", "c.gif"]).unwrap();
        assert_eq!(marked, 2);

        let metadata = store.load();
        assert!(metadata["a.gif"].is_published());
        assert_eq!(metadata["a.gif"].description(), Some("Bank heist"));
        assert_eq!(metadata["a.gif"].field("rating"), Some(&json!(5)));
        assert!(!metadata["b.gif"].is_published());
        assert!(metadata["c.gif"].is_published());

        // 没有残留临时文件
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_mistyped_field_does_not_discard_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(
            store.path(),
            r#"{ "a.gif": { "giphy_uploaded": true, "quote": "Keep me" }, "b.gif": { "quote": 42 } }"#,
        )
        .unwrap();

        let metadata = store.load();
        assert_eq!(metadata.len(), 2);
        assert!(metadata["a.gif"].is_published());

        store.mark_published(["b.gif"]).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({
                "a.gif": { "giphy_uploaded": true, "quote": "Keep me" },
                "b.gif": { "quote": 42, "giphy_uploaded": true }
            })
        );
    }
}
