//! 批次调度器 - 编排层
//!
//! ## 职责
//!
//! 反复执行"读元数据 → 算积压 → 取一批 → 上传 → 记录进度 → 冷却"，
//! 直到积压清空。
//!
//! ## 断点续传
//!
//! - 元数据文件是唯一的进度记录，调度器本身不保存任何状态
//! - 只有会话成功返回后才标记本批为已发布
//! - 会话中止时直接返回错误，本批次下次运行会原样重试

use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::UiDriver;
use crate::models::{Batch, Metadata, UploadItem};
use crate::services::{build_tags, select_backlog, MetadataStore};
use crate::utils::logging;
use crate::workflow::UploadSession;

/// 整次运行的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 成功完成的批次数
    pub batches: usize,
    /// 标记为已发布的素材数
    pub published: usize,
}

/// 批次调度器
pub struct BatchScheduler<'a, D: UiDriver> {
    driver: &'a D,
    config: &'a Config,
    store: MetadataStore,
}

impl<'a, D: UiDriver> BatchScheduler<'a, D> {
    pub fn new(driver: &'a D, config: &'a Config) -> Self {
        Self {
            driver,
            config,
            store: MetadataStore::from_config(config),
        }
    }

    /// 运行直到积压清空
    ///
    /// 会话中止时返回 [`AppError::Session`]，已完成批次的进度保留在元数据文件中。
    pub async fn run(&self) -> AppResult<RunSummary> {
        let mut summary = RunSummary::default();
        let session = UploadSession::new(self.driver, self.config);

        loop {
            let metadata = self.store.load();
            let backlog = self.backlog(&metadata)?;
            if backlog.is_empty() {
                info!("✓ 没有待上传的素材");
                break;
            }

            let take = backlog.len().min(self.config.batch_size);
            let batch = self.build_batch(summary.batches + 1, &backlog[..take], &metadata);
            logging::log_batch_start(&batch, backlog.len());

            let report = session.run(&batch).await?;

            let published = self.store.mark_published(batch.filenames())?;
            summary.batches += 1;
            summary.published += published;
            logging::log_batch_complete(&batch, &report);

            // 重新计算，确认是否还有剩余
            let remaining = self.backlog(&self.store.load())?.len();
            if remaining == 0 {
                break;
            }

            info!("📋 剩余 {} 个素材待上传", remaining);
            self.cooldown().await;
        }

        Ok(summary)
    }

    fn backlog(&self, metadata: &Metadata) -> AppResult<Vec<String>> {
        select_backlog(&self.config.asset_dir, &self.config.extensions, metadata).map_err(
            |source| AppError::Scan {
                path: self.config.asset_dir.clone(),
                source,
            },
        )
    }

    fn build_batch(&self, number: usize, filenames: &[String], metadata: &Metadata) -> Batch {
        let items = filenames
            .iter()
            .map(|filename| {
                let record = metadata.get(filename).cloned().unwrap_or_default();
                UploadItem {
                    filename: filename.clone(),
                    path: self.config.asset_dir.join(filename),
                    tags: build_tags(filename, &record, &self.config.default_tags),
                }
            })
            .collect();
        Batch::new(number, items)
    }

    /// 批次之间的冷却，每分钟输出一次剩余时间
    async fn cooldown(&self) {
        let total = self.config.cooldown;
        if total.is_zero() {
            return;
        }

        let minutes = total.as_secs().div_ceil(60);
        info!("⏸️ 冷却 {} 分钟后开始下一批...", minutes);

        let mut remaining = total;
        while !remaining.is_zero() {
            let step = remaining.min(Duration::from_secs(60));
            sleep(step).await;
            remaining -= step;
            if !remaining.is_zero() {
                info!("   冷却中，还剩 {} 分钟", remaining.as_secs().div_ceil(60));
            }
        }
    }
}

/// 统计待上传数量，用于启动前判断是否有事可做
pub fn pending_count(config: &Config) -> AppResult<usize> {
    let metadata = MetadataStore::from_config(config).load();
    count_in(&config.asset_dir, &config.extensions, &metadata)
}

fn count_in(dir: &Path, extensions: &[String], metadata: &Metadata) -> AppResult<usize> {
    select_backlog(dir, extensions, metadata)
        .map(|backlog| backlog.len())
        .map_err(|source| AppError::Scan {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_pending_count_skips_published() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.gif", "b.gif", "c.gif", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::write(
            dir.path().join("gifs_metadata.json"),
            r#"{"b.gif": {"giphy_uploaded": true}}"#,
        )
        .unwrap();

        let config = Config {
            asset_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        assert_eq!(pending_count(&config).unwrap(), 2);
    }

    #[test]
    fn test_pending_count_missing_dir_is_scan_error() {
        let config = Config {
            asset_dir: "/nonexistent/gif/output".into(),
            ..Config::default()
        };
        assert!(matches!(pending_count(&config), Err(AppError::Scan { .. })));
    }
}
