use std::path::PathBuf;

use crate::models::TagSet;

/// 单个待上传素材及其派生的上传信息
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// 文件名（同时是页面上条目行的标签文字）
    pub filename: String,
    /// 完整路径
    pub path: PathBuf,
    /// 派生出的标签
    pub tags: TagSet,
}

/// 一个批次：积压队列中连续的一段，由一次上传会话独占
#[derive(Debug, Clone)]
pub struct Batch {
    /// 批次编号（从 1 开始，仅用于日志）
    pub number: usize,
    pub items: Vec<UploadItem>,
}

impl Batch {
    pub fn new(number: usize, items: Vec<UploadItem>) -> Self {
        Self { number, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.items.iter().map(|item| item.path.clone()).collect()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.filename.as_str())
    }
}
