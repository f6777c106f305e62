//! 批次处理上下文
//!
//! 封装"我正在处理第几批、这一批有多少个"这一信息，只用于日志

use std::fmt::Display;

/// 批次处理上下文
#[derive(Debug, Clone, Copy)]
pub struct BatchCtx {
    /// 批次编号（从1开始）
    pub batch_number: usize,

    /// 本批素材数量
    pub batch_size: usize,
}

impl BatchCtx {
    pub fn new(batch_number: usize, batch_size: usize) -> Self {
        Self {
            batch_number,
            batch_size,
        }
    }

    /// 条目级日志前缀，例如 `[批次 3] [12/100]`
    pub fn item(&self, index: usize) -> String {
        format!("{} [{}/{}]", self, index + 1, self.batch_size)
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 {}]", self.batch_number)
    }
}
