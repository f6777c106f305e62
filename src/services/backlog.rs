//! 积压队列 - 业务能力层
//!
//! 只负责"挑出还没发布的素材并排好顺序"，不缓存任何结果：
//! 每个批次开始前都重新计算。

use std::path::Path;

use crate::models::Metadata;

/// 列出目录中待发布的素材文件名
///
/// 先按文件名排序，过滤掉已发布的，再整体倒序：
/// 时间轴靠后的片段（影片结尾）优先发布。
pub fn select_backlog(
    dir: &Path,
    extensions: &[String],
    metadata: &Metadata,
) -> std::io::Result<Vec<String>> {
    let mut filenames = list_assets(dir, extensions)?;
    filenames.sort();
    filenames.retain(|name| !metadata.get(name).is_some_and(|record| record.is_published()));
    filenames.reverse();
    Ok(filenames)
}

/// 按扩展名（忽略大小写）列出目录下的素材文件
pub fn list_assets(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<String>> {
    let mut filenames = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)));
        if !matches {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            filenames.push(name.to_string());
        }
    }

    Ok(filenames)
}
