//! 日志工具模块
//!
//! 提供日志初始化和批次横幅输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::Batch;
use crate::orchestrator::RunSummary;
use crate::workflow::SessionReport;

/// 初始化日志
///
/// 默认级别为 `info`，可通过 `RUST_LOG` 覆盖。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, pending: usize) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - GIF 批量上传 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📁 素材目录: {}", config.asset_dir.display());
    info!("📄 元数据文件: {}", config.metadata_file);
    info!("📋 待上传: {} 个，每批 {} 个", pending, config.batch_size);
    if !config.collection_name.is_empty() {
        info!("🗂️ 目标合集: {}", config.collection_name);
    }
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch`: 本批次
/// - `remaining`: 本批开始前的积压总数
pub fn log_batch_start(batch: &Batch, remaining: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {} 批: {} 个 / 剩余 {} 个", batch.number, batch.len(), remaining);
    if let (Some(first), Some(last)) = (batch.items.first(), batch.items.last()) {
        info!("📄 本批素材: {} … {}", first.filename, last.filename);
    }
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch: &Batch, report: &SessionReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {} 批完成: 标签 {}/{}，条目行 {}",
        batch.number,
        report.tagged,
        batch.len(),
        report.rows_rendered
    );
    if let Some(signal) = report.completion {
        info!("   完成依据: {}", signal);
    }
    if !report.skipped_phases.is_empty() {
        let phases: Vec<String> = report.skipped_phases.iter().map(|p| p.to_string()).collect();
        info!("   跳过的阶段: {}", phases.join(", "));
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 完成批次: {}", summary.batches);
    info!("✅ 已发布: {}", summary.published);
    info!("{}", "=".repeat(60));
}
