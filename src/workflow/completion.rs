//! 提交后的完成检测
//!
//! 页面在点击发布后可能立刻渲染出短暂的"已完成"假象，所以先无条件等满最短时间，
//! 再在宽限期内让"完成入口出现"和"进度提示消失"两个信号竞速。
//! 宽限期结束仍无信号时按成功处理：无法区分"慢但成功"与"页面改版导致检测失效"，
//! 这是已知的误判风险。

use std::fmt;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::infrastructure::{Condition, Target, UiDriver};
use crate::workflow::BatchCtx;

/// 判定上传结束的依据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSignal {
    /// 出现完成入口
    DoneIndicator,
    /// 进度提示消失
    ProgressCleared,
    /// 宽限期结束，视为成功
    GraceElapsed,
}

impl fmt::Display for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionSignal::DoneIndicator => write!(f, "完成入口出现"),
            CompletionSignal::ProgressCleared => write!(f, "进度提示消失"),
            CompletionSignal::GraceElapsed => write!(f, "宽限期结束"),
        }
    }
}

/// 等待上传完成
///
/// 返回前经过的时间不会少于 `min_wait`。
pub async fn await_completion<D: UiDriver>(
    driver: &D,
    min_wait: Duration,
    grace: Duration,
    ctx: &BatchCtx,
) -> CompletionSignal {
    let started = Instant::now();
    info!(
        "{} ⏳ 等待上传完成（至少 {} 秒）...",
        ctx,
        min_wait.as_secs()
    );

    // 最短等待期间只观察，不允许提前结束
    let early = Condition::Any(vec![
        Condition::Present(Target::DoneIndicator),
        Condition::Present(Target::ProgressIndicator),
    ]);
    match driver.wait_for(&early, min_wait).await {
        Ok(true) => debug!("{} 已出现进度或完成提示", ctx),
        Ok(false) => debug!("{} 最短等待期内未出现进度或完成提示", ctx),
        Err(e) => debug!("{} 检查进度提示失败: {:#}", ctx, e),
    }

    let elapsed = started.elapsed();
    if elapsed < min_wait {
        sleep(min_wait - elapsed).await;
    }

    let done = wait_signal(driver, Condition::Present(Target::DoneIndicator), grace);
    let cleared = wait_signal(driver, Condition::Absent(Target::ProgressIndicator), grace);

    let signal = tokio::select! {
        biased;
        Some(()) = done => CompletionSignal::DoneIndicator,
        Some(()) = cleared => CompletionSignal::ProgressCleared,
        _ = sleep(grace) => CompletionSignal::GraceElapsed,
    };

    match signal {
        CompletionSignal::GraceElapsed => warn!(
            "{} ⚠️ 宽限期 {} 秒内未检测到完成信号，按成功处理（可能误判）",
            ctx,
            grace.as_secs()
        ),
        other => info!("{} ✓ 上传结束: {}", ctx, other),
    }

    signal
}

/// 条件在超时前成立时返回 `Some`
async fn wait_signal<D: UiDriver>(driver: &D, condition: Condition, timeout: Duration) -> Option<()> {
    match driver.wait_for(&condition, timeout).await {
        Ok(true) => Some(()),
        Ok(false) => None,
        Err(e) => {
            debug!("等待 {:?} 失败: {:#}", condition, e);
            None
        }
    }
}
