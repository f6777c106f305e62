//! 上传会话 - 流程层
//!
//! 核心职责：定义"一批素材"的完整上传流程
//!
//! 阶段顺序：
//! 1. 打开上传页
//! 2. 提交文件并等待条目渲染
//! 3. 填写整批默认标签
//! 4. 选择合集
//! 5. 逐个条目填写标签
//! 6. 上传前重新确认合集
//! 7. 点击发布
//! 8. 等待上传完成
//!
//! 每个阶段失败时怎么办由 [`Phase::on_failure`] 声明：可跳过的阶段只记录日志，
//! 不可恢复的阶段中止整个会话，本批次不记录进度。

use std::fmt;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{split_list, Config};
use crate::error::SessionError;
use crate::infrastructure::{Condition, Target, UiDriver};
use crate::models::{Batch, UploadItem};
use crate::workflow::completion::{await_completion, CompletionSignal};
use crate::workflow::BatchCtx;

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Navigate,
    SubmitFiles,
    DefaultTags,
    SelectCollection,
    TagItems,
    ConfirmCollection,
    Publish,
    AwaitCompletion,
}

/// 阶段失败时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// 记录日志，继续下一阶段
    Skip,
    /// 中止会话
    Abort,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::Navigate,
        Phase::SubmitFiles,
        Phase::DefaultTags,
        Phase::SelectCollection,
        Phase::TagItems,
        Phase::ConfirmCollection,
        Phase::Publish,
        Phase::AwaitCompletion,
    ];

    pub fn on_failure(self) -> FailurePolicy {
        match self {
            Phase::Navigate | Phase::SubmitFiles | Phase::Publish => FailurePolicy::Abort,
            Phase::DefaultTags
            | Phase::SelectCollection
            | Phase::TagItems
            | Phase::ConfirmCollection
            | Phase::AwaitCompletion => FailurePolicy::Skip,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Navigate => "打开上传页",
            Phase::SubmitFiles => "提交文件",
            Phase::DefaultTags => "默认标签",
            Phase::SelectCollection => "选择合集",
            Phase::TagItems => "条目标签",
            Phase::ConfirmCollection => "确认合集",
            Phase::Publish => "发布",
            Phase::AwaitCompletion => "等待完成",
        };
        f.write_str(name)
    }
}

/// 会话结果统计
#[derive(Debug, Default, Clone)]
pub struct SessionReport {
    /// 渲染出的条目行数量
    pub rows_rendered: usize,
    /// 成功填写标签的条目数
    pub tagged: usize,
    /// 没有标签、找不到条目行或填写失败而跳过的条目数
    pub untagged: usize,
    /// 合集是否在发布前得到确认
    pub collection_confirmed: bool,
    /// 判定上传结束的依据
    pub completion: Option<CompletionSignal>,
    /// 失败后被跳过的阶段
    pub skipped_phases: Vec<Phase>,
}

/// 上传会话
///
/// - 一次会话只处理一个批次
/// - 不读写元数据文件，进度由调度层负责
pub struct UploadSession<'a, D: UiDriver> {
    driver: &'a D,
    config: &'a Config,
}

impl<'a, D: UiDriver> UploadSession<'a, D> {
    pub fn new(driver: &'a D, config: &'a Config) -> Self {
        Self { driver, config }
    }

    /// 执行整批上传
    pub async fn run(&self, batch: &Batch) -> Result<SessionReport, SessionError> {
        let ctx = BatchCtx::new(batch.number, batch.len());
        let mut report = SessionReport::default();
        if batch.is_empty() {
            info!("{} 空批次，无需上传", ctx);
            return Ok(report);
        }

        for phase in Phase::ALL {
            if let Err(e) = self.run_phase(phase, batch, &ctx, &mut report).await {
                match phase.on_failure() {
                    FailurePolicy::Skip => {
                        warn!("{} ⚠️ 阶段「{}」失败，跳过: {:#}", ctx, phase, e);
                        report.skipped_phases.push(phase);
                    }
                    FailurePolicy::Abort => {
                        error!("{} ❌ 阶段「{}」失败，中止本批次: {:#}", ctx, phase, e);
                        return Err(SessionError::aborted(batch.number, phase, e));
                    }
                }
            }
        }

        Ok(report)
    }

    async fn run_phase(
        &self,
        phase: Phase,
        batch: &Batch,
        ctx: &BatchCtx,
        report: &mut SessionReport,
    ) -> Result<()> {
        match phase {
            Phase::Navigate => {
                info!("{} 正在打开上传页: {}", ctx, self.config.upload_url);
                self.driver.navigate(&self.config.upload_url).await
            }
            Phase::SubmitFiles => {
                report.rows_rendered = self.submit_files(batch, ctx).await?;
                Ok(())
            }
            Phase::DefaultTags => self.apply_default_tags(ctx).await,
            Phase::SelectCollection => self.select_collection(ctx).await,
            Phase::TagItems => {
                let (tagged, untagged) = self.tag_items(batch, ctx).await;
                report.tagged = tagged;
                report.untagged = untagged;
                Ok(())
            }
            Phase::ConfirmCollection => {
                report.collection_confirmed = self.confirm_collection(ctx).await;
                Ok(())
            }
            Phase::Publish => self.publish(ctx).await,
            Phase::AwaitCompletion => {
                let timings = &self.config.timings;
                let signal = await_completion(
                    self.driver,
                    timings.min_completion_wait,
                    timings.completion_grace,
                    ctx,
                )
                .await;
                report.completion = Some(signal);
                Ok(())
            }
        }
    }

    /// 提交文件，返回渲染出的条目行数量
    async fn submit_files(&self, batch: &Batch, ctx: &BatchCtx) -> Result<usize> {
        let timings = &self.config.timings;

        info!("{} 📤 提交 {} 个文件...", ctx, batch.len());
        self.driver.upload_files(&batch.paths()).await?;

        sleep(timings.settle).await;

        let expected = batch.len().min(self.config.render_cap);
        let rendered = self
            .driver
            .wait_for(
                &Condition::CountAtLeast(Target::ItemRows, expected),
                timings.render_timeout,
            )
            .await
            .unwrap_or(false);
        if !rendered {
            warn!(
                "{} ⚠️ {} 秒内未渲染出 {} 个条目行，继续处理",
                ctx,
                timings.render_timeout.as_secs(),
                expected
            );
        }

        // 条目行数量只用于统计，查询失败不影响后续阶段
        let rows = self
            .driver
            .locate_all(&Target::ItemRows)
            .await
            .map(|rows| rows.len())
            .unwrap_or_default();
        info!("{} ✓ 页面上共有 {} 个条目行", ctx, rows);
        Ok(rows)
    }

    /// 在 "Add Info" 区域逐个输入默认标签（整批生效）
    async fn apply_default_tags(&self, ctx: &BatchCtx) -> Result<()> {
        let timings = &self.config.timings;
        let tokens: Vec<&str> = split_list(&self.config.default_tags).collect();
        if tokens.is_empty() {
            info!("{} 未配置默认标签，跳过", ctx);
            return Ok(());
        }

        let Some(input) = self.driver.locate(&Target::BulkTagInput).await? else {
            info!("{} 未找到默认标签输入框，跳过", ctx);
            return Ok(());
        };

        self.driver.click(&input).await?;
        sleep(Duration::from_millis(200)).await;

        // 页面对输入节奏敏感，每个标签之间停顿
        for (i, token) in tokens.iter().enumerate() {
            self.driver
                .type_text(&input, token, timings.bulk_keystroke_delay)
                .await?;
            sleep(timings.token_pause).await;

            if i + 1 < tokens.len() {
                self.driver
                    .type_text(&input, ", ", timings.bulk_keystroke_delay)
                    .await?;
                sleep(timings.token_pause).await;
            }
        }

        sleep(Duration::from_millis(300)).await;
        match self.driver.locate(&Target::BulkTagConfirm).await? {
            Some(confirm) => self.driver.click(&confirm).await?,
            None => self.driver.press_enter(&input).await?,
        }
        sleep(timings.bulk_confirm_pause).await;

        info!("{} ✓ 已添加默认标签: {}", ctx, tokens.join(", "));
        Ok(())
    }

    async fn select_collection(&self, ctx: &BatchCtx) -> Result<()> {
        let name = self.config.collection_name.as_str();
        if name.is_empty() {
            info!("{} 未配置合集，跳过", ctx);
            return Ok(());
        }

        info!("{} 选择合集: {}", ctx, name);
        if self.click_collection(name).await? {
            info!("{} ✓ 已选择合集", ctx);
        } else {
            warn!("{} ⚠️ 未找到合集「{}」，跳过", ctx, name);
        }
        Ok(())
    }

    /// 点击名称匹配的合集；不可见时先展开合集列表再找一次
    async fn click_collection(&self, name: &str) -> Result<bool> {
        let target = Target::Collection {
            name: name.to_string(),
        };

        let mut entry = self.driver.locate(&target).await?;
        if entry.is_none() {
            if let Some(expander) = self.driver.locate(&Target::CollectionExpander).await? {
                self.driver.click(&expander).await?;
                sleep(Duration::from_millis(800)).await;
                entry = self.driver.locate(&target).await?;
            }
        }

        let Some(entry) = entry else {
            return Ok(false);
        };

        self.driver.scroll_into_view(&entry).await?;
        sleep(Duration::from_millis(300)).await;
        self.driver.click(&entry).await?;
        sleep(Duration::from_millis(800)).await;
        Ok(true)
    }

    /// 逐个条目填写标签，返回 (成功数, 跳过数)
    ///
    /// 单个条目的任何失败都只影响它自己。
    async fn tag_items(&self, batch: &Batch, ctx: &BatchCtx) -> (usize, usize) {
        let mut tagged = 0;
        let mut untagged = 0;

        for (index, item) in batch.items.iter().enumerate() {
            let prefix = ctx.item(index);

            if item.tags.is_empty() {
                info!("{} {} 没有可用标签，跳过", prefix, item.filename);
                untagged += 1;
                continue;
            }

            match self.tag_item(index, item, &prefix).await {
                Ok(true) => {
                    info!("{} ✓ {} 标签: {}", prefix, item.filename, item.tags);
                    tagged += 1;
                }
                Ok(false) => untagged += 1,
                Err(e) => {
                    warn!("{} ⚠️ {} 填写标签失败: {:#}", prefix, item.filename, e);
                    untagged += 1;
                }
            }
        }

        info!(
            "{} 条目标签完成: 成功 {}, 跳过 {}",
            ctx, tagged, untagged
        );
        (tagged, untagged)
    }

    async fn tag_item(&self, index: usize, item: &UploadItem, prefix: &str) -> Result<bool> {
        let Some(row) = self
            .driver
            .locate(&Target::ItemRow {
                label: item.filename.clone(),
            })
            .await?
        else {
            info!("{} 未找到 {} 对应的条目行，跳过", prefix, item.filename);
            return Ok(false);
        };

        self.driver.scroll_into_view(&row).await?;
        sleep(Duration::from_millis(400)).await;

        // 第一个条目页面会自动展开
        if index > 0 {
            match self.driver.locate_in(&row, &Target::RowExpander).await? {
                Some(expander) => self.driver.click(&expander).await?,
                None => self.driver.click(&row).await?,
            }
        }
        sleep(Duration::from_millis(600)).await;

        let Some(input) = self
            .locate_in_row(&row, &Target::RowTagInput, Duration::from_secs(3))
            .await?
        else {
            info!("{} 未找到 {} 的标签输入框，跳过", prefix, item.filename);
            return Ok(false);
        };

        self.driver.scroll_into_view(&input).await?;
        sleep(Duration::from_millis(300)).await;

        // 选中已有文字，输入会整体覆盖
        self.driver.click(&input).await?;
        self.driver.select_contents(&input).await?;
        sleep(Duration::from_millis(200)).await;

        if let Err(e) = self.type_and_confirm(&row, &input, item).await {
            // 清掉输入了一半的标签
            if let Err(clear_err) = self.driver.clear_text(&input).await {
                debug!("{} 清空标签输入框失败: {:#}", prefix, clear_err);
            }
            return Err(e);
        }

        Ok(true)
    }

    async fn type_and_confirm(
        &self,
        row: &D::Element,
        input: &D::Element,
        item: &UploadItem,
    ) -> Result<()> {
        self.driver
            .type_text(input, &item.tags.joined(), self.config.timings.row_keystroke_delay)
            .await?;
        sleep(Duration::from_secs(2)).await;

        match self.driver.locate_in(row, &Target::RowTagConfirm).await? {
            Some(confirm) => self.driver.click(&confirm).await?,
            None => self.driver.press_enter(input).await?,
        }
        sleep(Duration::from_millis(300)).await;
        Ok(())
    }

    /// 在条目行内查找，找不到时短暂轮询
    async fn locate_in_row(
        &self,
        row: &D::Element,
        target: &Target,
        timeout: Duration,
    ) -> Result<Option<D::Element>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.driver.locate_in(row, target).await? {
                return Ok(Some(element));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(self.config.timings.poll_interval).await;
        }
    }

    /// 发布前重新点选合集，直到页面给出确认提示或用完尝试次数
    async fn confirm_collection(&self, ctx: &BatchCtx) -> bool {
        let name = self.config.collection_name.as_str();
        if name.is_empty() {
            return false;
        }

        let timings = &self.config.timings;
        let attempts = timings.collection_attempts;
        info!("{} 上传前重新确认合集: {}", ctx, name);

        for attempt in 1..=attempts {
            match self.click_collection(name).await {
                Ok(true) => {
                    let confirmed = self
                        .driver
                        .check(&Condition::Present(Target::CollectionConfirmed))
                        .await
                        .unwrap_or(false);
                    if confirmed {
                        info!("{} ✓ 合集已确认", ctx);
                        return true;
                    }
                }
                Ok(false) => {}
                Err(e) => warn!("{} ⚠️ 点选合集出错: {:#}", ctx, e),
            }

            info!(
                "{} 合集尚未确认 (尝试 {}/{})，稍后重试...",
                ctx, attempt, attempts
            );
            sleep(timings.collection_retry_delay).await;
        }

        warn!("{} ⚠️ 发布前未能确认合集，沿用之前的选择继续", ctx);
        false
    }

    /// 点击发布；找不到发布按钮说明页面没有进入预期状态
    async fn publish(&self, ctx: &BatchCtx) -> Result<()> {
        if let Some(consent) = self.driver.locate(&Target::ConsentOverlay).await? {
            info!("{} 关闭同意条款浮层", ctx);
            self.driver.click(&consent).await?;
            sleep(Duration::from_secs(3)).await;
        }

        let Some(button) = self.driver.locate(&Target::PublishControl).await? else {
            bail!("未找到发布按钮");
        };

        info!("{} 📤 点击发布...", ctx);
        self.driver.click(&button).await?;
        Ok(())
    }
}
