//! 页面操作能力 - 基础设施层
//!
//! 上层只用 [`Target`] 描述"要找页面上的哪个东西"，具体选择器由驱动实现决定。
//! 所有调用都可能失败或超时，调用方按阶段自行决定是否可以容忍。

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::{sleep, Instant};

/// 页面上的可定位目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// 登录页：用户名输入框
    LoginIdentity,
    /// 登录页：密码输入框
    LoginSecret,
    /// 登录页：登录按钮
    LoginSubmit,
    /// 批量文件上传控件
    FileIntake,
    /// 任意一个已渲染的条目行
    ItemRows,
    /// 标签文字与文件名完全一致的条目行
    ItemRow { label: String },
    /// 条目行内：展开按钮
    RowExpander,
    /// 条目行内：标签输入框
    RowTagInput,
    /// 条目行内：确认标签按钮
    RowTagConfirm,
    /// "Add Info" 区域的标签输入框（作用于整批）
    BulkTagInput,
    /// "Add Info" 区域的确认按钮
    BulkTagConfirm,
    /// 名称匹配的合集
    Collection { name: String },
    /// 展开合集列表
    CollectionExpander,
    /// 合集已选中的提示
    CollectionConfirmed,
    /// 同意条款的浮层按钮
    ConsentOverlay,
    /// 最终发布按钮
    PublishControl,
    /// 上传完成后的结果入口
    DoneIndicator,
    /// 上传进度提示
    ProgressIndicator,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::ItemRow { label } => write!(f, "条目行「{}」", label),
            Target::Collection { name } => write!(f, "合集「{}」", name),
            other => write!(f, "{:?}", other),
        }
    }
}

/// 等待条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Present(Target),
    Absent(Target),
    CountAtLeast(Target, usize),
    Any(Vec<Condition>),
}

/// 页面操作能力
///
/// 职责：
/// - 持有页面资源
/// - 把 [`Target`] 翻译成具体的元素查找
/// - 不认识批次 / 素材
#[async_trait]
pub trait UiDriver: Send + Sync {
    type Element: Send + Sync;

    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// 把文件交给批量上传控件，控件不存在时返回错误
    async fn upload_files(&self, paths: &[PathBuf]) -> Result<()>;

    async fn locate(&self, target: &Target) -> Result<Option<Self::Element>>;

    async fn locate_all(&self, target: &Target) -> Result<Vec<Self::Element>>;

    /// 在某个元素内部查找（条目行内的控件）
    async fn locate_in(&self, parent: &Self::Element, target: &Target)
        -> Result<Option<Self::Element>>;

    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// 逐字符输入，每个字符之间间隔 `pacing`
    async fn type_text(&self, element: &Self::Element, text: &str, pacing: Duration) -> Result<()>;

    /// 在元素上按回车
    async fn press_enter(&self, element: &Self::Element) -> Result<()>;

    /// 选中输入框中已有的文字，之后的输入会覆盖它
    async fn select_contents(&self, element: &Self::Element) -> Result<()>;

    /// 清空输入框
    async fn clear_text(&self, element: &Self::Element) -> Result<()>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()>;

    /// 立即检查一次条件
    async fn check(&self, condition: &Condition) -> Result<bool> {
        match condition {
            Condition::Present(target) => Ok(self.locate(target).await?.is_some()),
            Condition::Absent(target) => Ok(self.locate(target).await?.is_none()),
            Condition::CountAtLeast(target, n) => Ok(self.locate_all(target).await?.len() >= *n),
            Condition::Any(conditions) => {
                for condition in conditions {
                    if self.check(condition).await? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// 轮询等待条件成立，超时返回 `false`
    async fn wait_for(&self, condition: &Condition, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.check(condition).await? {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            sleep(self.poll_interval().min(deadline - now)).await;
        }
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(250)
    }
}
