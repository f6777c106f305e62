//! Chromium 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，把 [`Target`] 翻译成上传页面上的 CSS / XPath 选择器。
//! 页面改版时只需要修改这里的选择器表。

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::debug;

use crate::infrastructure::ui_driver::{Condition, Target, UiDriver};

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// 选择器
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Css(String),
    XPath(String),
}

/// Chromium 页面驱动
pub struct ChromiumDriver {
    page: Page,
    intake_timeout: Duration,
    poll_interval: Duration,
}

impl ChromiumDriver {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            intake_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
        }
    }

    /// 设置等待文件上传控件出现的超时
    pub fn with_intake_timeout(mut self, timeout: Duration) -> Self {
        self.intake_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[async_trait]
impl UiDriver for ChromiumDriver {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn upload_files(&self, paths: &[PathBuf]) -> Result<()> {
        let found = self
            .wait_for(&Condition::Present(Target::FileIntake), self.intake_timeout)
            .await?;
        let input = match (found, self.locate(&Target::FileIntake).await?) {
            (true, Some(input)) => input,
            _ => bail!("未找到批量上传控件"),
        };

        let files = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        let mut params = SetFileInputFilesParams::new(files);
        params.backend_node_id = Some(input.backend_node_id);
        self.page.execute(params).await?;
        Ok(())
    }

    async fn locate(&self, target: &Target) -> Result<Option<Element>> {
        Ok(self.locate_all(target).await?.into_iter().next())
    }

    async fn locate_all(&self, target: &Target) -> Result<Vec<Element>> {
        let elements = match selector_for(target) {
            Selector::Css(css) => self.page.find_elements(css).await,
            Selector::XPath(xpath) => self.page.find_xpaths(xpath).await,
        };
        // 查不到元素时 CDP 可能返回错误，这里统一视为空
        Ok(elements.unwrap_or_default())
    }

    async fn locate_in(&self, parent: &Element, target: &Target) -> Result<Option<Element>> {
        match selector_for(target) {
            Selector::Css(css) => Ok(parent
                .find_elements(css)
                .await
                .unwrap_or_default()
                .into_iter()
                .next()),
            Selector::XPath(_) => bail!("{} 不支持在元素内查找", target),
        }
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element.click().await?;
        Ok(())
    }

    async fn type_text(&self, element: &Element, text: &str, pacing: Duration) -> Result<()> {
        if pacing.is_zero() {
            element.type_str(text).await?;
            return Ok(());
        }
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            element.type_str(ch.encode_utf8(&mut buf)).await?;
            sleep(pacing).await;
        }
        Ok(())
    }

    async fn press_enter(&self, element: &Element) -> Result<()> {
        element.press_key("Enter").await?;
        Ok(())
    }

    async fn select_contents(&self, element: &Element) -> Result<()> {
        element
            .call_js_fn("function() { this.focus(); this.select(); }", false)
            .await?;
        Ok(())
    }

    async fn clear_text(&self, element: &Element) -> Result<()> {
        self.select_contents(element).await?;
        element.press_key("Backspace").await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<()> {
        element.scroll_into_view().await?;
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// 目标 → 选择器
pub fn selector_for(target: &Target) -> Selector {
    let css = |s: &str| Selector::Css(s.to_string());
    let collection_scope = "//div[contains(@class,'Collections-sc-1pr7xpd')]";

    match target {
        Target::LoginIdentity => css(r#"input[name="email"]"#),
        Target::LoginSecret => css(r#"input[name="password"]"#),
        Target::LoginSubmit => Selector::XPath(
            "//button[@type='submit' or contains(., 'Log In') or contains(., 'Log in')]".to_string(),
        ),
        Target::FileIntake => css(r#"input[type="file"][multiple]"#),
        Target::ItemRows => css("div.Item-sc-glenzl"),
        Target::ItemRow { label } => Selector::XPath(format!(
            "//span[contains(@class,\"Label-sc-12y1hkg\") and normalize-space(text())={}]\
             /ancestor::div[contains(@class,\"Container-sc-7cfcqn\")]",
            xpath_literal(label)
        )),
        Target::RowExpander => {
            css("div.ToolButton-sc-3ci5mj, div.ArrowButton-sc-mxmmvb, i.ss-navigatedown")
        }
        Target::RowTagInput => css(r#"input[placeholder*="Add tags" i], input.Input-sc-xhq6df"#),
        Target::RowTagConfirm => css("button.Button-sc-oi7m9l, button.Button-sc-1dyozow"),
        Target::BulkTagInput => Selector::XPath(format!(
            "//div[normalize-space(.)=\"Add Info\"]/../..//input[translate(@placeholder,'{}','{}')='add tags']",
            UPPER, LOWER
        )),
        Target::BulkTagConfirm => Selector::XPath(
            "//div[contains(@class,'Title-sc-dtewrf') and contains(., 'Add Info')]\
             /ancestor::div[contains(@class,'GridBlock-sc-15c4h63')]//button[contains(@class,'Button-sc-oi7m9l')]"
                .to_string(),
        ),
        Target::Collection { name } => Selector::XPath(format!(
            "{}//img[contains(@class,'ItemGif-sc-1q271fd') and ../div[contains(@class,'ItemText')]/a[contains(text(), {})]]",
            collection_scope,
            xpath_literal(name)
        )),
        Target::CollectionExpander => Selector::XPath(format!(
            "{}//div[contains(text(),'Add to Collection')]",
            collection_scope
        )),
        Target::CollectionConfirmed => Selector::XPath(format!(
            "//div[contains(@class,'ElipisisOverflow-sc-1635sfj') and contains(translate(normalize-space(.), '{}', '{}'), 'adding to')]",
            UPPER, LOWER
        )),
        Target::ConsentOverlay => css("#didomi-notice-agree-button"),
        Target::PublishControl => Selector::XPath(
            "//div[contains(@class,'Button-sc-fko3q9') and contains(., 'Upload to GIPHY')]".to_string(),
        ),
        Target::DoneIndicator => css(
            r#"a.GradientBlock-sc-mtbfu0.GradientButton-sc-o939k5.Button-sc-fko3q9[href*="channel"]"#,
        ),
        Target::ProgressIndicator => Selector::XPath(
            "//span[starts-with(normalize-space(.), 'Uploading') and contains(., ' of ')]".to_string(),
        ),
    }
}

/// 把任意文本转成 XPath 字符串字面量（处理单引号）
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    format!("concat('{}')", text.split('\'').collect::<Vec<_>>().join("', \"'\", '"))
}
