//! 测试用的页面驱动
//!
//! 按脚本模拟上传页：提交的文件变成条目行，点击发布后开始"上传"，
//! 经过设定时间后出现完成入口。所有操作都记录下来供断言使用。

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::time::Instant;

use gif_upload_bot::config::Config;
use gif_upload_bot::infrastructure::{Target, UiDriver};

/// 页面元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeElement {
    /// 页面级控件
    Control(Target),
    /// 条目行（文件名）
    Row(String),
    /// 条目行内的控件
    InRow(String, Target),
}

/// 页面行为脚本
#[derive(Debug, Clone)]
pub struct Script {
    /// 是否存在批量上传控件
    pub intake_present: bool,
    /// 从第几次会话（从 1 开始）起发布按钮消失
    pub publish_missing_from: Option<usize>,
    /// 点击发布后多久出现完成入口，`None` 表示永不出现
    pub done_after: Option<Duration>,
    /// 页面上存在的合集
    pub collection: Option<String>,
    /// 提交登录后是否仍停留在登录页
    pub login_sticks: bool,
    /// 提交的文件是否渲染成条目行
    pub rows_render: bool,
    /// 不渲染条目行的文件
    pub missing_rows: Vec<String>,
    /// 条目行内没有标签输入框的文件
    pub rows_without_input: Vec<String>,
    /// 输入标签时出错的文件（只输入一半）
    pub failing_rows: Vec<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            intake_present: true,
            publish_missing_from: None,
            done_after: Some(Duration::from_secs(2)),
            collection: None,
            login_sticks: false,
            rows_render: true,
            missing_rows: Vec::new(),
            rows_without_input: Vec::new(),
            failing_rows: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    url: String,
    sessions: usize,
    rows: Vec<String>,
    uploads: Vec<Vec<String>>,
    typed: Vec<(FakeElement, String)>,
    clicked: Vec<FakeElement>,
    selected: Vec<FakeElement>,
    cleared: Vec<FakeElement>,
    published_at: Option<Instant>,
    collection_clicked: bool,
    login_submitted: bool,
}

/// 按脚本运行的假驱动
pub struct FakeDriver {
    script: Script,
    state: Mutex<State>,
}

impl FakeDriver {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            state: Mutex::new(State::default()),
        }
    }

    /// 每次提交的文件名（按提交顺序）
    pub fn uploads(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploads().iter().map(Vec::len).sum()
    }

    /// 输入到某个元素的全部文字
    pub fn typed_into(&self, element: &FakeElement) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .typed
            .iter()
            .filter(|(el, _)| el == element)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn clicked(&self, element: &FakeElement) -> bool {
        self.state.lock().unwrap().clicked.contains(element)
    }

    pub fn selected(&self, element: &FakeElement) -> bool {
        self.state.lock().unwrap().selected.contains(element)
    }

    pub fn cleared(&self, element: &FakeElement) -> bool {
        self.state.lock().unwrap().cleared.contains(element)
    }

    pub fn published_at(&self) -> Option<Instant> {
        self.state.lock().unwrap().published_at
    }

    /// 页面上实际渲染出的条目行
    fn visible_rows(&self, state: &State) -> Vec<String> {
        if !self.script.rows_render {
            return Vec::new();
        }
        state
            .rows
            .iter()
            .filter(|row| !self.script.missing_rows.contains(row))
            .cloned()
            .collect()
    }

    fn publish_available(&self, sessions: usize) -> bool {
        self.script
            .publish_missing_from
            .map_or(true, |from| sessions < from)
    }

    fn done(&self, state: &State) -> bool {
        match (state.published_at, self.script.done_after) {
            (Some(at), Some(after)) => at.elapsed() >= after,
            _ => false,
        }
    }

    fn control_present(&self, state: &State, target: &Target) -> bool {
        match target {
            Target::FileIntake => self.script.intake_present,
            Target::PublishControl => self.publish_available(state.sessions),
            Target::DoneIndicator => self.done(state),
            Target::ProgressIndicator => state.published_at.is_some() && !self.done(state),
            Target::Collection { name } => self.script.collection.as_deref() == Some(name.as_str()),
            Target::CollectionExpander => self.script.collection.is_some(),
            Target::CollectionConfirmed => state.collection_clicked,
            Target::ConsentOverlay => false,
            Target::LoginIdentity | Target::LoginSecret | Target::LoginSubmit => {
                state.url.contains("/login")
            }
            Target::BulkTagInput | Target::BulkTagConfirm => !state.rows.is_empty(),
            Target::ItemRows | Target::ItemRow { .. } => false,
            Target::RowExpander | Target::RowTagInput | Target::RowTagConfirm => false,
        }
    }
}

#[async_trait]
impl UiDriver for FakeDriver {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        if !url.contains("/login") {
            state.sessions += 1;
            state.rows.clear();
            state.published_at = None;
            state.collection_clicked = false;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        if state.login_submitted && !self.script.login_sticks {
            return Ok("https://giphy.com/".to_string());
        }
        Ok(state.url.clone())
    }

    async fn upload_files(&self, paths: &[PathBuf]) -> Result<()> {
        if !self.script.intake_present {
            bail!("未找到批量上传控件");
        }
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let mut state = self.state.lock().unwrap();
        state.rows = names.clone();
        state.uploads.push(names);
        Ok(())
    }

    async fn locate(&self, target: &Target) -> Result<Option<FakeElement>> {
        let state = self.state.lock().unwrap();
        let found = match target {
            Target::ItemRows => self.visible_rows(&state).into_iter().next().map(FakeElement::Row),
            Target::ItemRow { label } => self
                .visible_rows(&state)
                .into_iter()
                .find(|row| row == label)
                .map(FakeElement::Row),
            other => self
                .control_present(&state, other)
                .then(|| FakeElement::Control(other.clone())),
        };
        Ok(found)
    }

    async fn locate_all(&self, target: &Target) -> Result<Vec<FakeElement>> {
        match target {
            Target::ItemRows => {
                let state = self.state.lock().unwrap();
                Ok(self
                    .visible_rows(&state)
                    .into_iter()
                    .map(FakeElement::Row)
                    .collect())
            }
            other => Ok(self.locate(other).await?.into_iter().collect()),
        }
    }

    async fn locate_in(&self, parent: &FakeElement, target: &Target) -> Result<Option<FakeElement>> {
        match (parent, target) {
            (FakeElement::Row(label), Target::RowTagInput)
                if self.script.rows_without_input.contains(label) =>
            {
                Ok(None)
            }
            (
                FakeElement::Row(label),
                Target::RowExpander | Target::RowTagInput | Target::RowTagConfirm,
            ) => Ok(Some(FakeElement::InRow(label.clone(), target.clone()))),
            _ => Ok(None),
        }
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match element {
            FakeElement::Control(Target::PublishControl) => {
                state.published_at = Some(Instant::now());
            }
            FakeElement::Control(Target::Collection { .. }) => state.collection_clicked = true,
            FakeElement::Control(Target::LoginSubmit) => state.login_submitted = true,
            _ => {}
        }
        state.clicked.push(element.clone());
        Ok(())
    }

    async fn type_text(&self, element: &FakeElement, text: &str, _pacing: Duration) -> Result<()> {
        let failing = matches!(
            element,
            FakeElement::InRow(label, Target::RowTagInput) if self.script.failing_rows.contains(label)
        );
        let mut state = self.state.lock().unwrap();
        if failing {
            let partial: String = text.chars().take(text.chars().count() / 2).collect();
            state.typed.push((element.clone(), partial));
            bail!("输入中断");
        }
        state.typed.push((element.clone(), text.to_string()));
        Ok(())
    }

    async fn select_contents(&self, element: &FakeElement) -> Result<()> {
        self.state.lock().unwrap().selected.push(element.clone());
        Ok(())
    }

    async fn clear_text(&self, element: &FakeElement) -> Result<()> {
        self.state.lock().unwrap().cleared.push(element.clone());
        Ok(())
    }

    async fn press_enter(&self, element: &FakeElement) -> Result<()> {
        if *element == FakeElement::Control(Target::LoginSecret) {
            self.state.lock().unwrap().login_submitted = true;
        }
        Ok(())
    }

    async fn scroll_into_view(&self, _element: &FakeElement) -> Result<()> {
        Ok(())
    }
}

/// 在目录中创建空素材文件
pub fn create_assets(dir: &Path, names: impl IntoIterator<Item = String>) {
    for name in names {
        fs::write(dir.join(name), b"GIF89a").unwrap();
    }
}

/// `clip_001.gif` .. `clip_<n>.gif`
pub fn numbered(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("clip_{:03}.gif", i)).collect()
}

/// 指向测试目录的配置，冷却设为 0
pub fn config_for(dir: &Path) -> Config {
    Config {
        asset_dir: dir.to_path_buf(),
        cooldown: Duration::ZERO,
        ..Config::default()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
