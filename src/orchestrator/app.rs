//! 应用生命周期 - 编排层
//!
//! ## 职责
//!
//! 1. **浏览器准备**：连接已有浏览器或启动新浏览器
//! 2. **登录**：自动填写凭据，失败时等待人工处理
//! 3. **调度**：把页面驱动交给 [`BatchScheduler`] 直到积压清空
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 Browser 的模块
//! - **向下委托**：批次细节全部交给调度器和上传会话

use anyhow::Result;
use chromiumoxide::Browser;
use tracing::info;

use crate::browser;
use crate::config::{Config, Credentials};
use crate::infrastructure::ChromiumDriver;
use crate::orchestrator::{BatchScheduler, RunSummary};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    driver: ChromiumDriver,
}

impl App {
    /// 初始化应用：准备浏览器并登录
    pub async fn initialize(config: Config, credentials: &Credentials) -> Result<Self> {
        let (browser, page) = match config.browser_debug_port {
            Some(port) => {
                browser::connect_to_browser_and_page(port, Some(&config.login_url), None).await?
            }
            None => browser::launch_browser(&config.login_url).await?,
        };

        let driver = ChromiumDriver::new(page)
            .with_intake_timeout(config.timings.intake_timeout)
            .with_poll_interval(config.timings.poll_interval);

        browser::sign_in_interactive(&driver, &config.login_url, credentials).await?;

        Ok(Self {
            config,
            _browser: browser,
            driver,
        })
    }

    /// 运行直到积压清空
    pub async fn run(&self) -> Result<RunSummary> {
        info!("\n📁 开始上传: {}", self.config.asset_dir.display());

        let summary = BatchScheduler::new(&self.driver, &self.config).run().await?;

        logging::print_final_stats(&summary);
        Ok(summary)
    }
}
