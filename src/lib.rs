//! # GIF Upload Bot
//!
//! 通过浏览器自动化，把本地 GIF 按批次上传到只有网页界面的 GIPHY
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `UiDriver` - 页面操作能力（定位 / 点击 / 输入 / 等待）
//! - `ChromiumDriver` - 唯一的 page owner，负责选择器
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个素材
//! - `MetadataStore` - 读写元数据文件（同时是进度检查点）
//! - `tag_builder` - 从元数据和文件名派生标签
//! - `backlog` - 计算待上传队列
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一批素材"的完整上传流程
//! - `BatchCtx` - 上下文封装（批次编号 + 批次大小）
//! - `UploadSession` - 流程编排（提交 → 标签 → 合集 → 发布 → 等待完成）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/scheduler` - 批次调度器，断点续传主循环
//! - `orchestrator/app` - 浏览器、登录和资源生命周期
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::{Config, Credentials};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromiumDriver, UiDriver};
pub use models::{AssetRecord, Batch, Metadata, TagSet};
pub use orchestrator::{App, BatchScheduler, RunSummary};
pub use workflow::{BatchCtx, Phase, SessionReport, UploadSession};
