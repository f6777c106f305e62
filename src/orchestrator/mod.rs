//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批次调度和应用生命周期，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用生命周期
//! - 连接或启动浏览器
//! - 登录
//! - 持有 Browser 和页面驱动
//!
//! ### `scheduler` - 批次调度器
//! - 每批开始前重新读取元数据、重新计算积压
//! - 为每个素材派生标签，组装批次
//! - 会话成功后立即写盘记录进度
//! - 批次之间冷却
//!
//! ## 层次关系
//!
//! ```text
//! app (浏览器 + 登录)
//!     ↓
//! scheduler (处理整个积压队列)
//!     ↓
//! workflow::UploadSession (处理单个批次)
//!     ↓
//! services (能力层：metadata / tags / backlog)
//!     ↓
//! infrastructure (基础设施：UiDriver)
//! ```

pub mod app;
pub mod scheduler;

// 重新导出主要类型
pub use app::App;
pub use scheduler::{pending_count, BatchScheduler, RunSummary};
