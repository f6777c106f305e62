//! 基础设施层：持有页面资源，只暴露页面操作能力

pub mod chromium_driver;
pub mod ui_driver;

pub use chromium_driver::ChromiumDriver;
pub use ui_driver::{Condition, Target, UiDriver};
