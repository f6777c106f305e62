//! 浏览器启动与登录

pub mod connection;
pub mod launch;
pub mod login;

pub use connection::connect_to_browser_and_page;
pub use launch::launch_browser;
pub use login::{sign_in, sign_in_interactive, LoginOutcome};
