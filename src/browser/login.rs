//! 登录
//!
//! 只用 [`UiDriver`] 的通用能力完成登录，登录失败（密码错误、验证码）时
//! 交给操作员在浏览器里手动处理，按回车后继续。

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Credentials;
use crate::infrastructure::{Condition, Target, UiDriver};

const FIELD_TIMEOUT: Duration = Duration::from_secs(15);
const REDIRECT_TIMEOUT: Duration = Duration::from_secs(20);
const KEYSTROKE_DELAY: Duration = Duration::from_millis(20);

/// 登录结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// 自动登录成功
    SignedIn,
    /// 自动登录未离开登录页，需要人工介入
    NeedsOperator,
}

/// 填写并提交登录表单，等待页面离开登录页
pub async fn sign_in<D: UiDriver>(
    driver: &D,
    login_url: &str,
    credentials: &Credentials,
) -> Result<LoginOutcome> {
    info!("🔑 正在登录: {}", login_url);
    driver.navigate(login_url).await?;

    if !driver
        .wait_for(&Condition::Present(Target::LoginIdentity), FIELD_TIMEOUT)
        .await?
    {
        warn!("⚠️ {} 秒内未出现登录表单", FIELD_TIMEOUT.as_secs());
        return Ok(LoginOutcome::NeedsOperator);
    }

    let identity = driver
        .locate(&Target::LoginIdentity)
        .await?
        .context("登录表单缺少用户名输入框")?;
    driver.click(&identity).await?;
    driver
        .type_text(&identity, &credentials.identity, KEYSTROKE_DELAY)
        .await?;

    let secret = driver
        .locate(&Target::LoginSecret)
        .await?
        .context("登录表单缺少密码输入框")?;
    driver.click(&secret).await?;
    driver
        .type_text(&secret, &credentials.secret, KEYSTROKE_DELAY)
        .await?;
    sleep(Duration::from_millis(500)).await;

    match driver.locate(&Target::LoginSubmit).await? {
        Some(submit) => driver.click(&submit).await?,
        None => driver.press_enter(&secret).await?,
    }

    if left_login_page(driver, login_url, REDIRECT_TIMEOUT).await? {
        info!("✓ 登录成功");
        Ok(LoginOutcome::SignedIn)
    } else {
        Ok(LoginOutcome::NeedsOperator)
    }
}

/// 登录并在需要时等待操作员手动完成
pub async fn sign_in_interactive<D: UiDriver>(
    driver: &D,
    login_url: &str,
    credentials: &Credentials,
) -> Result<()> {
    if sign_in(driver, login_url, credentials).await? == LoginOutcome::NeedsOperator {
        warn!("⚠️ 仍停留在登录页（凭据错误或需要验证码）");
        warn!("请在浏览器中手动完成登录，然后按回车继续...");
        wait_for_operator().await?;
    }
    Ok(())
}

async fn left_login_page<D: UiDriver>(
    driver: &D,
    login_url: &str,
    timeout: Duration,
) -> Result<bool> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let url = driver.current_url().await.unwrap_or_default();
        if !is_login_url(&url, login_url) {
            return Ok(true);
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(Duration::from_millis(500)).await;
    }
}

fn is_login_url(url: &str, login_url: &str) -> bool {
    url.is_empty() || url.starts_with(login_url) || url.contains("/login")
}

async fn wait_for_operator() -> Result<()> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("读取标准输入失败")?;
    Ok(())
}
