use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

/// 连接到已开启调试端口的浏览器并获取页面
///
/// 优先复用 URL 以 `target_url` 开头的已有标签页，找不到时新建页面并导航过去。
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: Option<&str>,
    target_title: Option<&str>,
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {:?}, 目标标题: {:?}", target_url, target_title);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    for p in pages.iter() {
        if let Some(title) = target_title {
            if let Ok(Some(page_title)) = p.get_title().await {
                if page_title.contains(title) {
                    info!("✓ 复用已有页面: {}", page_title);
                    return Ok((browser, p.clone()));
                }
            }
        }
        if let (Some(url), Ok(Some(page_url))) = (target_url, p.url().await) {
            if page_url.starts_with(url) {
                info!("✓ 复用已有页面: {}", page_url);
                return Ok((browser, p.clone()));
            }
        }
    }

    let page = browser
        .new_page("about:blank")
        .await
        .context("创建新页面失败")?;
    if let Some(url) = target_url {
        page.goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        info!("已导航到: {}", url);
    }

    Ok((browser, page))
}
