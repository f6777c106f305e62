use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use gif_upload_bot::config::{Config, Credentials};
use gif_upload_bot::orchestrator::{pending_count, App};
use gif_upload_bot::utils::logging;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "gif_upload_bot")]
#[command(about = "把本地 GIF 按批次断点续传到 GIPHY")]
#[command(version)]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: PathBuf,

    /// 连接已开启调试端口的浏览器，不设置时启动新浏览器
    #[arg(long, env = "BROWSER_DEBUG_PORT")]
    debug_port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化日志
    logging::init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ 程序异常退出: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    // 加载配置
    let mut config = Config::load(&args.config)?;
    config.browser_debug_port = args.debug_port;

    // 凭据缺失时不启动浏览器
    let credentials = Credentials::from_env()?;

    let pending = pending_count(&config)?;
    logging::log_startup(&config, pending);
    if pending == 0 {
        info!("✓ 所有素材均已上传，无需处理");
        return Ok(());
    }

    // 初始化并运行应用
    App::initialize(config, &credentials).await?.run().await?;

    Ok(())
}
