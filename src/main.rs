use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};
use vitals_hud::config::{HudConfig, PanelVariant};
use vitals_hud::terminal;

/// 系统资源 HUD 面板
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 面板样式
    #[arg(short, long, value_enum, default_value_t = PanelVariant::Compact)]
    variant: PanelVariant,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// 日志文件 (默认: 临时目录下的 vitals-hud.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 终端被面板占用，日志写入文件
    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("vitals-hud.log"));
    init_logger(&args.log_level, &log_file)?;

    info!("系统资源 HUD 启动中...");

    let config = HudConfig::for_variant(args.variant);
    info!(
        "配置信息 - 样式: {:?}, 尺寸: {}x{}, 采样周期: {:?}, 贴边阈值: {}px",
        config.variant,
        config.size.width,
        config.size.height,
        config.tick_interval,
        config.edge_threshold.width
    );

    terminal::run(&config).await?;

    info!("系统资源 HUD 正常关闭");

    Ok(())
}

/// 初始化日志系统
fn init_logger(level: &str, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("无法创建日志文件: {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("日志系统初始化失败")?;

    info!("日志系统初始化成功，级别: {level}");
    Ok(())
}
