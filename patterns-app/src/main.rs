use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use patterns_config::{AppConfig, ConfigError};
use patterns_core::geometry::Point2;
use patterns_plugin::cli::DemoOptions;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 模式插件的命令行演示。
#[derive(Debug, Parser)]
#[command(name = "patterns", version, about)]
struct Args {
    /// 配置文件路径，缺省时依次尝试 `PATTERNS_CONFIG` 与 `./config/default.toml`
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖模板集命名空间
    #[arg(long)]
    namespace: Option<String>,

    /// 放置点的屏幕横坐标
    #[arg(long, default_value_t = 400.0)]
    drop_x: f64,

    /// 放置点的屏幕纵坐标
    #[arg(long, default_value_t = 300.0)]
    drop_y: f64,

    /// 演示结束时撤销放置
    #[arg(long)]
    undo: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!(error = ?err, "执行 CLI 演示失败");
        eprintln!("执行 CLI 演示失败：{err:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_configuration(args.config.as_deref())?;
    init_logging(&config);
    info!("启动模式插件演示");

    if let Some(namespace) = args.namespace {
        config.repository.namespace = Some(namespace);
    }
    let options = DemoOptions {
        drop_point: Point2::new(args.drop_x, args.drop_y),
        undo: args.undo,
    };
    patterns_plugin::run_cli_demo(&config, &options)
        .await
        .context("模式演示中断")
}

/// 显式指定的配置必须能读取；自动发现失败时退回内建默认值。
fn load_configuration(path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    if let Some(path) = path {
        return AppConfig::from_file(path)
            .with_context(|| format!("加载配置 {} 失败", path.display()));
    }
    Ok(match AppConfig::discover() {
        Ok(cfg) => cfg,
        Err(err) => {
            match &err {
                ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                    warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                }
                ConfigError::Context { .. } => {
                    warn!(error = %err, "加载默认配置失败，使用内建默认值");
                }
            }
            AppConfig::default()
        }
    })
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
