pub mod button;
pub mod errors;
pub mod panel;
pub mod plugin;

#[cfg(feature = "cli")]
pub mod cli;

pub use button::PatternButton;
pub use errors::PluginError;
pub use panel::{NodeId, PatternNode, PatternPanel};
pub use plugin::{PatternsPlugin, PlacedPattern, SELECTION_AS_PATTERN};

#[cfg(feature = "cli")]
use patterns_config::AppConfig;
#[cfg(feature = "cli")]
use tracing::info;

/// 运行 CLI 演示：捕获选区、保存、重命名并放置模式。
#[cfg(feature = "cli")]
pub async fn run_cli_demo(config: &AppConfig, options: &cli::DemoOptions) -> Result<(), PluginError> {
    info!("启动 CLI 演示");
    cli::run_demo(config, options).await?;
    Ok(())
}
