use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "PATTERNS_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub plugin: PluginConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 自动发现配置文件：优先读取环境变量 `PATTERNS_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let dir = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_in(&dir)
    }

    /// 在指定目录下寻找 `config/default.toml`。
    pub fn discover_in(dir: &Path) -> Result<Self, ConfigError> {
        let default_path = dir.join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 模式服务器的位置。
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// 服务根路径，端点为 `root_path + "/pattern"`。
    #[serde(default = "RepositoryConfig::default_root_path")]
    pub root_path: String,
    /// 覆盖编辑器报告的模板集命名空间。
    #[serde(default)]
    pub namespace: Option<String>,
}

impl RepositoryConfig {
    fn default_root_path() -> String {
        "/oryx".to_string()
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            root_path: Self::default_root_path(),
            namespace: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    /// 显示模式按钮、启用工具栏动作所需的最少选中形状数。
    #[serde(default = "PluginConfig::default_min_selection")]
    pub min_selection: usize,
    #[serde(default = "PluginConfig::default_pattern_name")]
    pub default_pattern_name: String,
    #[serde(default = "PluginConfig::default_padding")]
    pub selected_area_padding: f64,
    #[serde(default = "PluginConfig::default_icon")]
    pub icon: String,
}

impl PluginConfig {
    fn default_min_selection() -> usize {
        2
    }

    fn default_pattern_name() -> String {
        "New Pattern".to_string()
    }

    fn default_padding() -> f64 {
        4.0
    }

    fn default_icon() -> String {
        "images/pattern_add.png".to_string()
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            min_selection: Self::default_min_selection(),
            default_pattern_name: Self::default_pattern_name(),
            selected_area_padding: Self::default_padding(),
            icon: Self::default_icon(),
        }
    }
}

/// 演示画布的尺寸。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "CanvasConfig::default_width")]
    pub width: f64,
    #[serde(default = "CanvasConfig::default_height")]
    pub height: f64,
}

impl CanvasConfig {
    fn default_width() -> f64 {
        1485.0
    }

    fn default_height() -> f64 {
        1050.0
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
