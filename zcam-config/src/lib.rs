use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use zcam_core::lead::{CutDirection, LeadConfig};

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置，并校验规划参数。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.planner.validate()?;
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `ZCAM_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("ZCAM_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

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

/// 路径规划参数：拼接与闭合容差、切割方向以及默认引线。
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "PlannerConfig::default_chain_tolerance")]
    pub chain_tolerance: f64,
    #[serde(default = "PlannerConfig::default_closure_tolerance")]
    pub closure_tolerance: f64,
    #[serde(default = "PlannerConfig::default_cut_direction")]
    pub cut_direction: CutDirection,
    #[serde(default = "PlannerConfig::default_lead_in")]
    pub lead_in: LeadConfig,
    #[serde(default)]
    pub lead_out: LeadConfig,
}

impl PlannerConfig {
    fn default_chain_tolerance() -> f64 {
        0.05
    }

    fn default_closure_tolerance() -> f64 {
        0.1
    }

    fn default_cut_direction() -> CutDirection {
        CutDirection::Counterclockwise
    }

    fn default_lead_in() -> LeadConfig {
        LeadConfig::arc(5.0)
    }

    /// 容差必须为有限正数；引线参数留给引线校验给出提示。
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("chain_tolerance", self.chain_tolerance),
            ("closure_tolerance", self.closure_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    message: format!("planner.{name} 必须为正数，当前为 {value}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            chain_tolerance: Self::default_chain_tolerance(),
            closure_tolerance: Self::default_closure_tolerance(),
            cut_direction: Self::default_cut_direction(),
            lead_in: Self::default_lead_in(),
            lead_out: LeadConfig::none(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// 是否逐点打印引线坐标。
    #[serde(default)]
    pub print_points: bool,
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
    #[error("配置无效: {message}")]
    Invalid { message: String },
}
