use thiserror::Error;
use zcam_config::ConfigError;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("规划参数无效: {0}")]
    InvalidPlannerConfig(#[source] ConfigError),
}
