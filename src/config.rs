use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::common::api::client::build_base_url;
use crate::common::api::error::ApiError;

pub const DEFAULT_HOST: &str = "localhost";
/// BBDown `serve` 的默认监听端口
pub const DEFAULT_PORT: u16 = 58682;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置文件格式错误: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置项无效: {0}")]
    Invalid(String),
}

/// 连接 BBDown 服务端所需的全部配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    /// 查询和删除类请求的超时
    pub read_timeout_secs: u64,
    /// 添加任务时服务端会先做校验，给更长的超时
    pub add_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            read_timeout_secs: 5,
            add_timeout_secs: 10,
            poll_interval_secs: 10,
        }
    }
}

impl BackendConfig {
    /// 从 JSON 文件加载，缺省字段使用默认值
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("加载配置文件: {:?}", path);
        let raw = tokio::fs::read_to_string(path).await?;
        let config: BackendConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("主机不能为空".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("端口必须是1-65535之间的整数".to_string()));
        }
        if self.read_timeout_secs == 0 || self.add_timeout_secs == 0 {
            return Err(ConfigError::Invalid("超时时间必须大于0".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("刷新间隔必须大于0".to_string()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ApiError> {
        build_base_url(&self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn add_timeout(&self) -> Duration {
        Duration::from_secs(self.add_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
