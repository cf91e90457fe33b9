use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("网络请求失败: {0}")]
    Transport(reqwest::Error),

    #[error("请求超时")]
    Timeout,

    #[error("服务端返回异常状态: {0}")]
    Status(StatusCode),

    #[error("响应解析失败: {0}")]
    InvalidResponse(String),

    #[error("无效的连接目标: {0}")]
    InvalidTarget(String),
}

impl ApiError {
    /// 是否为网络层面的失败（超时、拒绝连接、DNS）
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Transport(e)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidTarget(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
