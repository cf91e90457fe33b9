use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Method, StatusCode, Url};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::error::{ApiError, Result};
use super::models::options::AddTaskOptions;
use super::models::snapshot::{TaskListing, TaskSnapshot};
use super::models::task::Task;
use super::outcome::{AddOutcome, Listing, Lookup, RemoveOutcome, ShutdownOutcome};
use crate::config::BackendConfig;

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_ADD_TIMEOUT: Duration = Duration::from_secs(10);

/// 由主机和端口拼出服务端根地址，例如 `http://localhost:58682/`
pub fn build_base_url(host: &str, port: u16) -> Result<Url> {
    let host = host.trim();
    if host.is_empty() {
        return Err(ApiError::InvalidTarget("主机不能为空".to_string()));
    }
    if port == 0 {
        return Err(ApiError::InvalidTarget(
            "端口必须是1-65535之间的整数".to_string(),
        ));
    }
    // 裸 IPv6 地址需要方括号
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };

    let url = Url::parse(&format!("http://{}:{}/", host, port))?;
    if url.path() != "/" || url.query().is_some() {
        return Err(ApiError::InvalidTarget(format!("无效的主机: {}", host)));
    }
    Ok(url)
}

/// BBDown 服务端的 HTTP 客户端。
///
/// 所有网络和协议错误都在这里折叠成各操作自己的结果类型，调用方拿不到裸异常。
/// 克隆出来的客户端共享同一个连接目标，`reconnect` 对所有克隆生效。
#[derive(Debug, Clone)]
pub struct BackendClient {
    inner: Client,
    target: Arc<RwLock<Arc<Url>>>,
    read_timeout: Duration,
    add_timeout: Duration,
}

impl BackendClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let base_url = build_base_url(host, port)?;

        let inner = ClientBuilder::new()
            .default_headers(Self::get_default_headers())
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            inner,
            target: Arc::new(RwLock::new(Arc::new(base_url))),
            read_timeout: DEFAULT_READ_TIMEOUT,
            add_timeout: DEFAULT_ADD_TIMEOUT,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Ok(Self::new(&config.host, config.port)?
            .with_timeouts(config.read_timeout(), config.add_timeout()))
    }

    pub fn with_timeouts(mut self, read_timeout: Duration, add_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self.add_timeout = add_timeout;
        self
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn add_timeout(&self) -> Duration {
        self.add_timeout
    }

    /// 当前连接目标
    pub fn base_url(&self) -> Arc<Url> {
        let guard = self.target.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// 切换到新的主机和端口。
    ///
    /// 整个地址一次性替换，之后发起的请求都指向新目标；
    /// 已经发出的请求继续使用旧目标。参数无效时保持原目标不变。
    pub fn reconnect(&self, host: &str, port: u16) -> Result<()> {
        let base_url = build_base_url(host, port)?;
        info!("连接目标切换为: {}", base_url);
        let mut guard = self.target.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(base_url);
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = (*self.base_url()).clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidTarget("无法拼接请求路径".to_string()))?
            .clear()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint(segments)?;
        debug!("{} {}", method, url);

        let mut request = self.inner.request(method, url).timeout(timeout);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .json(&body);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ApiError::Status(status));
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let resp = self
            .send(Method::GET, segments, None, self.read_timeout)
            .await?;
        let raw_body = resp.bytes().await?;
        Ok(serde_json::from_slice::<T>(&raw_body)?)
    }

    async fn get_ok(&self, segments: &[&str]) -> Result<()> {
        self.send(Method::GET, segments, None, self.read_timeout)
            .await
            .map(|_| ())
    }

    /// 获取全部任务
    pub async fn list_all(&self) -> Listing {
        match self.get_json::<TaskListing>(&["get-tasks", ""]).await {
            Ok(listing) => Listing::Available(TaskSnapshot::from(listing)),
            Err(e) => {
                warn!("获取任务失败: {}", e);
                Listing::Unavailable(e)
            }
        }
    }

    /// 获取运行中的任务，失败时返回空列表
    pub async fn list_running(&self) -> Vec<Task> {
        self.get_json::<Vec<Task>>(&["get-tasks", "running"])
            .await
            .unwrap_or_else(|e| {
                warn!("获取运行中任务失败: {}", e);
                Vec::new()
            })
    }

    /// 获取已完成的任务，失败时返回空列表
    pub async fn list_finished(&self) -> Vec<Task> {
        self.get_json::<Vec<Task>>(&["get-tasks", "finished"])
            .await
            .unwrap_or_else(|e| {
                warn!("获取已完成任务失败: {}", e);
                Vec::new()
            })
    }

    pub async fn get_one(&self, aid: &str) -> Lookup {
        let aid = aid.trim();
        if aid.is_empty() {
            return Lookup::NotFound(ApiError::InvalidTarget("任务 aid 不能为空".to_string()));
        }
        match self.get_json::<Task>(&["get-tasks", aid]).await {
            Ok(task) => Lookup::Found(task),
            Err(e) => {
                warn!("获取任务详情失败 [{}]: {}", aid, e);
                Lookup::NotFound(e)
            }
        }
    }

    /// 提交新任务，只有 HTTP 200 才算接受
    pub async fn add(&self, url: &str, options: &AddTaskOptions) -> AddOutcome {
        if url.trim().is_empty() {
            return AddOutcome::Rejected(ApiError::InvalidTarget("URL 不能为空".to_string()));
        }
        let body = options.to_request_body(url);
        match self
            .send(Method::POST, &["add-task"], Some(body), self.add_timeout)
            .await
        {
            Ok(_) => {
                info!("任务已提交: {}", url.trim());
                AddOutcome::Accepted
            }
            Err(e) => {
                warn!("添加任务失败: {}", e);
                AddOutcome::Rejected(e)
            }
        }
    }

    pub async fn remove_one(&self, aid: &str) -> RemoveOutcome {
        let aid = aid.trim();
        // 空 aid 会落到“移除全部已完成”的路径上
        if aid.is_empty() {
            return RemoveOutcome::Failed(ApiError::InvalidTarget("任务 aid 不能为空".to_string()));
        }
        Self::removal(self.get_ok(&["remove-finished", aid]).await, "移除特定任务")
    }

    pub async fn remove_all_finished(&self) -> RemoveOutcome {
        Self::removal(self.get_ok(&["remove-finished"]).await, "移除已完成任务")
    }

    pub async fn remove_all_failed(&self) -> RemoveOutcome {
        Self::removal(
            self.get_ok(&["remove-finished", "failed"]).await,
            "移除失败任务",
        )
    }

    fn removal(result: Result<()>, action: &str) -> RemoveOutcome {
        match result {
            Ok(()) => {
                debug!("{}成功", action);
                RemoveOutcome::Removed
            }
            Err(e) => {
                warn!("{}失败: {}", action, e);
                RemoveOutcome::Failed(e)
            }
        }
    }

    /// 请求服务端自行退出
    pub async fn shutdown(&self) -> ShutdownOutcome {
        match self
            .send(Method::POST, &["shutdown"], None, self.read_timeout)
            .await
        {
            Ok(_) => {
                info!("服务端已接受关闭请求");
                ShutdownOutcome::Accepted
            }
            Err(e) => {
                warn!("关闭服务端失败: {}", e);
                ShutdownOutcome::Failed(e)
            }
        }
    }

    /// 在给定时间内服务端能否正常应答
    pub async fn probe(&self, timeout: Duration) -> bool {
        match self
            .send(Method::GET, &["get-tasks", ""], None, timeout)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!("服务端不可达: {}", e);
                false
            }
        }
    }
}
