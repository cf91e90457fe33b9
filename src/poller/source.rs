use async_trait::async_trait;

use crate::common::api::client::BackendClient;
use crate::common::api::outcome::Listing;

/// 轮询器获取任务列表的来源
#[async_trait]
pub trait TaskSource: Send + Sync + 'static {
    async fn list_all(&self) -> Listing;
}

#[async_trait]
impl TaskSource for BackendClient {
    async fn list_all(&self) -> Listing {
        BackendClient::list_all(self).await
    }
}
