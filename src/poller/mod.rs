use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::common::api::error::ApiError;
use crate::common::api::models::snapshot::TaskSnapshot;
use crate::common::api::outcome::Listing;

use guard::FlightGuard;
pub use source::TaskSource;

pub mod guard;
pub mod source;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
const CHANNEL_CAPACITY: usize = 16;

/// 一次轮询的结果
#[derive(Debug)]
pub enum PollOutcome {
    /// 已有轮询在进行，本次被丢弃
    Skipped,
    /// 服务端不可用，保留上一次的快照
    Unavailable(ApiError),
    Unchanged,
    Changed(TaskSnapshot),
}

impl PollOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, PollOutcome::Changed(_))
    }
}

struct PollerState<S> {
    source: S,
    polling: AtomicBool,
    last: Mutex<Option<TaskSnapshot>>,
    sender: broadcast::Sender<TaskSnapshot>,
    interval: Duration,
}

/// 定时刷新任务列表，只在内容变化时通知订阅者。
///
/// 任意时刻最多只有一个 `list_all` 在进行，定时触发和手动刷新共用同一个单飞标记，
/// 所以订阅者看到的快照顺序不会倒退。
pub struct TaskPoller<S: TaskSource> {
    state: Arc<PollerState<S>>,
}

impl<S: TaskSource> Clone for TaskPoller<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: TaskSource> TaskPoller<S> {
    /// `interval` 为 0 时改用默认间隔
    pub fn new(source: S, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            warn!("刷新间隔不能为0，改用默认间隔 {:?}", DEFAULT_INTERVAL);
            DEFAULT_INTERVAL
        } else {
            interval
        };
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: Arc::new(PollerState {
                source,
                polling: AtomicBool::new(false),
                last: Mutex::new(None),
                sender,
                interval,
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.state.source
    }

    pub fn interval(&self) -> Duration {
        self.state.interval
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskSnapshot> {
        self.state.sender.subscribe()
    }

    pub fn last_snapshot(&self) -> Option<TaskSnapshot> {
        self.state
            .last
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_polling(&self) -> bool {
        self.state.polling.load(Ordering::Acquire)
    }

    /// 执行一次轮询；已有轮询在进行时直接返回 `Skipped`
    pub async fn poll_once(&self) -> PollOutcome {
        let Some(_guard) = FlightGuard::try_acquire(&self.state.polling) else {
            debug!("上一次刷新尚未完成，跳过本次刷新");
            return PollOutcome::Skipped;
        };

        let snapshot = match self.state.source.list_all().await {
            Listing::Available(snapshot) => snapshot,
            Listing::Unavailable(e) => {
                debug!("服务端不可用，保留现有任务列表: {}", e);
                return PollOutcome::Unavailable(e);
            }
        };

        {
            let mut last = self.state.last.lock().unwrap_or_else(|e| e.into_inner());
            if last.as_ref() == Some(&snapshot) {
                return PollOutcome::Unchanged;
            }
            *last = Some(snapshot.clone());
        }

        debug!(
            "任务列表已更新: 运行中 {} 个，已完成 {} 个",
            snapshot.running().len(),
            snapshot.finished().len()
        );
        // 没有订阅者时发送会失败，快照仍然已经保存
        let _ = self.state.sender.send(snapshot.clone());
        PollOutcome::Changed(snapshot)
    }

    /// 手动刷新，与定时刷新走同一套单飞检查
    pub async fn refresh_now(&self) -> PollOutcome {
        self.poll_once().await
    }

    /// 启动定时刷新，第一次刷新立即执行
    pub fn spawn(&self) -> PollerHandle<S> {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let poller = self.clone();

        let join = tokio::spawn(async move {
            let mut timer = tokio::time::interval(poller.interval());
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("任务轮询已启动，间隔 {:?}", poller.interval());

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = timer.tick() => {}
                }
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    outcome = poller.poll_once() => {
                        if let PollOutcome::Unavailable(e) = outcome {
                            if e.is_transport() {
                                warn!("无法连接到服务端: {}", e);
                            }
                        }
                    }
                }
            }

            info!("任务轮询已停止");
        });

        PollerHandle {
            poller: self.clone(),
            cancel_on_drop: token.drop_guard(),
            join,
        }
    }
}

/// 后台轮询的句柄，丢弃时后台任务随之停止
pub struct PollerHandle<S: TaskSource> {
    poller: TaskPoller<S>,
    cancel_on_drop: DropGuard,
    join: JoinHandle<()>,
}

impl<S: TaskSource> PollerHandle<S> {
    pub fn poller(&self) -> &TaskPoller<S> {
        &self.poller
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskSnapshot> {
        self.poller.subscribe()
    }

    pub async fn refresh_now(&self) -> PollOutcome {
        self.poller.refresh_now().await
    }

    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// 停止定时器并等待后台任务退出
    pub async fn shutdown(self) {
        drop(self.cancel_on_drop);
        if let Err(e) = self.join.await {
            warn!("轮询任务异常退出: {}", e);
        }
    }
}
