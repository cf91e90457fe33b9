use serde::{Deserialize, Deserializer, Serialize};

use super::task::Task;

/// `/get-tasks/` 的原始响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskListing {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub running: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub finished: Vec<Task>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Task>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Task>>::deserialize(deserializer)?.unwrap_or_default())
}

/// 一次轮询得到的完整任务快照。
///
/// 分区只由 `finished_at` 是否存在决定，服务端把任务放在哪个数组里不作数。
/// 字段私有，保证快照构造之后分区不会被破坏。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskSnapshot {
    running: Vec<Task>,
    finished: Vec<Task>,
}

impl TaskSnapshot {
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let (finished, running): (Vec<Task>, Vec<Task>) =
            tasks.into_iter().partition(Task::is_finished);
        Self { running, finished }
    }

    pub fn running(&self) -> &[Task] {
        &self.running
    }

    pub fn finished(&self) -> &[Task] {
        &self.finished
    }

    pub fn len(&self) -> usize {
        self.running.len() + self.finished.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty() && self.finished.is_empty()
    }

    pub fn find(&self, aid: &str) -> Option<&Task> {
        self.running
            .iter()
            .chain(self.finished.iter())
            .find(|task| task.aid == aid)
    }

    /// 已结束但未成功的任务
    pub fn failed(&self) -> impl Iterator<Item = &Task> {
        self.finished.iter().filter(|task| !task.is_successful)
    }

    pub fn into_parts(self) -> (Vec<Task>, Vec<Task>) {
        (self.running, self.finished)
    }
}

impl From<TaskListing> for TaskSnapshot {
    fn from(listing: TaskListing) -> Self {
        Self::from_tasks(listing.running.into_iter().chain(listing.finished))
    }
}
