use super::error::ApiError;
use super::models::snapshot::TaskSnapshot;
use super::models::task::Task;

/// 获取全部任务的结果。`Unavailable` 表示“没有更新”，不等于空列表
#[derive(Debug)]
pub enum Listing {
    Available(TaskSnapshot),
    Unavailable(ApiError),
}

impl Listing {
    pub fn snapshot(self) -> Option<TaskSnapshot> {
        match self {
            Listing::Available(snapshot) => Some(snapshot),
            Listing::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Listing::Available(_))
    }
}

#[derive(Debug)]
pub enum Lookup {
    Found(Task),
    NotFound(ApiError),
}

impl Lookup {
    pub fn task(self) -> Option<Task> {
        match self {
            Lookup::Found(task) => Some(task),
            Lookup::NotFound(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum AddOutcome {
    Accepted,
    Rejected(ApiError),
}

impl AddOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AddOutcome::Accepted)
    }
}

#[derive(Debug)]
pub enum RemoveOutcome {
    Removed,
    Failed(ApiError),
}

impl RemoveOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, RemoveOutcome::Removed)
    }
}

#[derive(Debug)]
pub enum ShutdownOutcome {
    Accepted,
    Failed(ApiError),
}

impl ShutdownOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ShutdownOutcome::Accepted)
    }
}
