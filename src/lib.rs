pub mod common;
pub mod config;
pub mod poller;

pub use common::api::client::BackendClient;
pub use common::api::error::ApiError;
pub use common::api::models::options::{AddTaskOptions, OptionKey};
pub use common::api::models::snapshot::TaskSnapshot;
pub use common::api::models::task::Task;
pub use common::api::outcome::{AddOutcome, Listing, Lookup, RemoveOutcome, ShutdownOutcome};
pub use config::BackendConfig;
pub use poller::{PollOutcome, PollerHandle, TaskPoller, TaskSource};
