pub mod api {
    pub mod models {
        pub mod options;
        pub mod snapshot;
        pub mod task;
    }
    pub mod client;
    pub mod error;
    pub mod outcome;
}

pub mod format;
pub mod logger;
