pub mod approval;
pub mod poll_task;
pub mod retry;
pub mod run_context;
pub mod shared;
