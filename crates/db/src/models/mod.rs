pub mod ids;
pub mod task;
pub mod user;
