pub mod music_tasks;
pub mod resource_info;

mod common;
pub use common::*;
