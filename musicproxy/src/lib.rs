pub mod cli;
pub mod config;
pub mod error;
pub mod music_rpc;
pub mod provider;
pub mod resource;
pub mod utils;
