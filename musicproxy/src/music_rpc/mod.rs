pub mod db_ops;
pub mod model;
pub mod rpc;
pub mod service;
pub mod syncer;
