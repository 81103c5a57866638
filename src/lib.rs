pub mod config;
pub mod datasource;
pub mod error;
pub mod frontend;
pub mod latest;
pub mod logging;
pub mod module;
pub mod proxy;
