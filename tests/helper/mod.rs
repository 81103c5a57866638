//! Shared fixtures for integration tests
#![allow(dead_code)]

pub mod datasource;
pub mod fixtures;
pub mod lookup;

pub use datasource::FakeDataSource;
pub use fixtures::{create_test_index, license, module, unit};
pub use lookup::StaticLatest;
