// Library for tests to access modules

pub mod config;
pub mod docker_repo;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod models;
pub mod registry;
pub mod routes;
pub mod update_check;
pub mod version;
