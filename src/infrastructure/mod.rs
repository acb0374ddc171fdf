// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod device_client;
pub mod export;
pub mod file_store;
