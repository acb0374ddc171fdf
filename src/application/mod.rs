// Application layer - Use cases over the telemetry history
pub mod device_source;
pub mod history_service;
pub mod poller;
pub mod visibility;
