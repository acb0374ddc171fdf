// Domain layer - Telemetry history and chart geometry
pub mod axis;
pub mod buffer;
pub mod channel;
pub mod labels;
pub mod metrics;
pub mod reading;
pub mod sample;
pub mod status;
pub mod viewport;
