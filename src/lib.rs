pub mod ca;
pub mod config;
pub mod crl;
pub mod server;
pub mod setup;
pub mod telemetry;
