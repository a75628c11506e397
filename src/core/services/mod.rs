pub mod collector_service;
pub mod connection_service;
pub mod export_service;
pub mod target_service;
pub mod types;

pub use collector_service::collect;
pub use connection_service::connect;
pub use export_service::export;
pub use target_service::{list_databases, list_targets, list_warehouses};
