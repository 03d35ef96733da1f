//! HTTP handlers.

pub mod device_handler;
pub mod health_handler;
pub mod user_handler;

pub use device_handler::device_routes;
pub use health_handler::health_routes;
pub use user_handler::user_routes;
