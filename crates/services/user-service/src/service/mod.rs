mod app_service;
mod user_service;

pub use app_service::{AppService, Describe, Description, Health};
pub use user_service::{UserManager, UsersService};
