//! OpenAPI documentation.

use axum::response::Json;
use utoipa::OpenApi;

use crate::handlers::user_handler::{CreateUserRequest, UpdateUserRequest};
use crate::service::{Description, Health};
use domain::{
    DeviceUser, PageMeta, PushToken, Session, SortDirection, Transaction, User, UserDetails,
    UserOrderField, UserPage, UserProfile, UserSummary, Wallet, WalletWithTransactions,
};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::user_handler::create_user,
        crate::handlers::user_handler::list_users,
        crate::handlers::user_handler::get_user,
        crate::handlers::user_handler::get_user_profile,
        crate::handlers::user_handler::update_user,
        crate::handlers::user_handler::delete_user,
        crate::handlers::user_handler::mark_seen,
        crate::handlers::device_handler::get_device_user,
        crate::handlers::device_handler::find_or_create_device_user,
    ),
    components(
        schemas(
            Health,
            Description,
            CreateUserRequest,
            UpdateUserRequest,
            User,
            UserDetails,
            DeviceUser,
            UserProfile,
            UserSummary,
            UserPage,
            PageMeta,
            Wallet,
            WalletWithTransactions,
            Transaction,
            Session,
            PushToken,
            UserOrderField,
            SortDirection,
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Users", description = "User management endpoints"),
        (name = "Devices", description = "Device-keyed user lookup and first contact"),
    )
)]
pub struct ApiDoc;

/// Serve the generated document as JSON.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
