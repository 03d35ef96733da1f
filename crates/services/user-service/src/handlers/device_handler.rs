//! Device-keyed user handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};

use common::{AppResult, OptionExt};
use domain::{DeviceUser, User};

use crate::state::AppState;

/// Create device routes
pub fn device_routes() -> Router<AppState> {
    Router::new().route(
        "/:device_id/user",
        get(get_device_user).post(find_or_create_device_user),
    )
}

/// Get the user registered for a device
#[utoipa::path(
    get,
    path = "/devices/{device_id}/user",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device identifier")
    ),
    responses(
        (status = 200, description = "User with wallets and sessions", body = DeviceUser),
        (status = 404, description = "No user for this device")
    )
)]
pub async fn get_device_user(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> AppResult<Json<DeviceUser>> {
    let user = state
        .users
        .find_by_device_id(&device_id)
        .await?
        .ok_or_not_found()?;

    Ok(Json(user))
}

/// Return the device's user, creating it on first contact
#[utoipa::path(
    post,
    path = "/devices/{device_id}/user",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device identifier")
    ),
    responses(
        (status = 200, description = "Existing user touched or new user created", body = User),
        (status = 400, description = "Invalid device identifier")
    )
)]
pub async fn find_or_create_device_user(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> AppResult<Json<User>> {
    let user = state.users.find_or_create_by_device_id(&device_id).await?;
    Ok(Json(user))
}
