//! User handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::{AppResult, OptionExt};
use domain::{
    CreateUser, ListUsersQuery, Page, SortDirection, UpdateUser, User, UserDetails, UserFilter,
    UserOrder, UserOrderField, UserProfile, UserSummary,
};

use crate::extractors::{ValidatedJson, ValidatedQuery};
use crate::state::AppState;

/// User creation request with validation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Stable identifier of the client device
    #[validate(length(min = 1, max = 255, message = "Device ID must be between 1 and 255 characters"))]
    #[schema(example = "ios-3F2A9C")]
    pub device_id: String,
    #[validate(length(min = 1, max = 100, message = "Display name must be between 1 and 100 characters"))]
    #[schema(example = "Ada")]
    pub display_name: Option<String>,
    /// Defaults to now
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl From<CreateUserRequest> for CreateUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            device_id: req.device_id,
            display_name: req.display_name,
            last_seen_at: req.last_seen_at,
        }
    }
}

/// Partial user update; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Display name must be between 1 and 100 characters"))]
    #[schema(example = "Ada Lovelace")]
    pub display_name: Option<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            display_name: req.display_name,
            last_seen_at: req.last_seen_at,
        }
    }
}

/// Listing parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersParams {
    /// Rows to skip after the cursor
    pub skip: Option<u64>,
    /// Page size, 10 when omitted
    #[validate(range(min = 1, max = 100, message = "take must be between 1 and 100"))]
    pub take: Option<u64>,
    /// Start the page at this user, inclusive
    pub cursor: Option<Uuid>,
    /// Exact device id
    pub device_id: Option<String>,
    /// Substring of the display name
    pub display_name_contains: Option<String>,
    /// Seen at or after
    pub seen_since: Option<DateTime<Utc>>,
    /// Seen strictly before
    pub seen_before: Option<DateTime<Utc>>,
    pub order_by: Option<UserOrderField>,
    pub order: Option<SortDirection>,
}

impl From<ListUsersParams> for ListUsersQuery {
    fn from(params: ListUsersParams) -> Self {
        Self {
            skip: params.skip,
            take: params.take,
            cursor: params.cursor,
            filter: UserFilter {
                device_id: params.device_id,
                display_name_contains: params.display_name_contains,
                seen_since: params.seen_since,
                seen_before: params.seen_before,
            },
            order_by: UserOrder {
                field: params.order_by.unwrap_or_default(),
                direction: params.order.unwrap_or_default(),
            },
        }
    }
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
        .route("/:id/profile", get(get_user_profile))
        .route("/:id/seen", post(mark_seen))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Store rejected the row, e.g. duplicate device id")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.users.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// List users with wallets
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(ListUsersParams),
    responses(
        (status = 200, description = "Page of users", body = domain::UserPage),
        (status = 400, description = "Invalid parameters")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<ListUsersParams>,
) -> AppResult<Json<Page<UserSummary>>> {
    let page = state.users.list(params.into()).await?;
    Ok(Json(page))
}

/// Get user with wallets, sessions and push tokens
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserDetails),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserDetails>> {
    let user = state.users.find_by_id(id).await?.ok_or_not_found()?;
    Ok(Json(user))
}

/// Get the full profile: recent transactions, live sessions, active push tokens
#[utoipa::path(
    get,
    path = "/users/{id}/profile",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserProfile>> {
    let profile = state.users.find_by_id_with_relations(id).await?;
    Ok(Json(profile))
}

/// Update user
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation error"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    let user = state.users.update(id, payload.into()).await?;
    Ok(Json(user))
}

/// Delete user with its wallets, transactions, sessions and push tokens
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record that the user was seen now
#[utoipa::path(
    post,
    path = "/users/{id}/seen",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Last seen updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn mark_seen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let user = state.users.update_last_seen(id).await?;
    Ok(Json(user))
}
