//! User service - Handles user-related business logic.
//!
//! Operations forward to the repository, log failures with the operation name
//! and key, then return the error unchanged. The only multi-step operation is
//! find-or-create by device id.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{
    validate_display_name, CreateUser, DeviceUser, ListUsersQuery, NewDeviceUser, Page,
    UpdateUser, User, UserDetails, UserProfile, UserSummary,
};

use crate::repository::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Create a user from full input; store constraint errors pass through
    async fn create(&self, data: CreateUser) -> AppResult<User>;

    /// Get user with wallets, sessions and push tokens; `None` if absent
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserDetails>>;

    /// Get user with wallets and sessions by device id; `None` if absent
    async fn find_by_device_id(&self, device_id: &str) -> AppResult<Option<DeviceUser>>;

    /// Return the device's user, touching last-seen, or create it on first contact
    async fn find_or_create_by_device_id(&self, device_id: &str) -> AppResult<User>;

    /// Apply a partial update
    async fn update(&self, id: Uuid, data: UpdateUser) -> AppResult<User>;

    /// Set last-seen to now
    async fn update_last_seen(&self, id: Uuid) -> AppResult<User>;

    /// Delete user and, through the store, everything it owns
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Deep fetch; fails with `AppError::NotFound` if absent
    async fn find_by_id_with_relations(&self, id: Uuid) -> AppResult<UserProfile>;

    /// Page of users with wallets plus an independently counted total
    async fn list(&self, query: ListUsersQuery) -> AppResult<Page<UserSummary>>;
}

/// Concrete implementation of UsersService using a repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
    log: Span,
}

impl UserManager {
    /// Create new user service instance.
    ///
    /// `log` is the parent span for every event and span this service emits.
    pub fn new(repo: Arc<dyn UserRepository>, log: Span) -> Self {
        Self { repo, log }
    }

    fn log_failure(&self, operation: &'static str, key: &dyn fmt::Display, err: &AppError) {
        if err.is_not_found() {
            warn!(parent: &self.log, operation, key = %key, "User not found");
        } else {
            error!(parent: &self.log, operation, key = %key, error = ?err, "User operation failed");
        }
    }

    async fn touch(&self, id: Uuid) -> AppResult<User> {
        self.repo.update(id, UpdateUser::last_seen(Utc::now())).await
    }

    async fn find_or_create(&self, device_id: &str) -> AppResult<User> {
        let new_user = NewDeviceUser::new(device_id)?;

        if let Some(existing) = self.repo.find_by_device_id(device_id).await? {
            debug!("Known device, touching last seen");
            return self.touch(existing.id).await;
        }

        if let Some(created) = self.repo.insert_for_device(new_user).await? {
            info!(user_id = %created.id, "Created user for new device");
            return Ok(created);
        }

        // Another request inserted this device between our read and write
        debug!("Lost first-contact race, reading the winner's row");
        let existing = self
            .repo
            .find_by_device_id(device_id)
            .await?
            .ok_or_not_found()?;
        self.touch(existing.id).await
    }
}

#[async_trait]
impl UsersService for UserManager {
    async fn create(&self, data: CreateUser) -> AppResult<User> {
        data.validate()?;
        let device_id = data.device_id.clone();

        let user = self
            .repo
            .create(data)
            .instrument(info_span!(parent: &self.log, "create", device_id = %device_id))
            .await
            .inspect_err(|e| self.log_failure("create", &device_id, e))?;

        info!(parent: &self.log, user_id = %user.id, device_id = %user.device_id, "User created");
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserDetails>> {
        self.repo
            .find_details(id)
            .instrument(info_span!(parent: &self.log, "find_by_id", user_id = %id))
            .await
            .inspect_err(|e| self.log_failure("find_by_id", &id, e))
    }

    async fn find_by_device_id(&self, device_id: &str) -> AppResult<Option<DeviceUser>> {
        self.repo
            .find_device_user(device_id)
            .instrument(info_span!(parent: &self.log, "find_by_device_id", device_id = %device_id))
            .await
            .inspect_err(|e| self.log_failure("find_by_device_id", &device_id, e))
    }

    async fn find_or_create_by_device_id(&self, device_id: &str) -> AppResult<User> {
        let span = info_span!(parent: &self.log, "find_or_create_by_device_id", device_id = %device_id);

        self.find_or_create(device_id)
            .instrument(span)
            .await
            .inspect_err(|e| self.log_failure("find_or_create_by_device_id", &device_id, e))
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> AppResult<User> {
        if let Some(ref name) = data.display_name {
            validate_display_name(name)?;
        }

        self.repo
            .update(id, data)
            .instrument(info_span!(parent: &self.log, "update", user_id = %id))
            .await
            .inspect_err(|e| self.log_failure("update", &id, e))
    }

    async fn update_last_seen(&self, id: Uuid) -> AppResult<User> {
        self.touch(id)
            .instrument(info_span!(parent: &self.log, "update_last_seen", user_id = %id))
            .await
            .inspect_err(|e| self.log_failure("update_last_seen", &id, e))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repo
            .delete(id)
            .instrument(info_span!(parent: &self.log, "delete", user_id = %id))
            .await
            .inspect_err(|e| self.log_failure("delete", &id, e))?;

        info!(parent: &self.log, user_id = %id, "User deleted");
        Ok(())
    }

    async fn find_by_id_with_relations(&self, id: Uuid) -> AppResult<UserProfile> {
        self.repo
            .find_profile(id)
            .instrument(info_span!(parent: &self.log, "find_by_id_with_relations", user_id = %id))
            .await
            .and_then(|profile| profile.ok_or_not_found())
            .inspect_err(|e| self.log_failure("find_by_id_with_relations", &id, e))
    }

    async fn list(&self, query: ListUsersQuery) -> AppResult<Page<UserSummary>> {
        if query.take == Some(0) {
            return Err(AppError::validation("take must be greater than 0"));
        }

        let span = info_span!(parent: &self.log, "list", skip = ?query.skip, take = ?query.take);

        // Two independent reads: the total is not a snapshot of the page
        let (total, users) = async {
            tokio::try_join!(self.repo.count(&query.filter), self.repo.list(&query))
        }
        .instrument(span)
        .await
        .inspect_err(|e| self.log_failure("list", &"users", e))?;

        Ok(Page::new(users, total, &query))
    }
}
