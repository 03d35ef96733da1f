//! User repository implementation over SeaORM.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{LikeExpr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    LoaderTrait, ModelTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set, Value,
};
use uuid::Uuid;

use super::entities::{
    push_token, session, transaction,
    user::{self, ActiveModel, Entity as UserEntity},
    wallet,
};
use common::{AppError, AppResult};
use domain::{
    CreateUser, DeviceUser, ListUsersQuery, NewDeviceUser, SortDirection, UpdateUser, User,
    UserDetails, UserFilter, UserOrder, UserOrderField, UserProfile, UserSummary,
    WalletWithTransactions, RECENT_TRANSACTIONS_LIMIT,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Every method is a direct round-trip to the store; nothing is cached.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; uniqueness violations surface as `AppError::Database`
    async fn create(&self, data: CreateUser) -> AppResult<User>;

    /// Insert a bare user for a device unless one already exists.
    ///
    /// Returns `None` when another row already holds the device id.
    async fn insert_for_device(&self, data: NewDeviceUser) -> AppResult<Option<User>>;

    /// Find user by device id, without relations
    async fn find_by_device_id(&self, device_id: &str) -> AppResult<Option<User>>;

    /// Find user by ID with wallets, sessions and push tokens
    async fn find_details(&self, id: Uuid) -> AppResult<Option<UserDetails>>;

    /// Find user by device id with wallets and sessions
    async fn find_device_user(&self, device_id: &str) -> AppResult<Option<DeviceUser>>;

    /// Find user by ID with recent transactions, live sessions and active push tokens
    async fn find_profile(&self, id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Apply a partial update; `AppError::NotFound` if the row is missing
    async fn update(&self, id: Uuid, data: UpdateUser) -> AppResult<User>;

    /// Delete user by ID; `AppError::NotFound` if no row was removed
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Fetch one page of users with their wallets
    async fn list(&self, query: &ListUsersQuery) -> AppResult<Vec<UserSummary>>;

    /// Count users matching a filter
    async fn count(&self, filter: &UserFilter) -> AppResult<u64>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// `%fragment%` with the fragment's own `%`, `_` and `\` matched literally.
fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn filter_condition(filter: &UserFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(ref device_id) = filter.device_id {
        condition = condition.add(user::Column::DeviceId.eq(device_id.as_str()));
    }
    if let Some(ref fragment) = filter.display_name_contains {
        let pattern = LikeExpr::new(contains_pattern(fragment)).escape('\\');
        condition = condition.add(user::Column::DisplayName.like(pattern));
    }
    if let Some(since) = filter.seen_since {
        condition = condition.add(user::Column::LastSeenAt.gte(since));
    }
    if let Some(before) = filter.seen_before {
        condition = condition.add(user::Column::LastSeenAt.lt(before));
    }

    condition
}

fn order_column(field: UserOrderField) -> user::Column {
    match field {
        UserOrderField::CreatedAt => user::Column::CreatedAt,
        UserOrderField::LastSeenAt => user::Column::LastSeenAt,
        UserOrderField::DeviceId => user::Column::DeviceId,
    }
}

fn sort_order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

fn apply_order(select: Select<UserEntity>, order: UserOrder) -> Select<UserEntity> {
    select
        .order_by(order_column(order.field), sort_order(order.direction))
        .order_by(user::Column::Id, sort_order(order.direction))
}

/// Rows at or after `anchor` in the given order (id breaks ties).
fn cursor_condition(anchor: &user::Model, order: UserOrder) -> Condition {
    let column = order_column(order.field);
    let value: Value = match order.field {
        UserOrderField::CreatedAt => anchor.created_at.into(),
        UserOrderField::LastSeenAt => anchor.last_seen_at.into(),
        UserOrderField::DeviceId => anchor.device_id.clone().into(),
    };

    let (past_anchor, tied) = match order.direction {
        SortDirection::Asc => (
            column.gt(value.clone()),
            user::Column::Id.gte(anchor.id),
        ),
        SortDirection::Desc => (
            column.lt(value.clone()),
            user::Column::Id.lte(anchor.id),
        ),
    };

    Condition::any()
        .add(past_anchor)
        .add(Condition::all().add(column.eq(value)).add(tied))
}

#[async_trait]
impl UserRepository for UserStore {
    async fn create(&self, data: CreateUser) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            device_id: Set(data.device_id),
            display_name: Set(data.display_name),
            last_seen_at: Set(data.last_seen_at.unwrap_or(now)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(User::from(model))
    }

    async fn insert_for_device(&self, data: NewDeviceUser) -> AppResult<Option<User>> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(id),
            device_id: Set(data.into_device_id()),
            display_name: Set(None),
            last_seen_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // The unique index on device_id decides concurrent first contacts
        let inserted = UserEntity::insert(active_model)
            .on_conflict(
                OnConflict::column(user::Column::DeviceId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted == 0 {
            return Ok(None);
        }

        let model = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(User::from))
    }

    async fn find_by_device_id(&self, device_id: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::DeviceId.eq(device_id))
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn find_details(&self, id: Uuid) -> AppResult<Option<UserDetails>> {
        let Some(model) = UserEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let wallets = model
            .find_related(wallet::Entity)
            .order_by_asc(wallet::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let sessions = model
            .find_related(session::Entity)
            .order_by_desc(session::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let push_tokens = model
            .find_related(push_token::Entity)
            .order_by_desc(push_token::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(Some(UserDetails {
            user: User::from(model),
            wallets: wallets.into_iter().map(Into::into).collect(),
            sessions: sessions.into_iter().map(Into::into).collect(),
            push_tokens: push_tokens.into_iter().map(Into::into).collect(),
        }))
    }

    async fn find_device_user(&self, device_id: &str) -> AppResult<Option<DeviceUser>> {
        let Some(model) = UserEntity::find()
            .filter(user::Column::DeviceId.eq(device_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let wallets = model
            .find_related(wallet::Entity)
            .order_by_asc(wallet::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let sessions = model
            .find_related(session::Entity)
            .order_by_desc(session::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(Some(DeviceUser {
            user: User::from(model),
            wallets: wallets.into_iter().map(Into::into).collect(),
            sessions: sessions.into_iter().map(Into::into).collect(),
        }))
    }

    async fn find_profile(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        let Some(model) = UserEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let wallets = model
            .find_related(wallet::Entity)
            .order_by_asc(wallet::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut wallets_with_transactions = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            let transactions = wallet
                .find_related(transaction::Entity)
                .order_by_desc(transaction::Column::Timestamp)
                .order_by_desc(transaction::Column::Id)
                .limit(RECENT_TRANSACTIONS_LIMIT)
                .all(&self.db)
                .await?;

            wallets_with_transactions.push(WalletWithTransactions {
                wallet: wallet.into(),
                transactions: transactions.into_iter().map(Into::into).collect(),
            });
        }

        let sessions = model
            .find_related(session::Entity)
            .filter(session::Column::Revoked.eq(false))
            .order_by_desc(session::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let push_tokens = model
            .find_related(push_token::Entity)
            .filter(push_token::Column::Active.eq(true))
            .order_by_desc(push_token::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(Some(UserProfile {
            user: User::from(model),
            wallets: wallets_with_transactions,
            sessions: sessions.into_iter().map(Into::into).collect(),
            push_tokens: push_tokens.into_iter().map(Into::into).collect(),
        }))
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> AppResult<User> {
        let user = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = user.into();

        if let Some(display_name) = data.display_name {
            active.display_name = Set(Some(display_name));
        }
        if let Some(last_seen_at) = data.last_seen_at {
            active.last_seen_at = Set(last_seen_at);
        }
        active.updated_at = Set(Utc::now());

        // The row may disappear between the read and the write
        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => AppError::NotFound,
            other => AppError::from(other),
        })?;
        Ok(User::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn list(&self, query: &ListUsersQuery) -> AppResult<Vec<UserSummary>> {
        let mut select = UserEntity::find().filter(filter_condition(&query.filter));

        if let Some(cursor) = query.cursor {
            let Some(anchor) = UserEntity::find_by_id(cursor).one(&self.db).await? else {
                return Ok(Vec::new());
            };
            select = select.filter(cursor_condition(&anchor, query.order_by));
        }

        let users = apply_order(select, query.order_by)
            .offset(query.offset())
            .limit(query.page_size())
            .all(&self.db)
            .await?;

        if users.is_empty() {
            return Ok(Vec::new());
        }

        let wallets = users
            .load_many(
                wallet::Entity::find().order_by_asc(wallet::Column::CreatedAt),
                &self.db,
            )
            .await?;

        Ok(users
            .into_iter()
            .zip(wallets)
            .map(|(user, wallets)| UserSummary {
                user: User::from(user),
                wallets: wallets.into_iter().map(Into::into).collect(),
            })
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> AppResult<u64> {
        let total = UserEntity::find()
            .filter(filter_condition(filter))
            .count(&self.db)
            .await?;

        Ok(total)
    }
}
