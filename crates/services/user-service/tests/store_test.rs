//! Store tests against in-memory SQLite with the real migrations.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::Span;
use uuid::Uuid;

use common::{AppError, DatabaseConfig};
use domain::{
    CreateUser, ListUsersQuery, NewDeviceUser, SortDirection, UpdateUser, User, UserFilter,
    UserOrder, UserOrderField,
};
use user_service_lib::infra::Database;
use user_service_lib::repository::entities::{push_token, session, transaction, wallet};
use user_service_lib::repository::{UserRepository, UserStore};
use user_service_lib::service::{UserManager, UsersService};

// =============================================================================
// Test Helpers
// =============================================================================

async fn setup() -> (Database, UserStore) {
    // One connection: every pooled connection would get its own in-memory database
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    let db = Database::connect(&config)
        .await
        .expect("in-memory database should migrate");
    let store = UserStore::new(db.get_connection());
    (db, store)
}

async fn create_user(store: &UserStore, device_id: &str) -> User {
    store
        .create(CreateUser {
            device_id: device_id.to_string(),
            display_name: None,
            last_seen_at: None,
        })
        .await
        .expect("create user")
}

async fn add_wallet(db: &Database, user_id: Uuid, address: &str) -> Uuid {
    let id = Uuid::new_v4();
    wallet::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        address: Set(address.to_string()),
        currency: Set("XMR".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db.connection())
    .await
    .expect("insert wallet");
    id
}

async fn add_session(db: &Database, user_id: Uuid, revoked: bool) -> Uuid {
    let id = Uuid::new_v4();
    session::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        user_agent: Set(Some("test-agent".to_string())),
        revoked: Set(revoked),
        created_at: Set(Utc::now()),
    }
    .insert(db.connection())
    .await
    .expect("insert session");
    id
}

async fn add_push_token(db: &Database, user_id: Uuid, token: &str, active: bool) -> Uuid {
    let id = Uuid::new_v4();
    push_token::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        token: Set(token.to_string()),
        platform: Set("ios".to_string()),
        active: Set(active),
        created_at: Set(Utc::now()),
    }
    .insert(db.connection())
    .await
    .expect("insert push token");
    id
}

// =============================================================================
// Find-or-create
// =============================================================================

#[tokio::test]
async fn test_insert_for_device_is_idempotent_on_device_id() {
    let (_db, store) = setup().await;

    let first = store
        .insert_for_device(NewDeviceUser::new("device-a").unwrap())
        .await
        .unwrap();
    let second = store
        .insert_for_device(NewDeviceUser::new("device-a").unwrap())
        .await
        .unwrap();

    let first = first.expect("first insert creates the row");
    assert_eq!(first.device_id, "device-a");
    assert!(first.display_name.is_none());
    assert!(second.is_none());
    assert_eq!(store.count(&UserFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_find_or_create_creates_once_then_touches() {
    let (_db, store) = setup().await;
    let store = Arc::new(store);
    let service = UserManager::new(store.clone(), Span::none());

    let created = service.find_or_create_by_device_id("device-b").await.unwrap();
    let again = service.find_or_create_by_device_id("device-b").await.unwrap();

    assert_eq!(created.device_id, "device-b");
    assert_eq!(again.id, created.id);
    assert!(again.last_seen_at >= created.last_seen_at);
    assert_eq!(store.count(&UserFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_duplicate_device_id_is_store_error() {
    let (_db, store) = setup().await;
    create_user(&store, "device-dup").await;

    let result = store
        .create(CreateUser {
            device_id: "device-dup".to_string(),
            display_name: None,
            last_seen_at: None,
        })
        .await;

    assert!(matches!(result, Err(AppError::Database(_))));
}

// =============================================================================
// Lookups
// =============================================================================

#[tokio::test]
async fn test_find_details_missing_is_none() {
    let (_db, store) = setup().await;
    assert!(store.find_details(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_details_includes_all_relations() {
    let (db, store) = setup().await;
    let user = create_user(&store, "device-details").await;
    add_wallet(&db, user.id, "addr-1").await;
    add_session(&db, user.id, true).await;
    add_push_token(&db, user.id, "token-1", false).await;

    let details = store.find_details(user.id).await.unwrap().unwrap();

    assert_eq!(details.user.id, user.id);
    assert_eq!(details.wallets.len(), 1);
    assert_eq!(details.sessions.len(), 1);
    assert_eq!(details.push_tokens.len(), 1);
}

#[tokio::test]
async fn test_find_device_user_omits_push_tokens() {
    let (db, store) = setup().await;
    let user = create_user(&store, "device-c").await;
    add_wallet(&db, user.id, "addr-c").await;
    add_session(&db, user.id, false).await;
    add_push_token(&db, user.id, "token-c", true).await;

    let found = store.find_device_user("device-c").await.unwrap().unwrap();

    assert_eq!(found.user.id, user.id);
    assert_eq!(found.wallets.len(), 1);
    assert_eq!(found.sessions.len(), 1);

    let json = serde_json::to_value(&found).unwrap();
    assert!(json.get("push_tokens").is_none());
}

#[tokio::test]
async fn test_find_device_user_missing_is_none() {
    let (_db, store) = setup().await;
    assert!(store.find_device_user("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_profile_keeps_fifty_most_recent_transactions() {
    let (db, store) = setup().await;
    let user = create_user(&store, "device-ledger").await;
    let wallet_id = add_wallet(&db, user.id, "addr-ledger").await;

    let base = Utc::now() - Duration::hours(1);
    for i in 0..60i64 {
        transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            wallet_id: Set(wallet_id),
            amount: Set(i),
            kind: Set("deposit".to_string()),
            timestamp: Set(base + Duration::seconds(i)),
        }
        .insert(db.connection())
        .await
        .unwrap();
    }

    let profile = store.find_profile(user.id).await.unwrap().unwrap();
    let transactions = &profile.wallets[0].transactions;

    assert_eq!(transactions.len(), 50);
    assert_eq!(transactions.first().unwrap().amount, 59);
    assert_eq!(transactions.last().unwrap().amount, 10);
    assert!(transactions
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
}

#[tokio::test]
async fn test_profile_only_live_sessions_and_active_tokens() {
    let (db, store) = setup().await;
    let user = create_user(&store, "device-profile").await;
    let live = add_session(&db, user.id, false).await;
    add_session(&db, user.id, true).await;
    let active = add_push_token(&db, user.id, "token-on", true).await;
    add_push_token(&db, user.id, "token-off", false).await;

    let profile = store.find_profile(user.id).await.unwrap().unwrap();

    assert_eq!(profile.sessions.len(), 1);
    assert_eq!(profile.sessions[0].id, live);
    assert!(profile.sessions.iter().all(|s| s.is_active()));
    assert_eq!(profile.push_tokens.len(), 1);
    assert_eq!(profile.push_tokens[0].id, active);
}

#[tokio::test]
async fn test_profile_missing_is_none() {
    let (_db, store) = setup().await;
    assert!(store.find_profile(Uuid::new_v4()).await.unwrap().is_none());
}

// =============================================================================
// Update and delete
// =============================================================================

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let (_db, store) = setup().await;
    let user = create_user(&store, "device-upd").await;

    let updated = store
        .update(
            user.id,
            UpdateUser {
                display_name: Some("Ada".to_string()),
                last_seen_at: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.display_name.as_deref(), Some("Ada"));
    assert_eq!(updated.device_id, "device-upd");
    assert!(updated.updated_at >= user.updated_at);
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let (_db, store) = setup().await;

    let result = store
        .update(Uuid::new_v4(), UpdateUser::last_seen(Utc::now()))
        .await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let (_db, store) = setup().await;
    let result = store.delete(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_delete_cascades_to_owned_rows() {
    let (db, store) = setup().await;
    let user = create_user(&store, "device-del").await;
    add_wallet(&db, user.id, "addr-del").await;
    add_session(&db, user.id, false).await;
    add_push_token(&db, user.id, "token-del", true).await;

    store.delete(user.id).await.unwrap();

    let wallets = wallet::Entity::find()
        .filter(wallet::Column::UserId.eq(user.id))
        .count(db.connection())
        .await
        .unwrap();
    let sessions = session::Entity::find()
        .filter(session::Column::UserId.eq(user.id))
        .count(db.connection())
        .await
        .unwrap();
    assert_eq!(wallets, 0);
    assert_eq!(sessions, 0);
    assert!(store.find_details(user.id).await.unwrap().is_none());
}

// =============================================================================
// Listing
// =============================================================================

async fn seed_devices(store: &UserStore, n: usize) -> Vec<User> {
    let mut users = Vec::with_capacity(n);
    for i in 0..n {
        users.push(create_user(store, &format!("device-{i:02}")).await);
    }
    users
}

fn by_device_asc() -> UserOrder {
    UserOrder {
        field: UserOrderField::DeviceId,
        direction: SortDirection::Asc,
    }
}

#[tokio::test]
async fn test_list_skip_and_take() {
    let (_db, store) = setup().await;
    seed_devices(&store, 15).await;

    let query = ListUsersQuery {
        skip: Some(10),
        take: Some(5),
        order_by: by_device_asc(),
        ..Default::default()
    };
    let page = store.list(&query).await.unwrap();
    let devices: Vec<_> = page.iter().map(|u| u.user.device_id.as_str()).collect();

    assert_eq!(
        devices,
        ["device-10", "device-11", "device-12", "device-13", "device-14"]
    );
    assert_eq!(store.count(&query.filter).await.unwrap(), 15);
}

#[tokio::test]
async fn test_list_cursor_is_inclusive() {
    let (_db, store) = setup().await;
    let users = seed_devices(&store, 8).await;

    let query = ListUsersQuery {
        take: Some(3),
        cursor: Some(users[5].id),
        order_by: by_device_asc(),
        ..Default::default()
    };
    let page = store.list(&query).await.unwrap();
    let devices: Vec<_> = page.iter().map(|u| u.user.device_id.as_str()).collect();

    assert_eq!(devices, ["device-05", "device-06", "device-07"]);
}

#[tokio::test]
async fn test_list_descending_cursor() {
    let (_db, store) = setup().await;
    let users = seed_devices(&store, 8).await;

    let query = ListUsersQuery {
        take: Some(2),
        cursor: Some(users[3].id),
        order_by: UserOrder {
            field: UserOrderField::DeviceId,
            direction: SortDirection::Desc,
        },
        ..Default::default()
    };
    let page = store.list(&query).await.unwrap();
    let devices: Vec<_> = page.iter().map(|u| u.user.device_id.as_str()).collect();

    assert_eq!(devices, ["device-03", "device-02"]);
}

#[tokio::test]
async fn test_list_unknown_cursor_is_empty() {
    let (_db, store) = setup().await;
    seed_devices(&store, 3).await;

    let query = ListUsersQuery {
        cursor: Some(Uuid::new_v4()),
        ..Default::default()
    };

    assert!(store.list(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_filters_and_loads_wallets() {
    let (db, store) = setup().await;
    let users = seed_devices(&store, 3).await;
    store
        .update(
            users[1].id,
            UpdateUser {
                display_name: Some("Grace Hopper".to_string()),
                last_seen_at: None,
            },
        )
        .await
        .unwrap();
    add_wallet(&db, users[1].id, "addr-grace-1").await;
    add_wallet(&db, users[1].id, "addr-grace-2").await;

    let filter = UserFilter {
        display_name_contains: Some("Hopper".to_string()),
        ..Default::default()
    };
    let query = ListUsersQuery {
        filter: filter.clone(),
        ..Default::default()
    };
    let page = store.list(&query).await.unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0].user.id, users[1].id);
    assert_eq!(page[0].wallets.len(), 2);
    assert_eq!(store.count(&filter).await.unwrap(), 1);
}

#[tokio::test]
async fn test_list_name_filter_matches_wildcards_literally() {
    let (_db, store) = setup().await;
    let users = seed_devices(&store, 4).await;
    for (user, name) in users.iter().zip(["100% real", "100 percent", "a_b", "axb"]) {
        store
            .update(
                user.id,
                UpdateUser {
                    display_name: Some(name.to_string()),
                    last_seen_at: None,
                },
            )
            .await
            .unwrap();
    }

    for (fragment, expected) in [("100%", users[0].id), ("a_b", users[2].id)] {
        let filter = UserFilter {
            display_name_contains: Some(fragment.to_string()),
            ..Default::default()
        };
        let query = ListUsersQuery {
            filter: filter.clone(),
            ..Default::default()
        };
        let page = store.list(&query).await.unwrap();

        assert_eq!(page.len(), 1, "fragment {fragment}");
        assert_eq!(page[0].user.id, expected);
        assert_eq!(store.count(&filter).await.unwrap(), 1);
    }
}

#[tokio::test]
async fn test_service_list_reports_page_metadata() {
    let (_db, store) = setup().await;
    seed_devices(&store, 12).await;
    let service = UserManager::new(Arc::new(store), Span::none());

    let page = service
        .list(ListUsersQuery {
            skip: Some(10),
            take: Some(5),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.meta.page, 3);
    assert_eq!(page.meta.page_size, 5);
    assert_eq!(page.meta.total, 12);
    assert_eq!(page.meta.total_pages, 3);
    assert_eq!(page.data.len(), 2);
}
