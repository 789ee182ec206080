//! Data access layer against a live database.
//!
//! Skipped unless `PIZZA_TEST_DATABASE_URL` is set.

use pizza_core::{Email, FranchiseId, MenuItemId, Price, Role, StoreId};
use pizza_integration_tests::{create_user, test_database, unique, unique_email};
use pizza_service::db::{Database, DbError, get_id};
use pizza_service::models::{
    AdminRef, NewFranchise, NewMenuItem, NewOrder, NewOrderItem, NewStore, UserUpdate,
};
use pizza_service::policy;
use rust_decimal::Decimal;

fn price(units: i64, scale: u32) -> Price {
    Price::new(Decimal::new(units, scale)).unwrap()
}

async fn add_menu_item(db: &Database) -> MenuItemId {
    let admin = create_user(db, vec![Role::Admin]).await;
    let grant = policy::authorize_admin(&admin).unwrap();
    db.menu()
        .add_menu_item(
            &grant,
            &NewMenuItem {
                title: unique("Veggie"),
                description: "A garden of delight".to_owned(),
                image: "pizza1.png".to_owned(),
                price: price(38, 4),
            },
        )
        .await
        .unwrap()
        .id
}

// =============================================================================
// Users and credentials
// =============================================================================

#[tokio::test]
async fn test_get_user_verifies_password() {
    let Some(db) = test_database().await else { return };
    let created = create_user(&db, Vec::new()).await;
    assert_eq!(created.roles, vec![Role::Diner]);

    let found = db.users().get_user(&created.email, "pizza").await.unwrap();
    assert_eq!(found, created);

    let wrong = db.users().get_user(&created.email, "not pizza").await;
    assert!(matches!(wrong, Err(DbError::UnknownUser)));

    let unknown = db.users().get_user(&unique_email("ghost"), "pizza").await;
    assert!(matches!(unknown, Err(DbError::UnknownUser)));
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let Some(db) = test_database().await else { return };
    let created = create_user(&db, Vec::new()).await;

    let again = db
        .users()
        .add_user(&pizza_service::models::NewUser {
            name: "copy".to_owned(),
            email: created.email.clone(),
            password: "pizza".to_owned(),
            roles: Vec::new(),
        })
        .await;
    assert!(matches!(again, Err(DbError::Conflict(_))));

    let shouted = Email::parse(&created.email.as_str().to_uppercase()).unwrap();
    let again = db
        .users()
        .add_user(&pizza_service::models::NewUser {
            name: "copy".to_owned(),
            email: shouted.clone(),
            password: "pizza".to_owned(),
            roles: Vec::new(),
        })
        .await;
    assert!(matches!(again, Err(DbError::Conflict(_))));

    // Login ignores case and returns the address as registered
    let found = db.users().get_user(&shouted, "pizza").await.unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn test_seed_admin_skips_when_an_admin_exists() {
    let Some(db) = test_database().await else { return };
    create_user(&db, vec![Role::Admin]).await;
    assert!(db.users().admin_exists().await.unwrap());

    let email = unique_email("seed");
    let seeded = db
        .users()
        .seed_admin(&pizza_service::models::NewUser {
            name: "default admin".to_owned(),
            email: email.clone(),
            password: "pizza".to_owned(),
            roles: Vec::new(),
        })
        .await
        .unwrap();
    assert!(seeded.is_none());
    assert!(matches!(
        db.users().get_user(&email, "pizza").await,
        Err(DbError::UnknownUser)
    ));
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let Some(db) = test_database().await else { return };
    let user = create_user(&db, vec![Role::Diner]).await;
    let grant = policy::authorize_user(&user, user.id).unwrap();

    let updated = db
        .users()
        .update_user(
            &grant,
            &UserUpdate {
                password: Some("new crust".to_owned()),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, user.name);
    assert_eq!(updated.email, user.email);
    assert_eq!(updated.roles, user.roles);

    assert!(db.users().get_user(&user.email, "new crust").await.is_ok());
    assert!(matches!(
        db.users().get_user(&user.email, "pizza").await,
        Err(DbError::UnknownUser)
    ));

    let renamed = db
        .users()
        .update_user(
            &grant,
            &UserUpdate {
                name: Some("renamed".to_owned()),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "renamed");
    assert_eq!(renamed.email, user.email);

    let untouched = db
        .users()
        .update_user(&grant, &UserUpdate::default())
        .await
        .unwrap();
    assert_eq!(untouched, renamed);
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_session_lifecycle() {
    let Some(db) = test_database().await else { return };
    let user = create_user(&db, Vec::new()).await;
    let token = format!("header.payload.{}", unique("sig"));

    assert!(!db.sessions().is_logged_in(&token).await.unwrap());
    db.sessions().login_user(user.id, &token).await.unwrap();
    assert!(db.sessions().is_logged_in(&token).await.unwrap());

    db.sessions().logout_user(&token).await.unwrap();
    assert!(!db.sessions().is_logged_in(&token).await.unwrap());

    // Idempotent
    db.sessions().logout_user(&token).await.unwrap();
    assert!(!db.sessions().is_logged_in("no-signature").await.unwrap());
}

// =============================================================================
// Id resolution and orders
// =============================================================================

#[tokio::test]
async fn test_get_id() {
    let Some(db) = test_database().await else { return };
    let menu_id = add_menu_item(&db).await;
    let mut conn = db.pool().acquire().await.unwrap();

    let found = get_id(&mut conn, "pizza.menu", "id", menu_id).await.unwrap();
    assert_eq!(found, menu_id.as_i32());

    let missing = get_id(&mut conn, "pizza.menu", "id", i32::MAX).await;
    assert!(matches!(missing, Err(DbError::NoIdFound { .. })));
}

#[tokio::test]
async fn test_order_with_unknown_menu_item_writes_nothing() {
    let Some(db) = test_database().await else { return };
    let diner = create_user(&db, Vec::new()).await;
    let menu_id = add_menu_item(&db).await;
    let admin = create_user(&db, vec![Role::Admin]).await;
    let franchise = db
        .franchises()
        .create_franchise(
            &policy::authorize_admin(&admin).unwrap(),
            &NewFranchise {
                name: unique("franchise"),
                admins: Vec::new(),
            },
        )
        .await
        .unwrap();
    let grant = policy::authorize_franchise(&admin, &franchise).unwrap();
    let store = db
        .franchises()
        .create_store(&grant, &NewStore { name: unique("store") })
        .await
        .unwrap();

    let item = |menu_id| NewOrderItem {
        menu_id,
        description: "Veggie".to_owned(),
        price: price(5, 2),
    };
    let bad = NewOrder {
        franchise_id: franchise.id,
        store_id: store.id,
        items: vec![item(menu_id), item(MenuItemId::new(i32::MAX))],
    };
    let result = db.orders().add_diner_order(&diner, &bad).await;
    assert!(matches!(result, Err(DbError::NoIdFound { .. })));
    let history = db.orders().get_orders(&diner, 1, 10).await.unwrap();
    assert!(history.orders.is_empty());

    let good = NewOrder {
        items: vec![item(menu_id), item(menu_id)],
        ..bad
    };
    let order = db.orders().add_diner_order(&diner, &good).await.unwrap();
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total(), price(10, 2));

    let history = db.orders().get_orders(&diner, 1, 10).await.unwrap();
    assert_eq!(history.diner_id, diner.id);
    assert_eq!(history.page, 1);
    assert_eq!(history.orders, vec![order]);

    let detail = db.franchises().get_franchise(franchise.id).await.unwrap().unwrap();
    let revenue = detail.stores.first().unwrap().total_revenue.unwrap();
    assert_eq!(revenue, price(10, 2));
}

// =============================================================================
// Franchises
// =============================================================================

#[tokio::test]
async fn test_create_franchise_with_unknown_admin_persists_nothing() {
    let Some(db) = test_database().await else { return };
    let admin = create_user(&db, vec![Role::Admin]).await;
    let grant = policy::authorize_admin(&admin).unwrap();
    let name = unique("franchise");

    let result = db
        .franchises()
        .create_franchise(
            &grant,
            &NewFranchise {
                name: name.clone(),
                admins: vec![AdminRef {
                    email: unique_email("ghost"),
                }],
            },
        )
        .await;
    assert!(matches!(result, Err(DbError::UnknownUser)));

    let (found, more) = db
        .franchises()
        .get_franchises(Some(&admin), 0, 10, &name)
        .await
        .unwrap();
    assert!(found.is_empty());
    assert!(!more);
}

#[tokio::test]
async fn test_franchise_paging_and_detail() {
    let Some(db) = test_database().await else { return };
    let admin = create_user(&db, vec![Role::Admin]).await;
    let franchisee = create_user(&db, Vec::new()).await;
    let grant = policy::authorize_admin(&admin).unwrap();
    let prefix = unique("chain");

    for n in 0..3 {
        db.franchises()
            .create_franchise(
                &grant,
                &NewFranchise {
                    name: format!("{prefix}-{n}"),
                    admins: vec![AdminRef {
                        email: franchisee.email.clone(),
                    }],
                },
            )
            .await
            .unwrap();
    }
    let filter = format!("{prefix}*");

    let (first, more) = db
        .franchises()
        .get_franchises(None, 0, 2, &filter)
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert!(more);
    assert!(first.iter().all(|f| f.admins.is_none()));

    let (last, more) = db
        .franchises()
        .get_franchises(None, 1, 2, &filter)
        .await
        .unwrap();
    assert_eq!(last.len(), 1);
    assert!(!more);

    let (all, more) = db
        .franchises()
        .get_franchises(Some(&admin), 0, 3, &filter)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(!more);
    assert!(all.iter().all(|f| f.has_admin(franchisee.id)));

    let own = db
        .franchises()
        .get_user_franchises(&policy::authorize_user(&franchisee, franchisee.id).unwrap())
        .await
        .unwrap();
    assert_eq!(own.len(), 3);

    let (shouted, _) = db
        .franchises()
        .get_franchises(None, 0, 10, &filter.to_uppercase())
        .await
        .unwrap();
    assert_eq!(shouted.len(), 3);
}

#[tokio::test]
async fn test_create_franchise_assigns_repeated_admin_once() {
    let Some(db) = test_database().await else { return };
    let admin = create_user(&db, vec![Role::Admin]).await;
    let franchisee = create_user(&db, Vec::new()).await;
    let grant = policy::authorize_admin(&admin).unwrap();

    let created = db
        .franchises()
        .create_franchise(
            &grant,
            &NewFranchise {
                name: unique("twice"),
                admins: vec![
                    AdminRef {
                        email: franchisee.email.clone(),
                    },
                    AdminRef {
                        email: Email::parse(&franchisee.email.as_str().to_uppercase()).unwrap(),
                    },
                ],
            },
        )
        .await
        .unwrap();
    let admins = created.admins.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins.first().unwrap().email, franchisee.email);

    let detail = db.franchises().get_franchise(created.id).await.unwrap().unwrap();
    assert_eq!(detail.admins.unwrap().len(), 1);
    let refreshed = db.users().get_user_by_id(franchisee.id).await.unwrap().unwrap();
    assert_eq!(
        refreshed.roles,
        vec![
            Role::Diner,
            Role::FranchiseAdmin {
                franchise_id: created.id
            }
        ]
    );
}

#[tokio::test]
async fn test_cross_franchise_store_management_is_denied() {
    let Some(db) = test_database().await else { return };
    let admin = create_user(&db, vec![Role::Admin]).await;
    let owner_a = create_user(&db, Vec::new()).await;
    let grant = policy::authorize_admin(&admin).unwrap();

    let a = db
        .franchises()
        .create_franchise(
            &grant,
            &NewFranchise {
                name: unique("a"),
                admins: vec![AdminRef {
                    email: owner_a.email.clone(),
                }],
            },
        )
        .await
        .unwrap();
    let b = db
        .franchises()
        .create_franchise(
            &grant,
            &NewFranchise {
                name: unique("b"),
                admins: Vec::new(),
            },
        )
        .await
        .unwrap();

    // The franchise's admin list decides, not the roles held by the user value
    let a = db.franchises().get_franchise(a.id).await.unwrap().unwrap();
    let b = db.franchises().get_franchise(b.id).await.unwrap().unwrap();
    assert!(policy::authorize_franchise(&owner_a, &a).is_ok());
    assert!(policy::authorize_franchise(&owner_a, &b).is_err());
}

#[tokio::test]
async fn test_delete_franchise_cascades() {
    let Some(db) = test_database().await else { return };
    let admin = create_user(&db, vec![Role::Admin]).await;
    let franchisee = create_user(&db, Vec::new()).await;
    let diner = create_user(&db, Vec::new()).await;
    let menu_id = add_menu_item(&db).await;
    let grant = policy::authorize_admin(&admin).unwrap();

    let franchise = db
        .franchises()
        .create_franchise(
            &grant,
            &NewFranchise {
                name: unique("doomed"),
                admins: vec![AdminRef {
                    email: franchisee.email.clone(),
                }],
            },
        )
        .await
        .unwrap();
    let store = db
        .franchises()
        .create_store(
            &policy::authorize_franchise(&admin, &franchise).unwrap(),
            &NewStore { name: unique("store") },
        )
        .await
        .unwrap();
    assert_eq!(store.franchise_id, Some(franchise.id));
    db.orders()
        .add_diner_order(
            &diner,
            &NewOrder {
                franchise_id: franchise.id,
                store_id: store.id,
                items: vec![NewOrderItem {
                    menu_id,
                    description: "Veggie".to_owned(),
                    price: price(5, 2),
                }],
            },
        )
        .await
        .unwrap();

    db.franchises()
        .delete_franchise(&grant, franchise.id)
        .await
        .unwrap();

    assert!(db.franchises().get_franchise(franchise.id).await.unwrap().is_none());
    let refreshed = db.users().get_user_by_id(franchisee.id).await.unwrap().unwrap();
    assert_eq!(refreshed.roles, vec![Role::Diner]);

    let history = db.orders().get_orders(&diner, 1, 10).await.unwrap();
    let order = history.orders.first().unwrap();
    assert_eq!(order.franchise_id, None::<FranchiseId>);
    assert_eq!(order.store_id, None::<StoreId>);

    // Missing franchise is a no-op
    db.franchises()
        .delete_franchise(&grant, franchise.id)
        .await
        .unwrap();
}

/// Refuses to delete any franchise named `undeletable-*`, making the last
/// cascade step fail.
const REFUSE_DELETE_TRIGGER: &str = r"
    CREATE OR REPLACE FUNCTION pizza.refuse_undeletable_franchise() RETURNS trigger AS $$
    BEGIN
        IF OLD.name LIKE 'undeletable-%' THEN
            RAISE EXCEPTION 'franchise % cannot be deleted', OLD.id;
        END IF;
        RETURN OLD;
    END;
    $$ LANGUAGE plpgsql;

    CREATE OR REPLACE TRIGGER refuse_undeletable_franchise
    BEFORE DELETE ON pizza.franchise
    FOR EACH ROW EXECUTE FUNCTION pizza.refuse_undeletable_franchise();
";

#[tokio::test]
async fn test_delete_franchise_rolls_back_on_error() {
    let Some(db) = test_database().await else { return };
    sqlx::raw_sql(REFUSE_DELETE_TRIGGER)
        .execute(db.pool())
        .await
        .unwrap();

    let admin = create_user(&db, vec![Role::Admin]).await;
    let franchisee = create_user(&db, Vec::new()).await;
    let diner = create_user(&db, Vec::new()).await;
    let menu_id = add_menu_item(&db).await;
    let grant = policy::authorize_admin(&admin).unwrap();

    let franchise = db
        .franchises()
        .create_franchise(
            &grant,
            &NewFranchise {
                name: unique("undeletable"),
                admins: vec![AdminRef {
                    email: franchisee.email.clone(),
                }],
            },
        )
        .await
        .unwrap();
    let store = db
        .franchises()
        .create_store(
            &policy::authorize_franchise(&admin, &franchise).unwrap(),
            &NewStore { name: unique("store") },
        )
        .await
        .unwrap();
    db.orders()
        .add_diner_order(
            &diner,
            &NewOrder {
                franchise_id: franchise.id,
                store_id: store.id,
                items: vec![NewOrderItem {
                    menu_id,
                    description: "Veggie".to_owned(),
                    price: price(5, 2),
                }],
            },
        )
        .await
        .unwrap();

    let result = db.franchises().delete_franchise(&grant, franchise.id).await;
    assert!(matches!(result, Err(DbError::UnableToDelete(_))));

    let detail = db.franchises().get_franchise(franchise.id).await.unwrap().unwrap();
    assert_eq!(detail.stores.len(), 1);
    assert_eq!(detail.stores.first().unwrap().id, store.id);
    assert!(detail.has_admin(franchisee.id));

    let refreshed = db.users().get_user_by_id(franchisee.id).await.unwrap().unwrap();
    assert!(refreshed.roles.contains(&Role::FranchiseAdmin {
        franchise_id: franchise.id
    }));

    let history = db.orders().get_orders(&diner, 1, 10).await.unwrap();
    let order = history.orders.first().unwrap();
    assert_eq!(order.franchise_id, Some(franchise.id));
    assert_eq!(order.store_id, Some(store.id));
}

#[tokio::test]
async fn test_delete_store_is_idempotent() {
    let Some(db) = test_database().await else { return };
    let admin = create_user(&db, vec![Role::Admin]).await;
    let franchise = db
        .franchises()
        .create_franchise(
            &policy::authorize_admin(&admin).unwrap(),
            &NewFranchise {
                name: unique("stores"),
                admins: Vec::new(),
            },
        )
        .await
        .unwrap();
    let grant = policy::authorize_franchise(&admin, &franchise).unwrap();
    let store = db
        .franchises()
        .create_store(&grant, &NewStore { name: unique("store") })
        .await
        .unwrap();

    db.franchises().delete_store(&grant, store.id).await.unwrap();
    db.franchises().delete_store(&grant, store.id).await.unwrap();

    let detail = db.franchises().get_franchise(franchise.id).await.unwrap().unwrap();
    assert!(detail.stores.is_empty());
}
