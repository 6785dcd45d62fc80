use std::sync::Arc;

use bazar_api::{
    cart::CartStore,
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::cart::AddToCartRequest,
    dto::orders::CheckoutRequest,
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    error::AppError,
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentMethod},
    routes::admin::UpdateOrderStatusRequest,
    services::{admin_service, cart_service, order_service, product_service},
    state::AppState,
};
use rust_decimal_macros::dec;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: user fills a cart (merge-by-id), checks out, the cart
// empties, and an admin walks the order forward one status at a time.
#[tokio::test]
async fn cart_checkout_and_status_lifecycle() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "user", "user@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Bazin Riche Test".into()),
        description: Set(Some("Tissu pour les tests".into())),
        price: Set(dec!(1000)),
        stock: Set(10),
        images: Set(serde_json::json!(["https://img.example/bazin.jpg"])),
        fabric_type: Set("bazin".into()),
        fabric_subtype: Set(Some("Riche".into())),
        unit: Set("mètre".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    // Empty cart cannot be submitted.
    let rejected = order_service::checkout(&state, &auth_user, customer_info()).await;
    assert!(rejected.is_err(), "empty-cart checkout must be rejected");

    // Two adds of the same product merge into one line.
    cart_service::add_to_cart(
        &state,
        &auth_user,
        AddToCartRequest {
            product_id: product.id,
            quantity: dec!(2),
        },
    )
    .await?;
    let cart = cart_service::add_to_cart(
        &state,
        &auth_user,
        AddToCartRequest {
            product_id: product.id,
            quantity: dec!(3),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, dec!(5));
    assert_eq!(cart.total, dec!(5000));

    // A quantity below the mètre floor is rejected and leaves the line alone.
    let below_floor =
        cart_service::update_quantity(&state, &auth_user, product.id, dec!(0.2)).await;
    assert!(below_floor.is_err());
    let cart = cart_service::view_cart(&state, &auth_user).await?.data.unwrap();
    assert_eq!(cart.items[0].quantity, dec!(5));

    // A submit with a blank name fails and leaves the cart untouched.
    let blank_name = CheckoutRequest {
        customer_name: "   ".into(),
        ..customer_info()
    };
    let rejected = order_service::checkout(&state, &auth_user, blank_name).await;
    assert!(rejected.is_err(), "blank customer name must be rejected");
    let cart = cart_service::view_cart(&state, &auth_user).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1, "failed checkout must preserve the cart");
    assert_eq!(cart.items[0].quantity, dec!(5));
    assert_eq!(cart.total, dec!(5000));

    // Checkout converts the snapshot into a pending order and empties the cart.
    let checkout = order_service::checkout(&state, &auth_user, customer_info())
        .await?
        .data
        .unwrap();
    assert_eq!(checkout.order.total_amount, dec!(5000));
    assert_eq!(checkout.order.status, OrderStatus::Pending);
    assert_eq!(checkout.items.len(), 1);
    assert_eq!(checkout.items[0].quantity, dec!(5));
    assert!(checkout.handoff_message.contains("5000Fcfa"));

    let cart = cart_service::view_cart(&state, &auth_user).await?.data.unwrap();
    assert!(cart.items.is_empty(), "cart must be empty after checkout");

    // The owner sees the order; the lifecycle is admin-only.
    let own = order_service::get_order(&state, &auth_user, checkout.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(own.order.id, checkout.order.id);

    let forbidden = admin_service::update_order_status(
        &state,
        &auth_user,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Validated,
        },
    )
    .await;
    assert!(forbidden.is_err(), "non-admin must not update status");

    // Skipping a step is rejected; adjacent transitions succeed in order.
    let skipped = admin_service::update_order_status(
        &state,
        &auth_admin,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Delivered,
        },
    )
    .await;
    assert!(skipped.is_err(), "pending cannot jump to delivered");

    let validated = admin_service::update_order_status(
        &state,
        &auth_admin,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Validated,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(validated.status, OrderStatus::Validated);

    let delivered = admin_service::update_order_status(
        &state,
        &auth_admin,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Delivered,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);

    // Delivered is terminal.
    let beyond = admin_service::update_order_status(
        &state,
        &auth_admin,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Validated,
        },
    )
    .await;
    assert!(beyond.is_err(), "delivered orders cannot move again");

    // A product referenced by order rows refuses deletion with a 400, not a
    // database error surfacing as a 500.
    let blocked = product_service::delete_product(&state, &auth_admin, product.id).await;
    assert!(matches!(blocked, Err(AppError::Validation(_))));

    let unordered = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Wax Imprimé Test".into()),
        description: Set(None),
        price: Set(dec!(500)),
        stock: Set(3),
        images: Set(serde_json::json!([])),
        fabric_type: Set("wax".into()),
        fabric_subtype: Set(None),
        unit: Set("mètre".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    product_service::delete_product(&state, &auth_admin, unordered.id).await?;

    Ok(())
}

fn customer_info() -> CheckoutRequest {
    CheckoutRequest {
        customer_name: "Awa".into(),
        delivery_address: "Brazzaville, Poto-Poto".into(),
        phone_number: "+242061234567".into(),
        payment_method: PaymentMethod::Onplace,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, audit_logs, products, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        cart: Arc::new(CartStore::new()),
        config: AppConfig {
            database_url: database_url.to_string(),
            host: "127.0.0.1".into(),
            port: 0,
            seller_phone: "+242000000000".into(),
        },
    })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
