use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::{CartLine, cart_total},
    dto::cart::{AddToCartRequest, CartView},
    entity::Products,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::product_service::{images_from_json, sale_unit_from_column},
    state::AppState,
};

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let items = state.cart.snapshot(user.user_id);
    let total = cart_total(&items);
    Ok(ApiResponse::success(
        "OK",
        CartView { items, total },
        Some(Meta::empty()),
    ))
}

/// Resolves the product and adds a snapshotted line to the user's cart.
/// Same product id merges by summing quantities. Deliberately no stock
/// check: the storefront warns about stock before calling this.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Validation("product not found".to_string()))?;

    let line = CartLine {
        product_id: product.id,
        name: product.name,
        price: product.price,
        images: images_from_json(product.images),
        quantity: payload.quantity,
        unit: sale_unit_from_column(&product.unit),
    };
    state.cart.add(user.user_id, line)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        Some("cart"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    view_cart(state, user).await
}

/// Replaces a line's quantity. A line that disappeared in the meantime is a
/// silent no-op rather than an error.
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: Decimal,
) -> AppResult<ApiResponse<CartView>> {
    state.cart.update_quantity(user.user_id, product_id, quantity)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        Some("cart"),
        Some(serde_json::json!({ "product_id": product_id, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    view_cart(state, user).await
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    state.cart.remove(user.user_id, product_id);

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    view_cart(state, user).await
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    state.cart.clear(user.user_id);

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_clear",
        Some("cart"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    view_cart(state, user).await
}
