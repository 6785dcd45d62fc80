use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::ActiveModelTrait;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::{CartLine, cart_total},
    dto::orders::{CheckoutRequest, CheckoutResponse, OrderList, OrderWithItems},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::product_service::sale_unit_from_column,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Converts the caller's cart snapshot into one durable order plus
/// normalized line rows, all inside a single transaction. The cart is
/// cleared only after the commit succeeds; any failure leaves it intact so
/// the user can simply retry.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    for (field, value) in [
        ("customer_name", &payload.customer_name),
        ("delivery_address", &payload.delivery_address),
        ("phone_number", &payload.phone_number),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }

    let snapshot = state.cart.snapshot(user.user_id);
    if snapshot.is_empty() {
        return Err(AppError::Validation("cart is empty".into()));
    }

    let total_amount = cart_total(&snapshot);
    let order_id = Uuid::new_v4();

    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        customer_name: Set(payload.customer_name),
        delivery_address: Set(payload.delivery_address),
        phone_number: Set(payload.phone_number),
        payment_method: Set(payload.payment_method.as_str().to_string()),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(snapshot.len());
    for line in &snapshot {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            name: Set(line.name.clone()),
            price: Set(line.price),
            quantity: Set(line.quantity),
            unit: Set(line.unit.as_str().to_string()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(item));
    }

    txn.commit().await?;

    // Only now is the snapshot durable; dropping the cart earlier would lose
    // it on a failed write.
    state.cart.clear(user.user_id);

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let order = order_from_entity(order);
    let handoff_message = build_handoff_message(&order, &snapshot);

    Ok(ApiResponse::success(
        "Commande validée",
        CheckoutResponse {
            order,
            items: order_items,
            handoff_message,
            seller_phone: state.config.seller_phone.clone(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        customer_name: model.customer_name,
        delivery_address: model.delivery_address,
        phone_number: model.phone_number,
        payment_method: model
            .payment_method
            .parse()
            .unwrap_or(crate::models::PaymentMethod::Onplace),
        total_amount: model.total_amount,
        status: model.status.parse().unwrap_or(OrderStatus::Pending),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        name: model.name,
        price: model.price,
        quantity: model.quantity,
        unit: sale_unit_from_column(&model.unit),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

/// Prefilled message the storefront forwards to the seller's messaging
/// channel after the confirmation screen.
fn build_handoff_message(order: &Order, lines: &[CartLine]) -> String {
    let mut message = format!(
        "Nouvelle commande #{}\nNom: {}\nAdresse: {}\nTéléphone: {}\n",
        order.id, order.customer_name, order.delivery_address, order.phone_number
    );
    for line in lines {
        message.push_str(&format!(
            "- {} x{} {}\n",
            line.name,
            line.quantity.normalize(),
            line.unit
        ));
    }
    message.push_str(&format!("Total: {}Fcfa", order.total_amount.normalize()));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentMethod;
    use crate::units::SaleUnit;
    use rust_decimal_macros::dec;

    #[test]
    fn handoff_message_lists_lines_and_total() {
        let order = Order {
            id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            customer_name: "Awa".into(),
            delivery_address: "Brazzaville".into(),
            phone_number: "+242061234567".into(),
            payment_method: PaymentMethod::Onplace,
            total_amount: dec!(5000),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let lines = vec![CartLine {
            product_id: Uuid::new_v4(),
            name: "Bazin Riche".into(),
            price: dec!(1000),
            images: vec![],
            quantity: dec!(5),
            unit: SaleUnit::Metre,
        }];

        let message = build_handoff_message(&order, &lines);
        assert!(message.contains("Nom: Awa"));
        assert!(message.contains("Bazin Riche x5 mètre"));
        assert!(message.ends_with("Total: 5000Fcfa"));
    }
}
