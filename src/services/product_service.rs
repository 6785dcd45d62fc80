use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    catalog::find_fabric_type,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::order_items::{Column as OrderItemColumn, Entity as OrderItems},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
    units::SaleUnit,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(fabric_type) = query.fabric_type.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::FabricType.eq(fabric_type.clone()));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(product_from_entity);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let fabric = find_fabric_type(&payload.fabric_type)
        .ok_or_else(|| AppError::Validation(format!("unknown fabric type: {}", payload.fabric_type)))?;

    let unit = payload.unit.unwrap_or(fabric.default_unit);
    if !fabric.allows_unit(unit) {
        return Err(AppError::Validation(format!(
            "{} is not sold per {unit}",
            fabric.name
        )));
    }
    if let Some(subtype) = payload.fabric_subtype.as_deref() {
        if !fabric.has_subtype(subtype) {
            return Err(AppError::Validation(format!(
                "unknown {} subtype: {subtype}",
                fabric.name
            )));
        }
    }
    if payload.price <= Decimal::ZERO {
        return Err(AppError::Validation("price must be positive".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::Validation("stock cannot be negative".into()));
    }

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        images: Set(Value::from(payload.images)),
        fabric_type: Set(fabric.key.to_string()),
        fabric_subtype: Set(payload.fabric_subtype),
        unit: Set(unit.as_str().to_string()),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if let Some(unit) = payload.unit {
        let fabric = find_fabric_type(&existing.fabric_type);
        if let Some(fabric) = fabric {
            if !fabric.allows_unit(unit) {
                return Err(AppError::Validation(format!(
                    "{} is not sold per {unit}",
                    fabric.name
                )));
            }
        }
    }
    if let Some(price) = payload.price {
        if price <= Decimal::ZERO {
            return Err(AppError::Validation("price must be positive".into()));
        }
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::Validation("stock cannot be negative".into()));
        }
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(images) = payload.images {
        active.images = Set(Value::from(images));
    }
    if let Some(subtype) = payload.fabric_subtype {
        active.fabric_subtype = Set(Some(subtype));
    }
    if let Some(unit) = payload.unit {
        active.unit = Set(unit.as_str().to_string());
    }

    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    // order_items snapshots reference their product row, so deleting a
    // product that was ever ordered would violate the FK.
    let referencing_orders = OrderItems::find()
        .filter(OrderItemColumn::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if referencing_orders > 0 {
        return Err(AppError::Validation(
            "product appears in existing orders and cannot be deleted".into(),
        ));
    }

    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        images: images_from_json(model.images),
        fabric_type: model.fabric_type,
        fabric_subtype: model.fabric_subtype,
        unit: sale_unit_from_column(&model.unit),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn sale_unit_from_column(raw: &str) -> SaleUnit {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(unit = raw, "unrecognized sale unit on product row, assuming mètre");
        SaleUnit::default()
    })
}

/// Legacy product rows stored `images` as a bare string; newer rows store a
/// JSON array. Both collapse to a list here so nothing downstream has to care.
pub(crate) fn images_from_json(value: Value) -> Vec<String> {
    match value {
        Value::String(single) => vec![single],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_image_becomes_single_element_list() {
        let images = images_from_json(json!("https://img.example/one.jpg"));
        assert_eq!(images, vec!["https://img.example/one.jpg".to_string()]);
    }

    #[test]
    fn array_images_keep_order_and_drop_non_strings() {
        let images = images_from_json(json!(["a.jpg", 42, "b.jpg", null]));
        assert_eq!(images, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
    }

    #[test]
    fn null_images_become_empty_list() {
        assert!(images_from_json(Value::Null).is_empty());
    }

    #[test]
    fn unknown_unit_falls_back_to_metre() {
        assert_eq!(sale_unit_from_column("furlong"), SaleUnit::Metre);
        assert_eq!(sale_unit_from_column("rouleau"), SaleUnit::Rouleau);
    }
}
