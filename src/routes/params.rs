use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

// Paging fields live inline on each query struct: serde_urlencoded (what
// axum's `Query` uses) buffers flattened fields as strings and then fails
// to deserialize numeric types through `#[serde(flatten)]`.
fn normalize_paging(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;
    (page, per_page, offset)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub fabric_type: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub min_price: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub max_price: Option<Decimal>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize_paging(self.page, self.per_page)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize_paging(self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_clamps() {
        assert_eq!(normalize_paging(None, None), (1, 20, 0));
        assert_eq!(normalize_paging(Some(-3), Some(10_000)), (1, 100, 0));
        assert_eq!(normalize_paging(Some(3), Some(10)), (3, 10, 20));
    }

    #[test]
    fn product_query_parses_from_a_query_string() {
        let query: ProductQuery =
            serde_urlencoded::from_str("page=2&per_page=10&q=bazin&sort_order=asc").unwrap();
        assert_eq!(query.normalize(), (2, 10, 10));
        assert_eq!(query.q.as_deref(), Some("bazin"));
        assert!(matches!(query.sort_order, Some(SortOrder::Asc)));

        let empty: ProductQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(empty.normalize(), (1, 20, 0));
    }

    #[test]
    fn order_list_query_parses_paging_params() {
        let query: OrderListQuery =
            serde_urlencoded::from_str("page=2&per_page=10&status=pending").unwrap();
        assert_eq!(query.normalize(), (2, 10, 10));
        assert_eq!(query.status.as_deref(), Some("pending"));
    }
}
