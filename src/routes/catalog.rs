use axum::{Json, Router, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    catalog::{FABRIC_TYPES, FabricType},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct FabricTypeList {
    pub items: Vec<FabricType>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_fabric_types))
}

#[utoipa::path(
    get,
    path = "/api/catalog",
    responses(
        (status = 200, description = "Fabric types with their allowed sale units", body = ApiResponse<FabricTypeList>)
    ),
    tag = "Catalog"
)]
pub async fn list_fabric_types() -> Json<ApiResponse<FabricTypeList>> {
    let data = FabricTypeList {
        items: FABRIC_TYPES.to_vec(),
    };
    Json(ApiResponse::success("Catalog", data, Some(Meta::empty())))
}
