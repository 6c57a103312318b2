/// Catalog listing
///
/// # Endpoint
///
/// ```text
/// GET /?action=products[&category=<name>]
/// ```
///
/// `category` absent, empty or `all` lists every in-stock product.

use crate::{app::AppState, error::ApiResult, response::ApiResponse};
use serde_json::json;
use tgshop_shared::models::product::{CategoryFilter, Product};

/// Lists in-stock products, newest first
pub async fn list_products(state: &AppState, category: Option<&str>) -> ApiResult<ApiResponse> {
    let filter = CategoryFilter::from_query(category);
    let products = Product::list_in_stock(&state.db, &filter).await?;

    tracing::debug!(?filter, count = products.len(), "Listed products");

    Ok(ApiResponse::ok(json!({ "products": products })))
}
