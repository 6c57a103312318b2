/// Checkout
///
/// # Endpoint
///
/// ```text
/// POST /?action=order
/// X-User-Id: <id>
/// ```
///
/// # Request
///
/// ```json
/// { "items": [{ "product_id": 1, "quantity": 2, "price": 150 }] }
/// ```
///
/// 201 with `{"order": ...}`. The total is debited from the caller's balance
/// in the same transaction that records the order.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    handler::decode_body,
    identity::Principal,
    response::ApiResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tgshop_shared::{models::order::NewOrderItem, services::checkout};
use validator::Validate;

/// One line of an order request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemRequest {
    pub product_id: i64,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price: i64,
}

/// Order request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct OrderRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "No items in order"), nested)]
    pub items: Vec<LineItemRequest>,
}

impl From<LineItemRequest> for NewOrderItem {
    fn from(item: LineItemRequest) -> Self {
        NewOrderItem {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// Places an order for the caller
pub async fn place_order(
    state: &AppState,
    principal: Option<Principal>,
    body: &[u8],
) -> ApiResult<ApiResponse> {
    let principal = principal.ok_or_else(ApiError::unauthorized)?;

    let req: OrderRequest = decode_body(body)?;
    req.validate()?;

    let items = req.items.into_iter().map(NewOrderItem::from).collect();

    let order = checkout::place_order(
        &state.db,
        principal.user_id,
        items,
        state.config.orders.pricing,
    )
    .await?;

    Ok(ApiResponse::created(json!({ "order": order })))
}
