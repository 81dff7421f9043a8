/*
 * Copyright 2025 Barista Chat Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

use barista_types::api::{CreateOrderRequest, OrderResponse, UpdateOrderStatusRequest};
use serde_json::Value;

use crate::error::ApiError;
use crate::{parse_json, BaristaApiClient};

impl BaristaApiClient {
    /// Place an order.
    ///
    /// Calls `POST /api/orders`.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<OrderResponse, ApiError> {
        let response = self.post("/api/orders").json(request).send().await?;
        parse_json(response).await
    }

    /// Order details. The server owns the shape, so the body is returned as is.
    ///
    /// Calls `GET /api/orders/{order_id}`.
    pub async fn get_order(&self, order_id: &str) -> Result<Value, ApiError> {
        let path = format!("/api/orders/{order_id}");
        let response = self.get(&path).send().await?;
        parse_json(response).await
    }

    /// Calls `PUT /api/orders/{order_id}/status`.
    pub async fn update_order_status(&self, order_id: &str, status: &str) -> Result<Value, ApiError> {
        let path = format!("/api/orders/{order_id}/status");
        let body = UpdateOrderStatusRequest {
            status: status.to_string(),
        };
        let response = self.put(&path).json(&body).send().await?;
        parse_json(response).await
    }
}
