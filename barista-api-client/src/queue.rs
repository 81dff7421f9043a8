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

//! Virtual queue endpoints.

use barista_types::api::{JoinQueueRequest, OrderType, QueueStatus};

use crate::error::ApiError;
use crate::{parse_json, BaristaApiClient};

impl BaristaApiClient {
    /// Calls `GET /api/queue/status`.
    pub async fn get_queue_status(&self) -> Result<QueueStatus, ApiError> {
        let response = self.get("/api/queue/status").send().await?;
        parse_json(response).await
    }

    /// Calls `POST /api/queue/join`.
    pub async fn join_queue(
        &self,
        customer_id: &str,
        order_type: OrderType,
    ) -> Result<QueueStatus, ApiError> {
        let body = JoinQueueRequest {
            customer_id: customer_id.to_string(),
            order_type,
        };
        let response = self.post("/api/queue/join").json(&body).send().await?;
        parse_json(response).await
    }
}
