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

use barista_types::api::{MenuItem, MenuResponse};

use crate::error::ApiError;
use crate::{parse_json, BaristaApiClient};

impl BaristaApiClient {
    /// Full menu with its categories.
    ///
    /// Calls `GET /api/menu`. Falls back to the offline menu when enabled.
    pub async fn get_menu(&self) -> Result<MenuResponse, ApiError> {
        self.with_offline_fallback(MenuResponse::offline, async {
            let response = self.get("/api/menu").send().await?;
            parse_json(response).await
        })
        .await
    }

    /// Calls `GET /api/menu/items/{item_id}`.
    pub async fn get_menu_item(&self, item_id: &str) -> Result<MenuItem, ApiError> {
        let path = format!("/api/menu/items/{item_id}");
        let response = self.get(&path).send().await?;
        parse_json(response).await
    }
}
