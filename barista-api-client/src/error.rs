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

use thiserror::Error;

/// Errors returned by [`BaristaApiClient`](crate::BaristaApiClient) methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested resource was not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-2xx response.
    #[error("API Error ({status}): {body}")]
    Status { status: u16, body: String },

    /// A network or transport error.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}
