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

//! Analytics, knowledge search, weather and emotional-support endpoints.

use barista_types::api::{
    AnalyticsData, EmotionalState, KnowledgeResponse, KnowledgeSearchRequest,
    WeatherRecommendation,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::{parse_json, BaristaApiClient};

/// Results requested from the knowledge search.
pub const KNOWLEDGE_MAX_RESULTS: u32 = 5;

/// Default analytics window.
pub const DEFAULT_TIMEFRAME: &str = "7d";

impl BaristaApiClient {
    /// Dashboard figures for `timeframe` (e.g. `"7d"`).
    ///
    /// Calls `GET /api/analytics/dashboard?timeframe={timeframe}`.
    pub async fn get_analytics(&self, timeframe: &str) -> Result<AnalyticsData, ApiError> {
        let response = self
            .get("/api/analytics/dashboard")
            .query(&[("timeframe", timeframe)])
            .send()
            .await?;
        parse_json(response).await
    }

    /// Ask the project knowledge base.
    ///
    /// Calls `POST /api/project-knowledge/search`. Falls back to the offline
    /// answer when enabled.
    pub async fn search_knowledge(&self, query: &str) -> Result<KnowledgeResponse, ApiError> {
        let body = KnowledgeSearchRequest {
            query: query.to_string(),
            max_results: KNOWLEDGE_MAX_RESULTS,
        };
        self.with_offline_fallback(KnowledgeResponse::offline, async {
            let response = self
                .post("/api/project-knowledge/search")
                .json(&body)
                .send()
                .await?;
            parse_json(response).await
        })
        .await
    }

    /// Calls `GET /api/recommendations/weather`, with `?location=` when given.
    pub async fn get_weather_recommendations(
        &self,
        location: Option<&str>,
    ) -> Result<WeatherRecommendation, ApiError> {
        let mut request = self.get("/api/recommendations/weather");
        if let Some(location) = location {
            request = request.query(&[("location", location)]);
        }
        let response = request.send().await?;
        parse_json(response).await
    }

    /// Calls `POST /api/emotional-support/analyze`.
    pub async fn analyze_emotion(&self, text: &str) -> Result<EmotionalState, ApiError> {
        let response = self
            .post("/api/emotional-support/analyze")
            .json(&json!({ "text": text }))
            .send()
            .await?;
        parse_json(response).await
    }

    /// Calls `POST /api/emotional-support/recommendations`.
    pub async fn get_therapeutic_recommendations(&self, emotion: &str) -> Result<Value, ApiError> {
        let response = self
            .post("/api/emotional-support/recommendations")
            .json(&json!({ "emotion": emotion }))
            .send()
            .await?;
        parse_json(response).await
    }
}
