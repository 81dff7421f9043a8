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

//! REST client tests against a one-shot in-process HTTP responder.

use barista_api_client::api::{
    CreateOrderRequest, CustomerInfo, MenuResponse, OrderLine, OrderType, QueueState,
};
use barista_api_client::{ApiConfig, ApiError, BaristaApiClient};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct Recorded {
    request_line: String,
    body: String,
}

impl Recorded {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

/// Answer exactly one request with `status` and `body`.
async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .map(|(_, v)| v.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let reason = match status {
            200 => "OK",
            201 => "Created",
            404 => "Not Found",
            _ => "Error",
        };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();

        Recorded {
            request_line: head.lines().next().unwrap_or_default().to_string(),
            body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
        }
    });
    (format!("http://{addr}"), handle)
}

fn client_for(base_url: &str, offline_fallback: bool) -> BaristaApiClient {
    BaristaApiClient::new(ApiConfig {
        api_url: base_url.to_string(),
        offline_fallback,
        ..Default::default()
    })
}

/// Answer with a 200 whose body is cut short of its `Content-Length`.
async fn serve_truncated() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut chunk = [0u8; 4096];
        let _ = stream.read(&mut chunk).await;
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\n\r\n{\"categories\"")
            .await
            .unwrap();
        stream.shutdown().await.ok();
    });
    format!("http://{addr}")
}

/// A base URL nothing listens on.
async fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

const MENU: &str = r#"{
  "categories": ["coffee", "food"],
  "items": [
    {"id": "7", "name": "Flat White", "price": 3.8, "category": "coffee",
     "isHot": true, "availability": {"isAvailable": true, "estimatedTime": 4}},
    {"id": "9", "name": "Croissant", "price": 2.5, "category": "food",
     "availability": {"isAvailable": false}}
  ]
}"#;

#[tokio::test]
async fn test_get_menu() {
    let (base, server) = serve_once(200, MENU).await;
    let menu = client_for(&base, false).get_menu().await.unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(recorded.request_line, "GET /api/menu HTTP/1.1");
    assert_eq!(menu.items.len(), 2);
    let coffee: Vec<_> = menu.items_in_category("coffee").collect();
    assert_eq!(coffee[0].name, "Flat White");
    assert!(!menu.items[1].availability.is_available);
}

#[tokio::test]
async fn test_create_order_posts_json() {
    let (base, server) = serve_once(
        201,
        r#"{"order_id":"o-1","total":7.6,"status":"pending","payment_url":"https://pay/o-1"}"#,
    )
    .await;
    let request = CreateOrderRequest {
        items: vec![OrderLine {
            id: "line-1".to_string(),
            menu_item_id: "7".to_string(),
            quantity: 2,
            price: 3.8,
            customizations: None,
        }],
        customer_info: Some(CustomerInfo {
            name: Some("Ada".to_string()),
            ..Default::default()
        }),
    };

    let order = client_for(&base, false).create_order(&request).await.unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(recorded.request_line, "POST /api/orders HTTP/1.1");
    let body = recorded.json();
    assert_eq!(body["items"][0]["menuItemId"], "7");
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["customer_info"]["name"], "Ada");
    assert_eq!(order.order_id, "o-1");
    assert_eq!(order.payment_url.as_deref(), Some("https://pay/o-1"));
}

#[tokio::test]
async fn test_update_order_status_uses_put() {
    let (base, server) = serve_once(200, r#"{"success":true}"#).await;
    let result = client_for(&base, false)
        .update_order_status("o-1", "ready")
        .await
        .unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(recorded.request_line, "PUT /api/orders/o-1/status HTTP/1.1");
    assert_eq!(recorded.json()["status"], "ready");
    assert_eq!(result["success"], true);
}

#[tokio::test]
async fn test_join_queue() {
    let (base, server) = serve_once(
        200,
        r#"{"position":4,"estimatedWaitTime":12,"totalInQueue":9,"orderType":"delivery","status":"waiting"}"#,
    )
    .await;
    let status = client_for(&base, false)
        .join_queue("cust-1", OrderType::Delivery)
        .await
        .unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(recorded.request_line, "POST /api/queue/join HTTP/1.1");
    assert_eq!(recorded.json()["customer_id"], "cust-1");
    assert_eq!(recorded.json()["order_type"], "delivery");
    assert_eq!(status.position, 4);
    assert_eq!(status.status, QueueState::Waiting);
}

#[tokio::test]
async fn test_analytics_timeframe_query() {
    let (base, server) = serve_once(
        200,
        r#"{"totalConversations":10,"totalOrders":4,"conversionRate":0.4,"customerSatisfaction":4.6,
            "popularItems":[],"emotionalInsights":{"topEmotions":["happy"],"supportSessionsCount":2}}"#,
    )
    .await;
    let analytics = client_for(&base, false).get_analytics("30d").await.unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(
        recorded.request_line,
        "GET /api/analytics/dashboard?timeframe=30d HTTP/1.1"
    );
    assert_eq!(analytics.total_orders, 4);
    assert_eq!(analytics.emotional_insights.top_emotions, vec!["happy"]);
}

#[tokio::test]
async fn test_weather_location_is_encoded() {
    let (base, server) = serve_once(
        200,
        r#"{"weather":{"condition":"rain","temperature":11.0,"humidity":0.9},
            "recommendations":{"drinks":["Hot chocolate"],"food":[],"mood":"cozy","suggestion":"Stay warm"}}"#,
    )
    .await;
    let weather = client_for(&base, false)
        .get_weather_recommendations(Some("48.85,2.35"))
        .await
        .unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(
        recorded.request_line,
        "GET /api/recommendations/weather?location=48.85%2C2.35 HTTP/1.1"
    );
    assert_eq!(weather.recommendations.suggestion, "Stay warm");
}

#[tokio::test]
async fn test_knowledge_search_requests_five_results() {
    let (base, server) = serve_once(
        200,
        r#"{"response":"We open at 7am","confidence":0.92,"sources":["hours.md"]}"#,
    )
    .await;
    let answer = client_for(&base, false)
        .search_knowledge("When do you open?")
        .await
        .unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(
        recorded.request_line,
        "POST /api/project-knowledge/search HTTP/1.1"
    );
    assert_eq!(recorded.json()["query"], "When do you open?");
    assert_eq!(recorded.json()["max_results"], 5);
    assert_eq!(answer.sources, vec!["hours.md"]);
}

#[tokio::test]
async fn test_analyze_emotion() {
    let (base, server) = serve_once(
        200,
        r#"{"emotion":"stressed","confidence":0.8,"recommendations":["Try chamomile"],
            "breathingExercise":{"instruction":"Breathe in for 4","duration":60}}"#,
    )
    .await;
    let state = client_for(&base, false)
        .analyze_emotion("long day at work")
        .await
        .unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(recorded.json()["text"], "long day at work");
    assert_eq!(state.emotion, "stressed");
    assert_eq!(state.breathing_exercise.unwrap().duration, 60);
}

#[tokio::test]
async fn test_not_found_maps_to_typed_error() {
    let (base, server) = serve_once(404, r#"{"detail":"no such item"}"#).await;
    let err = client_for(&base, false)
        .get_menu_item("999")
        .await
        .unwrap_err();
    let recorded = server.await.unwrap();

    assert_eq!(recorded.request_line, "GET /api/menu/items/999 HTTP/1.1");
    assert!(matches!(err, ApiError::NotFound(body) if body.contains("no such item")));
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let (base, _server) = serve_once(503, "brewing machine down").await;
    let err = client_for(&base, false).get_queue_status().await.unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "brewing machine down");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bad_body_is_a_decode_error() {
    let (base, _server) = serve_once(200, "<html>oops</html>").await;
    let err = client_for(&base, false).get_menu().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_truncated_body_is_an_http_error() {
    let base = serve_truncated().await;
    let err = client_for(&base, false).get_queue_status().await.unwrap_err();
    assert!(matches!(err, ApiError::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_without_fallback_is_an_error() {
    let base = dead_base_url().await;
    let err = client_for(&base, false).get_menu().await.unwrap_err();
    assert!(matches!(err, ApiError::Http(_)));
}

#[tokio::test]
async fn test_offline_fallback_serves_placeholders() {
    let base = dead_base_url().await;
    let client = client_for(&base, true);

    assert_eq!(client.get_menu().await.unwrap(), MenuResponse::offline());
    let answer = client.search_knowledge("anything").await.unwrap();
    assert_eq!(answer.confidence, 0.5);
    assert!(answer.response.starts_with("Offline mode"));

    // Only the menu and knowledge search have placeholders.
    assert!(client.get_queue_status().await.is_err());
}

#[tokio::test]
async fn test_failed_health_check_switches_to_offline_mode() {
    let (base, _server) = serve_once(500, "down").await;
    let client = client_for(&base, true);

    assert!(client.health_check().await.is_err());
    assert!(client.is_offline());

    // No server is listening any more; the placeholder comes without a request.
    assert_eq!(client.get_menu().await.unwrap(), MenuResponse::offline());
}
