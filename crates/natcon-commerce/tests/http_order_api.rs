//! `HttpOrderApi` against a local one-shot HTTP server.

use natcon_commerce::config::OrderApiConfig;
use natcon_commerce::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one connection, answer with `status` and `body`, and hand back the
/// raw request.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{}", addr), handle)
}

fn request() -> OrderRequest {
    let mut cart = Cart::new(Currency::USD);
    cart.add_item("tshirt", "M", 2, 1500, "NatCon Tee").unwrap();
    OrderRequest::new(
        &CartSnapshot::capture(&cart, 1),
        ContactInfo::new("Ada", "ada@example.org"),
        IdempotencyKey::new("idem_test"),
    )
}

fn api(base_url: String) -> HttpOrderApi {
    HttpOrderApi::from_config(&OrderApiConfig {
        base_url: Some(base_url),
        api_key: Some("secret".to_string()),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_posts_order_with_idempotency_key() {
    let (url, server) = serve_once("201 Created", r#"{"orderId":"ord_900"}"#).await;

    let confirmation = api(url).submit_order(&request()).await.unwrap();
    assert_eq!(confirmation.order_id.as_str(), "ord_900");
    assert_eq!(confirmation.status, OrderStatus::Confirmed);

    let raw = server.await.unwrap();
    let lower = raw.to_ascii_lowercase();
    assert!(lower.starts_with("post /orders http/1.1"));
    assert!(lower.contains("idempotency-key: idem_test"));
    assert!(lower.contains("authorization: bearer secret"));
    assert!(raw.contains(r#""idempotencyKey":"idem_test""#));
    assert!(raw.contains(r#""productId":"tshirt""#));
}

#[tokio::test]
async fn test_server_rejection() {
    let (url, server) = serve_once(
        "409 Conflict",
        r#"{"errorCode":"sold_out","message":"Size M is sold out"}"#,
    )
    .await;

    let error = api(url).submit_order(&request()).await.unwrap_err();
    assert_eq!(error.error_code, "sold_out");
    assert_eq!(error.message, "Size M is sold out");
    assert!(!error.retryable);
    server.await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let (url, server) = serve_once("503 Service Unavailable", "{}").await;

    let error = api(url).submit_order(&request()).await.unwrap_err();
    assert_eq!(error.error_code, "http_503");
    assert!(error.retryable);
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_api_is_retryable() {
    let error = api("http://127.0.0.1:9".to_string())
        .submit_order(&request())
        .await
        .unwrap_err();
    assert!(error.retryable);
}
