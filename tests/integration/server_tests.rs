//! End-to-end tests against a real listener.
//!
//! These bind an ephemeral port, serve the router with `axum::serve` and
//! drive it with reqwest, following the returned `Location` headers.

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tokio::net::TcpListener;

use steg_ws::steg::LsbCodec;
use steg_ws::store::MemoryImageStore;
use steg_ws::{create_router, RouterConfig};

use super::test_utils::create_ppm;

/// Serve a fresh memory-backed router and return its origin.
async fn spawn_server(base: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = RouterConfig::new(port).with_base(base).with_tracing(false);
    let router = create_router(MemoryImageStore::new(), LsbCodec::new(), config);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

fn created_location(response: &reqwest::Response) -> String {
    assert_eq!(response.status(), StatusCode::CREATED);
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_end_to_end_hide_and_unhide() {
    let origin = spawn_server("").await;
    let client = reqwest::Client::new();
    let ppm = create_ppm(12, 12);

    // Upload
    let form = Form::new().part("img", Part::bytes(ppm.clone()).file_name("photo.ppm"));
    let response = client
        .post(format!("{}/images/g1", origin))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let image_url = created_location(&response);
    assert!(image_url.starts_with(&format!("{}/images/g1/", origin)));

    // Fetch
    let response = client.get(&image_url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
        "image/x-portable-pixmap"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), ppm.as_slice());

    // Hide
    let name = image_url
        .rsplit('/')
        .next()
        .unwrap()
        .trim_end_matches(".ppm")
        .to_string();
    let response = client
        .post(format!("{}/steg/g1/{}", origin, name))
        .json(&serde_json::json!({ "msg": "hello", "outGroup": "g2" }))
        .send()
        .await
        .unwrap();
    let steg_url = created_location(&response);
    assert!(steg_url.starts_with(&format!("{}/steg/g2/", origin)));

    // Unhide
    let response = client.get(&steg_url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json, serde_json::json!({ "msg": "hello" }));
}

#[tokio::test]
async fn test_end_to_end_base_path_and_errors() {
    let origin = spawn_server("/api").await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/images/g1", origin))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let names: Vec<String> = response.json().await.unwrap();
    assert!(names.is_empty());

    let response = client
        .get(format!("{}/api/images/g1/nope.ppm", origin))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["code"], "NOT_FOUND");
}
