use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use recipe_assistant_rust::Assistant;
use recipe_assistant_rust::catalog::{self, MemoryCatalog};
use recipe_assistant_rust::detect::{DetectorAdapter, HeuristicDetector};
use recipe_assistant_rust::lexicon::Lexicon;
use recipe_assistant_rust::resolver::RecipeResolver;
use recipe_assistant_rust::server::{ServerState, router};

const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

async fn spawn_server() -> String {
    let catalog_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/recipes.json");
    let lexicon = Arc::new(Lexicon::load().expect("lexicon"));
    let store = Arc::new(MemoryCatalog::new());
    catalog::seed_if_empty(store.as_ref(), &catalog_path).expect("seed");
    let local = HeuristicDetector::new()
        .with_seed(Some(3))
        .with_delay(Duration::ZERO);
    let detector = DetectorAdapter::new(lexicon.clone(), Arc::new(local));
    let assistant = Assistant::new(lexicon, RecipeResolver::new(store), detector)
        .with_catalog_path(catalog_path);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = router(ServerState::new(assistant));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}

fn image_payload(size: usize) -> String {
    let mut bytes = PNG_HEADER.to_vec();
    bytes.resize(size, 0);
    BASE64.encode(bytes)
}

#[tokio::test]
async fn health_and_cors() {
    let base = spawn_server().await;
    let response = reqwest::get(format!("{}/api/health", base))
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn search_lookup_and_reload() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/recipes/search", base))
        .query(&[("ingredients", "蕃茄、chicken")])
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["source"], "local");
    assert_eq!(body["externalCount"], 0);
    assert_eq!(body["count"], body["localCount"]);
    assert_eq!(body["count"], 5);

    let response = client
        .get(format!("{}/api/recipes/search?ingredients=", base))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "Ingredients parameter is required");

    let body: Value = client
        .get(format!("{}/api/recipes/3", base))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["title"], "Palak Paneer");
    assert_eq!(body["prepTime"].as_str().map(str::is_empty), Some(false));

    let response = client
        .get(format!("{}/api/recipes/12345", base))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);

    let body: Value = client
        .get(format!("{}/api/recipes/reload", base))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["count"], 8);
    assert_eq!(body["message"], "Successfully reloaded 8 recipes");

    let all: Value = client
        .get(format!("{}/api/recipes", base))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(all.as_array().map(Vec::len), Some(8));
}

#[tokio::test]
async fn detection_endpoints() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/detect", base))
        .json(&json!({"data_base64": image_payload(4_096)}))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["source"], "local_heuristic");
    let english = body["ingredients_en"].as_array().expect("english");
    assert!((3..=6).contains(&english.len()));

    let body: Value = client
        .post(format!("{}/api/detect", base))
        .json(&json!({"data_base64": image_payload(4_096), "backend": "external"}))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["ingredients_en"], json!(["tomato", "onion", "garlic"]));

    let response = client
        .post(format!("{}/api/detect-ingredients", base))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "No image file provided");

    let body: Value = client
        .post(format!("{}/api/translate", base))
        .json(&json!({"text": "玉葱"}))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["translation"], "玉葱");
}

#[tokio::test]
async fn multipart_uploads_are_accepted() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let mut png = PNG_HEADER.to_vec();
    png.resize(4_096, 0);

    let form = reqwest::multipart::Form::new().part(
        "image",
        reqwest::multipart::Part::bytes(png.clone()).file_name("a.png"),
    );
    let response = client
        .post(format!("{}/api/detect-ingredients", base))
        .multipart(form)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["source"], "local_heuristic");
    assert_eq!(body["ingredients"], body["ingredients_en"]);
    assert_eq!(body["detectedLabels"].as_array().map(Vec::len), Some(3));

    let form = reqwest::multipart::Form::new()
        .part("image", reqwest::multipart::Part::bytes(png).file_name("a.png"))
        .text("backend", "external");
    let body: Value = client
        .post(format!("{}/api/detect", base))
        .multipart(form)
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["source"], "fallback");

    let form = reqwest::multipart::Form::new().text("note", "no picture");
    let response = client
        .post(format!("{}/api/detect", base))
        .multipart(form)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "No image file provided");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    for path in ["/api/detect", "/api/translate"] {
        let response = client
            .post(format!("{}{}", base, path))
            .header("content-type", "text/plain")
            .body("hello")
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.expect("json");
        assert!(body["error"].as_str().is_some_and(|error| !error.is_empty()));
    }
}
