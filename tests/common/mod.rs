#![allow(dead_code)]

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use catalog_api::acl::Identity;
use catalog_api::auth::{generate_jwt, Claims};
use catalog_api::config::AppConfig;
use catalog_api::database::MemoryStore;
use catalog_api::server::{router, AppState};
use catalog_api::services::Repositories;

/// Router served in-process on an ephemeral port, backed by a fresh in-memory store
pub struct TestServer {
    pub base_url: String,
    pub store: MemoryStore,
    pub client: reqwest::Client,
    config: AppConfig,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("integration-secret".to_string()),
            _ => None,
        });
        let store = MemoryStore::recording();
        let app = router(
            AppState::new(Repositories::from_store(store.clone()), &config),
            &config,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind ephemeral port")?;
        let base_url = format!("http://{}", listener.local_addr()?);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url,
            store,
            client: reqwest::Client::new(),
            config,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token(&self, user_id: &str, role: &str) -> String {
        let claims = Claims::new(&Identity::new(user_id, role, "integration"), 1).expect("claims");
        generate_jwt(&claims, &self.config.security.jwt_secret).expect("mint token")
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str, body: Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token).json(&body)
    }

    pub fn put(&self, path: &str, token: &str, body: Value) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token).json(&body)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }
}

/// Assert the status and return the `data` member of a success envelope
pub async fn expect_data(response: Response, status: StatusCode) -> Result<Value> {
    let actual = response.status();
    let body: Value = response.json().await?;
    assert_eq!(actual, status, "unexpected status, body: {}", body);
    assert_eq!(body["success"], true);
    Ok(body["data"].clone())
}

/// Assert the status and return the error `code`
pub async fn expect_error(response: Response, status: StatusCode) -> Result<String> {
    let actual = response.status();
    let body: Value = response.json().await?;
    assert_eq!(actual, status, "unexpected status, body: {}", body);
    assert_eq!(body["error"], true);
    Ok(body["code"].as_str().unwrap_or_default().to_string())
}

pub fn restaurant_body(merchant_id: &str) -> Value {
    json!({
        "merchant_id": merchant_id,
        "name": "Spice Route",
        "description": "South Indian kitchen",
        "address": {
            "street": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "country": "India",
            "pincode": "560001",
            "location": { "type": "Point", "coordinates": [77.5946, 12.9716] }
        }
    })
}

pub fn category_body(restaurant_id: &str) -> Value {
    json!({ "restaurant_id": restaurant_id, "name": "Dosas", "description": "Rice crepes" })
}

pub fn variant_body(name: &str) -> Value {
    json!({
        "name": name,
        "price": { "amount": "120.00", "currency": "INR" },
        "in_stock": true
    })
}

pub fn product_body(restaurant_id: &str, category_id: &str) -> Value {
    json!({
        "restaurant_id": restaurant_id,
        "category_id": category_id,
        "name": "Masala Dosa",
        "is_veg": true,
        "variants": [variant_body("Regular plate")]
    })
}
