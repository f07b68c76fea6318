//! HTTP client for the product API, used by the web front end.
//!
//! Every call is a single request: no retries, no caching. Failures come back
//! as [`ServiceError`], whose `Display` is the message shown to the user.

use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::WebConfig;
use crate::products::dto::{ProductRequest, ProductResponse};

const UNAVAILABLE: &str = "Unable to connect to the product service. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The API could not be reached or answered with something unreadable.
    #[error("{}", UNAVAILABLE)]
    Unavailable(#[source] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

impl ServiceError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unavailable(_) => None,
            Self::Api { status, .. } => Some(*status),
        }
    }

    fn not_found_as(self, id: i32) -> Self {
        match self {
            Self::Api { status, .. } if status == StatusCode::NOT_FOUND => Self::Api {
                status,
                message: format!("Product with ID {} was not found.", id),
            },
            other => other,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Clone)]
pub struct ProductApiClient {
    client: Client,
    base: Url,
}

impl ProductApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid API base url {}", base_url))?;
        let client = Client::builder()
            .user_agent(concat!("catalog-web/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client, base })
    }

    pub fn from_config(config: &WebConfig) -> anyhow::Result<Self> {
        Self::new(&config.api_base_url, config.api_timeout())
    }

    pub async fn list_products(&self) -> ServiceResult<Vec<ProductResponse>> {
        info!("fetching all products");
        let products: Vec<ProductResponse> = self.request(Method::GET, "products", None).await?;
        info!(count = products.len(), "fetched products");
        Ok(products)
    }

    pub async fn get_product(&self, id: i32) -> ServiceResult<ProductResponse> {
        info!(product_id = id, "fetching product");
        self.request(Method::GET, &format!("products/{}", id), None)
            .await
            .map_err(|e| e.not_found_as(id))
    }

    pub async fn create_product(&self, product: &ProductRequest) -> ServiceResult<ProductResponse> {
        info!(name = %product.name, "creating product");
        let created: ProductResponse = self.request(Method::POST, "products", Some(product)).await?;
        info!(product_id = created.id, "created product");
        Ok(created)
    }

    pub async fn update_product(
        &self,
        id: i32,
        product: &ProductRequest,
    ) -> ServiceResult<ProductResponse> {
        info!(product_id = id, name = %product.name, "updating product");
        self.request(Method::PUT, &format!("products/{}", id), Some(product))
            .await
            .map_err(|e| e.not_found_as(id))
    }

    pub async fn delete_product(&self, id: i32) -> ServiceResult<()> {
        info!(product_id = id, "deleting product");
        self.send(Method::DELETE, &format!("products/{}", id), None)
            .await
            .map_err(|e| e.not_found_as(id))?;
        info!(product_id = id, "deleted product");
        Ok(())
    }
}

impl ProductApiClient {
    async fn request<Res>(
        &self,
        method: Method,
        path: &str,
        body: Option<&ProductRequest>,
    ) -> ServiceResult<Res>
    where
        Res: DeserializeOwned,
    {
        let response = self.send(method, path, body).await?;
        response.json().await.map_err(|e| {
            error!(error = %e, path, "undecodable response from product service");
            ServiceError::Unavailable(e)
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&ProductRequest>,
    ) -> ServiceResult<reqwest::Response> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, base = %self.base, path, "product service unreachable");
            ServiceError::Unavailable(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(%status, path, error = %e, "failed to read error body");
                String::new()
            }
        };
        let message = error_message(status, &text);
        warn!(%status, path, error = %message, "product service request failed");
        Err(ServiceError::Api { status, message })
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{}/{}", prefix, path));
        url
    }
}

/// Human-readable message for a failed response: the joined `errors[].message`
/// of a structured body, else the raw body, else a status line.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = || format!("Request failed with status {}", status.as_u16());
    if body.trim().is_empty() {
        return fallback();
    }

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    let Some(errors) = json.get("errors").and_then(Value::as_array) else {
        return body.to_string();
    };

    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|e| e.get("message"))
        .map(|m| m.as_str().unwrap_or("Unknown error"))
        .collect();
    if messages.is_empty() {
        fallback()
    } else {
        messages.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use tokio::net::TcpListener;

    use super::*;
    use crate::{app::build_app, state::AppState};

    async fn spawn_api() -> ProductApiClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_app(AppState::fake());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        ProductApiClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap()
    }

    fn product(name: &str, price: Decimal) -> ProductRequest {
        ProductRequest {
            name: name.into(),
            price,
            description: Some(format!("{} for tests", name)),
        }
    }

    #[test]
    fn error_message_prefers_structured_errors() {
        let body = r#"{"status":400,"message":"x","errors":[{"field":"name","message":"Product name is required"},{"field":"price","message":"Product price must be greater than 0"}]}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Product name is required, Product price must be greater than 0"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"errors":[{"message":null}]}"#),
            "Unknown error"
        );
    }

    #[test]
    fn error_message_falls_back_to_body_then_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded"
        );
        assert_eq!(
            error_message(StatusCode::CONFLICT, r#"{"detail":"nope"}"#),
            r#"{"detail":"nope"}"#
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "  "),
            "Request failed with status 500"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"errors":[]}"#),
            "Request failed with status 400"
        );
    }

    #[test]
    fn url_keeps_base_path() {
        let client = ProductApiClient::new("http://api.local/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("products/3").as_str(), "http://api.local/v1/products/3");
        let client = ProductApiClient::new("http://api.local", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("products").as_str(), "http://api.local/products");
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let api = spawn_api().await;

        let laptop = api
            .create_product(&product("Test Laptop", Decimal::new(129999, 2)))
            .await
            .unwrap();
        api.create_product(&product("Test Book", Decimal::new(4999, 2)))
            .await
            .unwrap();

        let fetched = api.get_product(laptop.id).await.unwrap();
        assert_eq!(fetched, laptop);
        assert_eq!(fetched.price, Decimal::new(129999, 2));

        let mut edit = ProductRequest::from(fetched);
        edit.price = Decimal::new(119999, 2);
        let updated = api.update_product(laptop.id, &edit).await.unwrap();
        assert_eq!(updated.price, Decimal::new(119999, 2));

        api.delete_product(laptop.id).await.unwrap();
        let names: Vec<String> = api
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Test Book"]);
    }

    #[tokio::test]
    async fn validation_failure_carries_field_messages() {
        let api = spawn_api().await;
        let err = api
            .create_product(&product("", Decimal::ZERO))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(
            err.to_string(),
            "Product name is required, Product price must be greater than 0"
        );
    }

    #[tokio::test]
    async fn not_found_is_reported_per_id() {
        let api = spawn_api().await;
        let err = api.get_product(42).await.unwrap_err();
        assert_eq!(err.to_string(), "Product with ID 42 was not found.");

        let err = api
            .update_product(42, &product("Ghost", Decimal::ONE))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

        let err = api.delete_product(42).await.unwrap_err();
        assert_eq!(err.to_string(), "Product with ID 42 was not found.");
    }

    #[tokio::test]
    async fn unreachable_api_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = ProductApiClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = api.list_products().await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert_eq!(err.to_string(), UNAVAILABLE);
    }

    #[tokio::test]
    async fn truncated_error_body_falls_back_to_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial")
                .await
                .unwrap();
        });

        let api = ProductApiClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = api.list_products().await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.to_string(), "Request failed with status 500");
    }
}
