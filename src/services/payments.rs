//! Stripe REST client covering the calls the grocery assistant makes:
//! product and price creation for seeding, product lookup by name, and
//! payment link creation.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::product::Product;

const PAGE_SIZE: &str = "100";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StripeProduct {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StripePrice {
    pub id: String,
    pub unit_amount: Option<i64>,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PaymentLink {
    pub id: String,
    pub url: String,
}

#[derive(Deserialize)]
struct ListPage<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct StripeClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, PaymentError> {
        let http = Client::builder()
            .user_agent(concat!("grocery-assistant/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(20))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, PaymentError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or(body);
        Err(PaymentError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Walk the product listing page by page until a product with exactly
    /// this name turns up.
    pub async fn find_product_by_name(&self, name: &str) -> Result<Option<StripeProduct>, PaymentError> {
        let mut starting_after: Option<String> = None;

        loop {
            let mut query = vec![("limit", PAGE_SIZE.to_string())];
            if let Some(cursor) = &starting_after {
                query.push(("starting_after", cursor.clone()));
            }

            let page: ListPage<StripeProduct> =
                Self::send(self.get("/v1/products").query(&query)).await?;

            if let Some(found) = page.data.iter().find(|p| p.name == name) {
                return Ok(Some(found.clone()));
            }

            match page.data.last() {
                Some(last) if page.has_more => starting_after = Some(last.id.clone()),
                _ => return Ok(None),
            }
        }
    }

    /// First listed price of a product.
    pub async fn first_price(&self, product_id: &str) -> Result<Option<StripePrice>, PaymentError> {
        let page: ListPage<StripePrice> = Self::send(
            self.get("/v1/prices")
                .query(&[("product", product_id), ("limit", "1")]),
        )
        .await?;
        Ok(page.data.into_iter().next())
    }

    pub async fn create_payment_link(&self, price_id: &str, quantity: u32) -> Result<PaymentLink, PaymentError> {
        let form = [
            ("line_items[0][price]", price_id.to_string()),
            ("line_items[0][quantity]", quantity.to_string()),
        ];
        Self::send(self.post("/v1/payment_links").form(&form)).await
    }

    /// Create a Stripe product mirroring a catalog product.
    pub async fn create_product(&self, product: &Product) -> Result<StripeProduct, PaymentError> {
        let package = serde_json::to_string(&product.package)?;

        let mut form = vec![
            ("name".to_string(), product.name.clone()),
            ("description".to_string(), product.description.clone()),
            ("metadata[category]".to_string(), product.category.clone()),
            ("metadata[createdDate]".to_string(), product.created_date.to_rfc3339()),
            ("metadata[modifiedDate]".to_string(), product.modified_date.to_rfc3339()),
            ("metadata[productId]".to_string(), product.product_id.clone()),
            ("metadata[tags]".to_string(), product.tags.join(", ")),
            ("metadata[package]".to_string(), package),
        ];
        for (i, picture) in product.pictures.iter().enumerate() {
            form.push((format!("images[{i}]"), picture.clone()));
        }

        Self::send(self.post("/v1/products").form(&form)).await
    }

    pub async fn create_price(
        &self,
        product_id: &str,
        unit_amount: i64,
        currency: &str,
    ) -> Result<StripePrice, PaymentError> {
        let form = [
            ("unit_amount", unit_amount.to_string()),
            ("currency", currency.to_string()),
            ("product", product_id.to_string()),
        ];
        Self::send(self.post("/v1/prices").form(&form)).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("HTTP request to Stripe failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stripe returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to encode product metadata: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, Method::POST, MockServer};
    use serde_json::json;

    fn client(server: &MockServer) -> StripeClient {
        StripeClient::new("sk_test_123", server.base_url()).expect("client")
    }

    #[tokio::test]
    async fn test_find_product_follows_pagination() {
        let server = MockServer::start_async().await;

        // Mocks match in creation order, so the cursor page is registered first.
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/products")
                    .query_param("starting_after", "prod_2");
                then.status(200).json_body(json!({
                    "object": "list",
                    "data": [{ "id": "prod_3", "name": "Fresh Lemons" }],
                    "has_more": false
                }));
            })
            .await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/products")
                    .query_param("limit", "100")
                    .header("authorization", "Bearer sk_test_123");
                then.status(200).json_body(json!({
                    "object": "list",
                    "data": [
                        { "id": "prod_1", "name": "Milk" },
                        { "id": "prod_2", "name": "Eggs" }
                    ],
                    "has_more": true
                }));
            })
            .await;

        let found = client(&server)
            .find_product_by_name("Fresh Lemons")
            .await
            .expect("lookup");

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(found.map(|p| p.id), Some("prod_3".to_string()));
    }

    #[tokio::test]
    async fn test_find_product_missing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/products");
                then.status(200).json_body(json!({ "data": [], "has_more": false }));
            })
            .await;

        let found = client(&server).find_product_by_name("Nope").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_api_error_message_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/payment_links");
                then.status(400).json_body(json!({
                    "error": { "type": "invalid_request_error", "message": "No such price: 'price_x'" }
                }));
            })
            .await;

        let err = client(&server)
            .create_payment_link("price_x", 1)
            .await
            .unwrap_err();
        match err {
            PaymentError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No such price: 'price_x'");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_payment_link_form() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/payment_links")
                    .x_www_form_urlencoded_tuple("line_items[0][price]", "price_1")
                    .x_www_form_urlencoded_tuple("line_items[0][quantity]", "3");
                then.status(200).json_body(json!({
                    "id": "plink_1",
                    "url": "https://buy.stripe.com/test_123"
                }));
            })
            .await;

        let link = client(&server).create_payment_link("price_1", 3).await.unwrap();
        mock.assert_async().await;
        assert_eq!(link.url, "https://buy.stripe.com/test_123");
    }
}
