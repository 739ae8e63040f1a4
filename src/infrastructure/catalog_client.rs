//! REST client for the catalog backend
//!
//! Stateless: every call maps one endpoint to one typed response. Transport
//! failures, non-success statuses and undecodable bodies all surface as
//! [`FetchError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::instrument;

use crate::{
    core::error::FetchError,
    domain::{
        CheckoutResponse, DepartmentSnapshot, ListSnapshot, MutationResponse, ProductId,
        SearchPage, SearchRequest,
    },
};

/// Remote operations the catalog screen depends on
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, FetchError>;

    async fn reserve(
        &self,
        user_id: i64,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<MutationResponse, FetchError>;

    /// Set the quantity of a product already in the temporary list
    async fn update_item(
        &self,
        user_id: i64,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<MutationResponse, FetchError>;

    async fn delete_item(
        &self,
        user_id: i64,
        product_id: ProductId,
    ) -> Result<MutationResponse, FetchError>;

    async fn list_snapshot(&self, user_id: i64) -> Result<ListSnapshot, FetchError>;

    async fn department(&self, user_id: i64) -> Result<DepartmentSnapshot, FetchError>;

    async fn clear_list(&self, user_id: i64) -> Result<MutationResponse, FetchError>;

    async fn checkout(&self, user_id: i64) -> Result<CheckoutResponse, FetchError>;
}

#[derive(Debug, Serialize)]
struct QuantityRequest {
    user_id: i64,
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct ItemRequest {
    user_id: i64,
    product_id: ProductId,
}

/// Error body shapes seen from the backend
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        let detail = self.detail.and_then(|detail| match detail {
            serde_json::Value::String(text) => Some(text),
            serde_json::Value::Null => None,
            // Validation errors arrive as a list of objects
            other => Some(other.to_string()),
        });
        detail.or(self.message).or(self.error)
    }
}

#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| FetchError::Decode(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_owned()
                } else {
                    body
                }
            });
        Err(FetchError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Self::decode(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, FetchError> {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Self::decode(response).await
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    #[instrument(skip(self), fields(query = %request.query, offset = request.offset))]
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, FetchError> {
        let page: SearchPage = self.post("/search", Some(request)).await?;
        log::debug!(
            "Search {:?} at {} returned {} records (has_more: {})",
            request.query,
            request.offset,
            page.len(),
            page.has_more
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn reserve(
        &self,
        user_id: i64,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<MutationResponse, FetchError> {
        let body = QuantityRequest {
            user_id,
            product_id,
            quantity,
        };
        self.post("/add", Some(&body)).await
    }

    #[instrument(skip(self))]
    async fn update_item(
        &self,
        user_id: i64,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<MutationResponse, FetchError> {
        let body = QuantityRequest {
            user_id,
            product_id,
            quantity,
        };
        self.post("/update", Some(&body)).await
    }

    #[instrument(skip(self))]
    async fn delete_item(
        &self,
        user_id: i64,
        product_id: ProductId,
    ) -> Result<MutationResponse, FetchError> {
        let body = ItemRequest {
            user_id,
            product_id,
        };
        self.post("/delete", Some(&body)).await
    }

    #[instrument(skip(self))]
    async fn list_snapshot(&self, user_id: i64) -> Result<ListSnapshot, FetchError> {
        self.get(&format!("/list/{user_id}")).await
    }

    #[instrument(skip(self))]
    async fn department(&self, user_id: i64) -> Result<DepartmentSnapshot, FetchError> {
        self.get(&format!("/list/department/{user_id}")).await
    }

    #[instrument(skip(self))]
    async fn clear_list(&self, user_id: i64) -> Result<MutationResponse, FetchError> {
        self.post::<(), _>(&format!("/clear/{user_id}"), None).await
    }

    #[instrument(skip(self))]
    async fn checkout(&self, user_id: i64) -> Result<CheckoutResponse, FetchError> {
        self.post::<(), _>(&format!("/save/{user_id}"), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DepartmentId;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client(server: &MockServer) -> HttpCatalogClient {
        HttpCatalogClient::new(format!("{}/api/", server.uri()), Duration::from_secs(5))
            .expect("client builds")
    }

    fn product_json(id: i64, department: serde_json::Value) -> serde_json::Value {
        json!({
            "id": id,
            "article": format!("A-{id}"),
            "name": "Bolt",
            "department": department,
            "group": null,
            "price": 2.5,
            "available": 4,
            "balance_sum": 10.0,
            "months_without_movement": 1,
        })
    }

    #[tokio::test]
    async fn test_search_posts_request_and_decodes_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_json(json!({
                "query": "bolt",
                "user_id": 7,
                "offset": 20,
                "limit": 50,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [product_json(1, json!("12")), product_json(2, json!(12))],
                "has_more": true,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server)
            .search(&SearchRequest {
                query: "bolt".into(),
                user_id: 7,
                offset: 20,
                limit: 50,
            })
            .await
            .expect("page");

        assert_eq!(page.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.products[1].department, DepartmentId::from("12"));
    }

    #[tokio::test]
    async fn test_missing_has_more_means_last_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "products": [product_json(1, json!("A"))] })),
            )
            .mount(&server)
            .await;

        let page = client(&server)
            .search(&SearchRequest {
                query: "bolt".into(),
                user_id: 7,
                offset: 0,
                limit: 1,
            })
            .await
            .expect("page");

        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add"))
            .and(body_json(json!({ "user_id": 7, "product_id": 3, "quantity": 2 })))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "detail": "Товар з іншого відділу" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .reserve(7, ProductId(3), 2)
            .await
            .expect_err("rejected");

        assert_eq!(
            err,
            FetchError::Status {
                status: 400,
                message: "Товар з іншого відділу".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/list/7"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client(&server).list_snapshot(7).await.expect_err("failed");

        assert_eq!(
            err,
            FetchError::Status {
                status: 502,
                message: "Bad Gateway".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/list/department/7"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).department(7).await.expect_err("failed");

        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_list_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/list/department/7"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "department": 5, "count": 2 })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/save/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Збережено",
                "cleared": true,
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/clear/7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "message": "ok" })),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let department = client.department(7).await.expect("department");
        let checkout = client.checkout(7).await.expect("checkout");
        let cleared = client.clear_list(7).await.expect("clear");

        assert_eq!(department.department, Some(DepartmentId::from("5")));
        assert_eq!(department.count, Some(2));
        assert!(checkout.cleared);
        assert!(cleared.success);
    }

    #[tokio::test]
    async fn test_item_update_and_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/update"))
            .and(body_json(json!({ "user_id": 7, "product_id": 3, "quantity": 4 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Кількість оновлено: 4 шт.",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/delete"))
            .and(body_json(json!({ "user_id": 7, "product_id": 3 })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "message": "Товар видалено" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let updated = client
            .update_item(7, ProductId(3), 4)
            .await
            .expect("update");
        let deleted = client.delete_item(7, ProductId(3)).await.expect("delete");

        assert_eq!(updated.message, "Кількість оновлено: 4 шт.");
        assert!(deleted.success);
    }

    #[tokio::test]
    async fn test_update_below_one_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/update"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Кількість має бути більше 0",
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .update_item(7, ProductId(3), 0)
            .await
            .expect_err("rejected");

        assert_eq!(
            err,
            FetchError::Status {
                status: 400,
                message: "Кількість має бути більше 0".into(),
            }
        );
    }
}
