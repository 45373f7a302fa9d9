//! Client for the hosted store's PostgREST API (`/rest/v1/<table>`).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::header::CONTENT_RANGE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{Editable, MembershipRow, Order, Resource, SortColumn, Store, MEMBERSHIP_TABLE};
use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::flashcards::{Flashcard, Membership, NewMembership};

/// Error body returned by PostgREST
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PositionRow {
    position: u32,
}

/// Relational store reached over HTTP
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl RestStore {
    /// Create a client for the project at `base_url`.
    ///
    /// Requests carry the user's access token when the provider has one and
    /// fall back to the public API key otherwise.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::ValidationFailed(
                "Store URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::server(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            credentials,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let token = self
            .credentials
            .access_token()
            .unwrap_or_else(|| self.api_key.clone());
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = map_error_response(status, &body);
        log::warn!("Store request failed ({}): {}", status, error);
        Err(error)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let response = self.send(request).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| Error::server(format!("Invalid response from store: {}", e)))
    }
}

fn eq(id: Uuid) -> String {
    format!("eq.{}", id)
}

/// Total from a `Content-Range` header such as `0-19/42` or `*/0`
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn map_error_response(status: StatusCode, body: &str) -> Error {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .or_else(|| parsed.details.clone())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    match parsed.code.as_deref() {
        Some("23505") => Error::Conflict(message),
        Some("23503") => Error::NotFound {
            resource: "Referenced row",
            id: parsed.details.unwrap_or(message),
        },
        Some("23502") | Some("23514") | Some("22P02") => Error::ValidationFailed(message),
        _ if status == StatusCode::UNAUTHORIZED => Error::Unauthenticated,
        _ => Error::ServerError {
            status: Some(status.as_u16()),
            message,
        },
    }
}

#[async_trait]
impl Store for RestStore {
    async fn count<R: Resource>(&self) -> Result<u64> {
        let request = self
            .request(Method::HEAD, R::TABLE)
            .query(&[("select", "id")])
            .header("Prefer", "count=exact");
        let response = self.send(request).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| Error::server("Store did not report an exact count"))
    }

    async fn select_page<R: Resource>(
        &self,
        order: Order<R::Column>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<R>> {
        let query = [
            ("select", "*".to_string()),
            (
                "order",
                format!("{}.{}", order.column.as_str(), order.direction.as_str()),
            ),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        self.fetch(self.request(Method::GET, R::TABLE).query(&query))
            .await
    }

    async fn get<R: Resource>(&self, id: Uuid) -> Result<R> {
        let request = self
            .request(Method::GET, R::TABLE)
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        self.fetch::<R>(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(R::NAME, id))
    }

    async fn insert<R: Resource>(&self, draft: &R::Draft) -> Result<R> {
        let request = self
            .request(Method::POST, R::TABLE)
            .header("Prefer", "return=representation")
            .json(draft);
        self.fetch::<R>(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::server(format!("Store returned no {} after insert", R::NAME)))
    }

    async fn update<R: Editable>(&self, id: Uuid, patch: &R::Patch) -> Result<R> {
        let mut body = serde_json::to_value(patch)?;
        if let (true, Value::Object(fields)) = (R::HAS_UPDATED_AT, &mut body) {
            fields.insert(
                "updated_at".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }

        let request = self
            .request(Method::PATCH, R::TABLE)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(&body);
        self.fetch::<R>(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(R::NAME, id))
    }

    async fn delete<R: Resource>(&self, id: Uuid) -> Result<()> {
        let request = self
            .request(Method::DELETE, R::TABLE)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation");
        if self.fetch::<R>(request).await?.is_empty() {
            return Err(Error::not_found(R::NAME, id));
        }
        Ok(())
    }

    async fn max_position(&self, deck_id: Uuid) -> Result<Option<u32>> {
        let query = [
            ("select", "position".to_string()),
            ("deck_id", eq(deck_id)),
            ("order", "position.desc".to_string()),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<PositionRow> = self
            .fetch(self.request(Method::GET, MEMBERSHIP_TABLE).query(&query))
            .await?;
        Ok(rows.first().map(|r| r.position))
    }

    async fn insert_membership(&self, membership: &NewMembership) -> Result<Membership> {
        let request = self
            .request(Method::POST, MEMBERSHIP_TABLE)
            .header("Prefer", "return=representation")
            .json(membership);
        self.fetch::<Membership>(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::server("Store returned no membership after insert"))
    }

    async fn delete_membership(&self, id: Uuid) -> Result<()> {
        let request = self
            .request(Method::DELETE, MEMBERSHIP_TABLE)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation");
        if self.fetch::<Membership>(request).await?.is_empty() {
            return Err(Error::not_found("Membership", id));
        }
        Ok(())
    }

    async fn deck_memberships(&self, deck_id: Uuid) -> Result<Vec<MembershipRow>> {
        let query = [
            ("select", "id,position,added_at,flashcards(*)".to_string()),
            ("deck_id", eq(deck_id)),
            ("order", "position.asc".to_string()),
        ];
        self.fetch(self.request(Method::GET, MEMBERSHIP_TABLE).query(&query))
            .await
    }

    async fn flashcards_outside_deck(&self, deck_id: Uuid) -> Result<Vec<Flashcard>> {
        // Left-embed only this deck's memberships and keep the cards where
        // the embed came back empty: an anti-join evaluated by the database.
        let query = [
            ("select", "*,deck_flashcards!left(deck_id)".to_string()),
            ("deck_flashcards.deck_id", eq(deck_id)),
            ("deck_flashcards", "is.null".to_string()),
            ("order", "front.asc".to_string()),
        ];
        self.fetch(self.request(Method::GET, Flashcard::TABLE).query(&query))
            .await
    }
}
