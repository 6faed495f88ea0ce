//! PostgREST Table Client
//!
//! HTTP client for the hosted database's table API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{Backend, BackendError, BackendResult, FeedActivity, FeedQuery, NewEntry, Team, TreasureRef};
use crate::config::BackendConfig;

const TEAMS_TABLE: &str = "teams";
const TREASURES_TABLE: &str = "game_treasures";
const ENTRY_TABLE: &str = "entry";
const FEED_VIEW: &str = "feed_view";

const FEED_COLUMNS: &str = "id,created_at,team_name,scan,treasure_name_zh,points_earned";

/// Table API client
///
/// Built once at startup; the connection parameters never change afterwards.
pub struct RestBackend {
    client: Client,
    rest_base: String,
}

impl RestBackend {
    /// Create a client for the configured project
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let key = HeaderValue::from_str(&config.api_key)
                .map_err(|e| BackendError::InvalidConfig(format!("api_key: {}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| BackendError::InvalidConfig(format!("api_key: {}", e)))?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }

        let mut builder = Client::builder()
            .user_agent(concat!("runhunt/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            rest_base: config.rest_base(),
        })
    }

    /// Base URL of the table API
    pub fn rest_base(&self) -> &str {
        &self.rest_base
    }

    /// Build the URL of a table with PostgREST query parameters
    fn table_url(&self, table: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/{}", self.rest_base, table);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// GET rows of a table
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> BackendResult<Vec<T>> {
        let url = self.table_url(table, params);
        tracing::debug!(%url, "Selecting rows");

        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let response = check_status(response).await?;

        let body = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn read_teams(&self) -> BackendResult<Vec<Team>> {
        self.select(
            TEAMS_TABLE,
            &[
                ("select", "id,team_name".to_string()),
                ("order", "id.asc".to_string()),
            ],
        )
        .await
    }

    async fn find_treasure_by_code(&self, code: u32) -> BackendResult<Option<TreasureRef>> {
        // Two rows are enough to tell "unique" from "ambiguous"
        let mut rows: Vec<TreasureRef> = self
            .select(
                TREASURES_TABLE,
                &[
                    ("select", "id".to_string()),
                    ("code_entry", format!("eq.{}", code)),
                    ("limit", "2".to_string()),
                ],
            )
            .await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(BackendError::NotUnique(n)),
        }
    }

    async fn insert_entry(&self, entry: &NewEntry) -> BackendResult<()> {
        let url = self.table_url(ENTRY_TABLE, &[]);
        tracing::debug!(%url, ?entry, "Inserting entry");

        let response = self
            .client
            .post(&url)
            .header("Prefer", "return=minimal")
            .json(entry)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn read_feed(&self, query: FeedQuery) -> BackendResult<Vec<FeedActivity>> {
        self.select(
            FEED_VIEW,
            &[
                ("select", FEED_COLUMNS.to_string()),
                ("order", "created_at.asc".to_string()),
                ("limit", query.limit().to_string()),
            ],
        )
        .await
    }
}

/// Error body returned by the table API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::Unavailable
    } else if e.is_decode() {
        BackendError::Decode(e.to_string())
    } else {
        BackendError::Request(e)
    }
}

/// Turn a non-success response into an `Api` error carrying the service message
async fn check_status(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => body.message,
        Err(_) if text.trim().is_empty() => status.to_string(),
        Err(_) => text,
    };

    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap as AxumHeaders, StatusCode},
        routing::get,
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// What the stand-in table API saw
    #[derive(Default)]
    struct Seen {
        requests: Vec<(String, String, HashMap<String, String>)>,
        inserted: Vec<serde_json::Value>,
        api_keys: Vec<Option<String>>,
        prefer: Vec<Option<String>>,
    }

    type Shared = Arc<Mutex<Seen>>;

    async fn select_rows(
        State(seen): State<Shared>,
        Path(table): Path<String>,
        Query(params): Query<HashMap<String, String>>,
        headers: AxumHeaders,
    ) -> (StatusCode, Json<serde_json::Value>) {
        {
            let mut seen = seen.lock().unwrap();
            seen.api_keys.push(
                headers
                    .get("apikey")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from),
            );
            seen.requests
                .push(("GET".to_string(), table.clone(), params.clone()));
        }

        match table.as_str() {
            "teams" => (
                StatusCode::OK,
                Json(serde_json::json!([
                    {"id": 1, "team_name": "Frogs"},
                    {"id": 2, "team_name": "Newts"}
                ])),
            ),
            "game_treasures" => match params.get("code_entry").map(String::as_str) {
                Some("eq.1234568") => (StatusCode::OK, Json(serde_json::json!([{"id": 41}]))),
                Some("eq.5555555") => (
                    StatusCode::OK,
                    Json(serde_json::json!([{"id": 1}, {"id": 2}])),
                ),
                Some("eq.6666666") => (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "code": "22P02",
                        "details": null,
                        "hint": null,
                        "message": "invalid input syntax for type bigint"
                    })),
                ),
                _ => (StatusCode::OK, Json(serde_json::json!([]))),
            },
            "feed_view" => (
                StatusCode::OK,
                Json(serde_json::json!([
                    {
                        "id": 3,
                        "created_at": "2025-03-01T09:00:00+00:00",
                        "team_name": "Frogs",
                        "scan": "1234568",
                        "treasure_name_zh": "池塘",
                        "points_earned": 10
                    }
                ])),
            ),
            _ => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"message": "relation does not exist"})),
            ),
        }
    }

    async fn insert_row(
        State(seen): State<Shared>,
        Path(table): Path<String>,
        headers: AxumHeaders,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, String) {
        let mut seen = seen.lock().unwrap();
        seen.prefer.push(
            headers
                .get("prefer")
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        );
        seen.requests
            .push(("POST".to_string(), table.clone(), HashMap::new()));

        if body["team_id"] == 99 {
            return (
                StatusCode::CONFLICT,
                r#"{"message":"insert or update on table \"entry\" violates foreign key constraint"}"#
                    .to_string(),
            );
        }
        seen.inserted.push(body);
        (StatusCode::CREATED, String::new())
    }

    async fn spawn_table_api() -> (RestBackend, Shared) {
        let seen: Shared = Arc::new(Mutex::new(Seen::default()));
        let app = Router::new()
            .route("/rest/v1/:table", get(select_rows).post(insert_row))
            .with_state(Arc::clone(&seen));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = BackendConfig {
            url: format!("http://{}", addr),
            api_key: "anon-key".to_string(),
            ..BackendConfig::default()
        };
        (RestBackend::new(&config).unwrap(), seen)
    }

    #[test]
    fn test_table_url_encodes_params() {
        let backend = RestBackend::new(&BackendConfig::default()).unwrap();
        assert_eq!(backend.rest_base(), "http://localhost:54321/rest/v1");

        let url = backend.table_url(
            "teams",
            &[
                ("select", "id,team_name".to_string()),
                ("order", "id.asc".to_string()),
            ],
        );
        assert_eq!(
            url,
            "http://localhost:54321/rest/v1/teams?select=id%2Cteam_name&order=id.asc"
        );
        assert_eq!(
            backend.table_url("entry", &[]),
            "http://localhost:54321/rest/v1/entry"
        );
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let config = BackendConfig {
            api_key: "bad\nkey".to_string(),
            ..BackendConfig::default()
        };
        assert!(matches!(
            RestBackend::new(&config),
            Err(BackendError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_read_teams_orders_by_id() {
        let (backend, seen) = spawn_table_api().await;

        let teams = backend.read_teams().await.unwrap();
        assert_eq!(teams, vec![Team::new(1, "Frogs"), Team::new(2, "Newts")]);

        let seen = seen.lock().unwrap();
        let (method, table, params) = &seen.requests[0];
        assert_eq!(method, "GET");
        assert_eq!(table, "teams");
        assert_eq!(params["select"], "id,team_name");
        assert_eq!(params["order"], "id.asc");
        assert_eq!(seen.api_keys[0].as_deref(), Some("anon-key"));
    }

    #[tokio::test]
    async fn test_find_treasure_by_numeric_code() {
        let (backend, seen) = spawn_table_api().await;

        let found = backend.find_treasure_by_code(1_234_568).await.unwrap();
        assert_eq!(found, Some(TreasureRef { id: 41 }));

        let missing = backend.find_treasure_by_code(9_999_999).await.unwrap();
        assert_eq!(missing, None);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.requests[0].2["code_entry"], "eq.1234568");
        assert_eq!(seen.requests[0].2["select"], "id");
    }

    #[tokio::test]
    async fn test_find_treasure_ambiguous_and_failing() {
        let (backend, _seen) = spawn_table_api().await;

        let ambiguous = backend.find_treasure_by_code(5_555_555).await;
        assert!(matches!(ambiguous, Err(BackendError::NotUnique(2))));

        let failed = backend.find_treasure_by_code(6_666_666).await.unwrap_err();
        assert!(matches!(failed, BackendError::Api { status: 400, .. }));
        assert_eq!(failed.to_string(), "invalid input syntax for type bigint");
    }

    #[tokio::test]
    async fn test_insert_entry_posts_payload() {
        let (backend, seen) = spawn_table_api().await;

        backend
            .insert_entry(&NewEntry {
                game_treasure_id: 41,
                team_id: 2,
            })
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.inserted,
            vec![serde_json::json!({"game_treasure_id": 41, "team_id": 2})]
        );
        assert_eq!(seen.prefer[0].as_deref(), Some("return=minimal"));
    }

    #[tokio::test]
    async fn test_insert_entry_surfaces_message() {
        let (backend, _seen) = spawn_table_api().await;

        let err = backend
            .insert_entry(&NewEntry {
                game_treasure_id: 41,
                team_id: 99,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 409, .. }));
        assert_eq!(
            err.to_string(),
            "insert or update on table \"entry\" violates foreign key constraint"
        );
    }

    #[tokio::test]
    async fn test_read_feed_is_bounded_and_ascending() {
        let (backend, seen) = spawn_table_api().await;

        let rows = backend.read_feed(FeedQuery::new(1_000)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team_name, "Frogs");

        let seen = seen.lock().unwrap();
        let params = &seen.requests[0].2;
        assert_eq!(params["order"], "created_at.asc");
        assert_eq!(params["limit"], "150");
        assert_eq!(params["select"], FEED_COLUMNS);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = BackendConfig {
            url: format!("http://{}", addr),
            ..BackendConfig::default()
        };
        let backend = RestBackend::new(&config).unwrap();

        let err = backend.read_teams().await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable));
        assert!(!err.is_unexpected());
    }
}
