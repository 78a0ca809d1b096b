//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! Templates and datasets live in in-memory [`Store`]s. When a database
//! pool is configured every write goes through to PostgreSQL as well, and
//! the stores are hydrated from it on startup.

use std::collections::HashMap;
use std::sync::Arc;

use chart_core::{DocumentValue, RequiredKeySpec, Template, TemplateId, DEFAULT_ITERATED_KEY};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// All records, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Record Types -------------------------------------------------------------

/// Stored template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub id: Uuid,
    pub title: String,
    /// Required keys checked once against the dataset root.
    #[schema(value_type = Object)]
    pub one_time_data: RequiredKeySpec,
    /// Required keys checked against every element of `iteratedKey`.
    #[schema(value_type = Object)]
    pub iterated_data: RequiredKeySpec,
    pub iterated_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateRecord {
    /// The rule set the compliance engine evaluates.
    pub fn to_template(&self) -> Template {
        Template {
            id: TemplateId::from(self.id),
            title: self.title.clone(),
            one_time_data: self.one_time_data.clone(),
            iterated_data: self.iterated_data.clone(),
            iterated_key: self.iterated_key.clone(),
        }
    }
}

/// Stored dataset. `data` is always the reconciled document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    pub id: Uuid,
    pub title: String,
    /// Templates this dataset complies with, in precedence order.
    pub parent_templates: Vec<Uuid>,
    #[schema(value_type = Object)]
    pub data: DocumentValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DatasetRecord {
    pub fn declares(&self, template: &Uuid) -> bool {
        self.parent_templates.contains(template)
    }
}

// -- Configuration ------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON lines; anything else is text.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Application configuration.
///
/// Custom `Debug` redacts the auth token and database URL.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// PostgreSQL URL. If `None`, the service runs in-memory only.
    pub database_url: Option<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub const DEFAULT_PORT: u16 = 8080;

    /// Build configuration from `PORT`, `AUTH_TOKEN`, `DATABASE_URL` and
    /// `LOG_FORMAT`. An unparseable port falls back to the default.
    pub fn from_env() -> Self {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(port = %raw, "PORT is not a valid port number, using default");
                Self::DEFAULT_PORT
            }),
            Err(_) => Self::DEFAULT_PORT,
        };
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            port,
            auth_token: non_empty("AUTH_TOKEN"),
            database_url: non_empty("DATABASE_URL"),
            log_format: LogFormat::from_env(),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            auth_token: None,
            database_url: None,
            log_format: LogFormat::Text,
        }
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state accessible to all route handlers.
/// Clone-friendly via `Arc` internals in each `Store`.
#[derive(Clone)]
pub struct AppState {
    pub templates: Store<TemplateRecord>,
    pub datasets: Store<DatasetRecord>,

    /// When `Some`, every write is persisted to Postgres as well.
    pub db_pool: Option<PgPool>,

    /// Renders `/metrics`. `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,

    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("templates", &self.templates.len())
            .field("datasets", &self.datasets.len())
            .field("db_pool", &self.db_pool.is_some())
            .field("metrics", &self.metrics.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            templates: Store::new(),
            datasets: Store::new(),
            db_pool: None,
            metrics: None,
            config,
        }
    }

    pub fn with_db_pool(mut self, pool: Option<PgPool>) -> Self {
        self.db_pool = pool;
        self
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        let Some(pool) = &self.db_pool else {
            return Ok(());
        };

        let templates = crate::db::templates::load_all(pool).await?;
        let template_count = templates.len();
        for record in templates {
            self.templates.insert(record.id, record);
        }

        let datasets = crate::db::datasets::load_all(pool).await?;
        let dataset_count = datasets.len();
        for record in datasets {
            self.datasets.insert(record.id, record);
        }

        tracing::info!(
            templates = template_count,
            datasets = dataset_count,
            "hydrated in-memory stores from database"
        );
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// `iteratedKey` for a template created without one.
pub fn default_iterated_key() -> String {
    DEFAULT_ITERATED_KEY.to_string()
}
