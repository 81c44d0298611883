// Structured error reporting with a pluggable, failure-proof sink

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use reqwest::{Client, Url};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::classifier::{classify, Severity};
use crate::config::{ReporterConfig, RuntimeMode};
use crate::error::{ConfigError, ProviderError, SearchError, ValidationError};

const ERROR_ENDPOINT_VAR: &str = "STAY_ERROR_ENDPOINT";

/// Immutable description of one failure, as shipped to a sink.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub severity: Severity,
    pub context: RecordContext,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordContext {
    pub url: String,
    pub user_agent: String,
    #[serde(serialize_with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

fn iso8601<S: serde::Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Process-level context merged into every record.
#[derive(Debug, Clone)]
pub struct AmbientContext {
    pub url: String,
    pub user_agent: String,
}

/// Per-call overrides supplied by the component reporting the failure.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub component: Option<String>,
    pub action: Option<String>,
    pub url: Option<String>,
}

impl ErrorContext {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: Some(component.into()),
            ..Default::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Destination for error records.
///
/// `submit` must return promptly and must not fail: sinks that do I/O are
/// expected to detach it and swallow their own errors. `flush` waits for that
/// detached work; sinks that finish inside `submit` keep the no-op default.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    fn submit(&self, record: ErrorRecord);

    async fn flush(&self) {}
}

/// Development sink: emits the record as a structured tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ErrorSink for ConsoleSink {
    fn submit(&self, record: ErrorRecord) {
        tracing::error!(
            severity = ?record.severity,
            code = record.code.as_deref().unwrap_or("-"),
            component = record.context.component.as_deref().unwrap_or("-"),
            action = record.context.action.as_deref().unwrap_or("-"),
            url = %record.context.url,
            timestamp = %record.context.timestamp,
            stack = record.stack.as_deref().unwrap_or(""),
            "{}",
            record.message
        );
    }
}

/// Production sink: POSTs each record as JSON on a detached task.
///
/// Tasks are tracked so a short-lived process can [`ErrorSink::flush`] them
/// before its runtime shuts down.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    endpoint: Url,
    in_flight: Arc<Mutex<JoinSet<()>>>,
}

impl HttpSink {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            ProviderError::InvalidConfig(format!("invalid error endpoint '{endpoint}': {e}"))
        })?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            in_flight: Arc::new(Mutex::new(JoinSet::new())),
        })
    }

    /// Sends one record and waits for the collector's answer.
    pub async fn deliver(&self, record: &ErrorRecord) -> Result<(), ProviderError> {
        self.client
            .post(self.endpoint.clone())
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl ErrorSink for HttpSink {
    fn submit(&self, record: ErrorRecord) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime available, keeping error record local");
            ConsoleSink.submit(record);
            return;
        };

        let sink = self.clone();
        let mut in_flight = self.in_flight.lock();
        // reap finished deliveries so the set only holds pending ones
        while in_flight.try_join_next().is_some() {}
        in_flight.spawn_on(
            async move {
                if let Err(err) = sink.deliver(&record).await {
                    tracing::warn!(
                        error = %err,
                        original = %record.message,
                        "failed to deliver error record to collector"
                    );
                }
            },
            &handle,
        );
    }

    async fn flush(&self) {
        let mut pending = std::mem::replace(&mut *self.in_flight.lock(), JoinSet::new());
        while let Some(joined) = pending.join_next().await {
            if let Err(err) = joined {
                tracing::warn!(error = %err, "error delivery task did not complete");
            }
        }
    }
}

/// In-memory sink that keeps every record in submission order.
///
/// Public so embedding code and integration tests can inspect what a search
/// reported without standing up a collector.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ErrorRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ErrorRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl ErrorSink for MemorySink {
    fn submit(&self, record: ErrorRecord) {
        self.records.lock().push(record);
    }
}

/// Builds [`ErrorRecord`]s and hands them to a sink.
///
/// Construct one at startup and share it as `Arc<ErrorReporter>`.
pub struct ErrorReporter {
    ambient: AmbientContext,
    sink: Arc<dyn ErrorSink>,
}

impl ErrorReporter {
    pub fn new(ambient: AmbientContext, sink: Arc<dyn ErrorSink>) -> Self {
        Self { ambient, sink }
    }

    /// Picks the sink for the configured runtime mode.
    pub fn from_config(config: &ReporterConfig) -> Result<Self, ConfigError> {
        let sink: Arc<dyn ErrorSink> = match (&config.mode, &config.endpoint) {
            (RuntimeMode::Production, Some(endpoint)) => Arc::new(
                HttpSink::new(endpoint, Duration::from_secs(config.timeout_secs)).map_err(
                    |e| ConfigError::InvalidEnvVar {
                        var: ERROR_ENDPOINT_VAR.to_string(),
                        reason: e.to_string(),
                    },
                )?,
            ),
            (RuntimeMode::Production, None) => {
                return Err(ConfigError::MissingEnvVar(ERROR_ENDPOINT_VAR.to_string()))
            }
            _ => Arc::new(ConsoleSink),
        };

        Ok(Self::new(
            AmbientContext {
                url: config.site_url.clone(),
                user_agent: config.user_agent.clone(),
            },
            sink,
        ))
    }

    /// Waits up to `timeout` for reports still being delivered. Returns `false`
    /// if some were abandoned.
    pub async fn flush(&self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.sink.flush()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "gave up waiting for pending error reports"
                );
                false
            }
        }
    }

    /// Records `error`. Never fails and never waits on the sink.
    pub fn log_error(&self, error: &(dyn StdError + 'static), context: ErrorContext) {
        let record = self.build_record(error, context);
        self.sink.submit(record);
    }

    pub fn build_record(&self, error: &(dyn StdError + 'static), context: ErrorContext) -> ErrorRecord {
        let message = error.to_string();
        let severity = classify(&message).severity;

        ErrorRecord {
            stack: render_source_chain(error),
            code: error_code(error),
            severity,
            context: RecordContext {
                url: context.url.unwrap_or_else(|| self.ambient.url.clone()),
                user_agent: self.ambient.user_agent.clone(),
                timestamp: Utc::now(),
                component: context.component,
                action: context.action,
            },
            message,
        }
    }
}

fn render_source_chain(error: &(dyn StdError + 'static)) -> Option<String> {
    let mut lines = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn error_code(error: &(dyn StdError + 'static)) -> Option<String> {
    if let Some(err) = error.downcast_ref::<ProviderError>() {
        return Some(err.code());
    }
    if let Some(err) = error.downcast_ref::<SearchError>() {
        return Some(
            match err {
                SearchError::NoProviderAvailable => "NO_PROVIDER_AVAILABLE",
                SearchError::AllProvidersExhausted { .. } => "ALL_PROVIDERS_EXHAUSTED",
            }
            .to_string(),
        );
    }
    error
        .downcast_ref::<ValidationError>()
        .map(|_| "VALIDATION".to_string())
}
