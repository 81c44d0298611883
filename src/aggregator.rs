// Priority-ordered fallback across provider adapters

use std::sync::Arc;

use crate::error::{ProviderError, ProviderFailure, SearchError};
use crate::listing::{CanonicalListing, SearchRequest};
use crate::provider::ProviderAdapter;
use crate::reporter::{ErrorContext, ErrorReporter};

pub const AGGREGATION_COMPONENT: &str = "ProviderAggregation";
pub const EMPTY_RESULT_REASON: &str = "no listings returned";

/// Tries adapters one at a time, in the order given at construction, and
/// returns the first non-empty result. Results are never merged.
pub struct ProviderAggregator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    reporter: Arc<ErrorReporter>,
}

impl ProviderAggregator {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>, reporter: Arc<ErrorReporter>) -> Self {
        Self { adapters, reporter }
    }

    /// Adapter names in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<CanonicalListing>, SearchError> {
        if self.adapters.is_empty() {
            return Err(SearchError::NoProviderAvailable);
        }

        let mut failures = Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            let provider = adapter.name();
            match Self::query_adapter(adapter.as_ref(), request).await {
                Ok(listings) if !listings.is_empty() => {
                    tracing::info!(provider, count = listings.len(), "provider returned listings");
                    return Ok(listings);
                }
                Ok(_) => {
                    tracing::debug!(provider, "provider returned no listings, falling back");
                    failures.push(ProviderFailure {
                        provider: provider.to_string(),
                        reason: EMPTY_RESULT_REASON.to_string(),
                    });
                }
                Err(err) => {
                    tracing::warn!(provider, error = %err, "provider failed, falling back");
                    self.reporter.log_error(
                        &err,
                        ErrorContext::new(AGGREGATION_COMPONENT).with_action(provider),
                    );
                    failures.push(ProviderFailure {
                        provider: provider.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::warn!(providers = failures.len(), "all providers exhausted");
        Err(SearchError::AllProvidersExhausted { failures })
    }

    async fn query_adapter(
        adapter: &dyn ProviderAdapter,
        request: &SearchRequest,
    ) -> Result<Vec<CanonicalListing>, ProviderError> {
        let query = adapter.build_query(request);
        let raw = adapter.invoke(&query).await?;
        adapter.transform(raw)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::provider::Query;
    use crate::reporter::{AmbientContext, MemorySink};

    enum Behaviour {
        FailInvoke(u16),
        Listings(Value),
        FailTransform,
    }

    struct ScriptedAdapter {
        name: &'static str,
        behaviour: Behaviour,
        invocations: AtomicUsize,
    }

    impl ScriptedAdapter {
        fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                name,
                behaviour,
                invocations: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.invocations.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedAdapter {
        fn name(&self) -> &str {
            self.name
        }

        fn build_query(&self, request: &SearchRequest) -> Query {
            Query::new().param("q", request.location())
        }

        async fn invoke(&self, _query: &Query) -> Result<Value, ProviderError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::FailInvoke(status) => Err(ProviderError::Http { status: *status }),
                Behaviour::Listings(raw) => Ok(raw.clone()),
                Behaviour::FailTransform => Ok(json!({ "items": "not a list" })),
            }
        }

        fn transform(&self, raw: Value) -> Result<Vec<CanonicalListing>, ProviderError> {
            let Some(items) = raw.get("items").and_then(Value::as_array) else {
                return Err(ProviderError::Decode {
                    context: "scripted".into(),
                    reason: "items is not a list".into(),
                });
            };
            Ok(items
                .iter()
                .filter_map(|id| {
                    crate::listing::ListingDraft {
                        id: id.as_str().map(str::to_string),
                        name: Some(format!("{} hotel", self.name)),
                        ..Default::default()
                    }
                    .finish()
                })
                .collect())
        }
    }

    fn listings(ids: &[&str]) -> Behaviour {
        Behaviour::Listings(json!({ "items": ids }))
    }

    fn request() -> SearchRequest {
        SearchRequest::new("Lisbon", "2025-06-01", "2025-06-03", 2).unwrap()
    }

    fn reporter() -> (Arc<ErrorReporter>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let reporter = Arc::new(ErrorReporter::new(
            AmbientContext {
                url: "http://localhost/search".into(),
                user_agent: "test".into(),
            },
            sink.clone(),
        ));
        (reporter, sink)
    }

    fn as_dyn(adapters: &[Arc<ScriptedAdapter>]) -> Vec<Arc<dyn ProviderAdapter>> {
        adapters
            .iter()
            .map(|a| a.clone() as Arc<dyn ProviderAdapter>)
            .collect()
    }

    #[tokio::test]
    async fn first_non_empty_result_short_circuits() {
        let a = ScriptedAdapter::new("a", listings(&["a1"]));
        let b = ScriptedAdapter::new("b", listings(&["b1", "b2"]));
        let (reporter, sink) = reporter();
        let aggregator = ProviderAggregator::new(as_dyn(&[a.clone(), b.clone()]), reporter);

        let result = aggregator.search(&request()).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "a1");
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 0);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn falls_through_failure_and_empty_to_third_adapter() {
        let a = ScriptedAdapter::new("a", Behaviour::FailInvoke(500));
        let b = ScriptedAdapter::new("b", listings(&[]));
        let c = ScriptedAdapter::new("c", listings(&["c1", "c2"]));
        let d = ScriptedAdapter::new("d", listings(&["d1"]));
        let (reporter, sink) = reporter();
        let aggregator =
            ProviderAggregator::new(as_dyn(&[a.clone(), b.clone(), c.clone(), d.clone()]), reporter);

        let result = aggregator.search(&request()).await.unwrap();
        let ids: Vec<_> = result.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!((a.calls(), b.calls(), c.calls(), d.calls()), (1, 1, 1, 0));

        let records = sink.records();
        assert_eq!(records.len(), 1, "only the failing adapter is reported");
        assert_eq!(records[0].context.component.as_deref(), Some(AGGREGATION_COMPONENT));
        assert_eq!(records[0].context.action.as_deref(), Some("a"));
        assert_eq!(records[0].code.as_deref(), Some("HTTP_500"));
    }

    #[tokio::test]
    async fn exhaustion_lists_every_adapter_in_order() {
        let a = ScriptedAdapter::new("a", Behaviour::FailInvoke(503));
        let b = ScriptedAdapter::new("b", listings(&[]));
        let c = ScriptedAdapter::new("c", Behaviour::FailTransform);
        let (reporter, sink) = reporter();
        let aggregator = ProviderAggregator::new(as_dyn(&[a, b, c]), reporter);

        let failures = match aggregator.search(&request()).await {
            Err(SearchError::AllProvidersExhausted { failures }) => failures,
            other => panic!("expected AllProvidersExhausted, got {other:?}"),
        };
        let providers: Vec<_> = failures.iter().map(|f| f.provider.as_str()).collect();
        assert_eq!(providers, vec!["a", "b", "c"]);
        assert_eq!(failures[0].reason, "HTTP error: status 503");
        assert_eq!(failures[1].reason, EMPTY_RESULT_REASON);
        assert!(failures[2].reason.starts_with("Decode error"));
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn records_without_ids_count_as_empty() {
        let a = ScriptedAdapter::new("a", Behaviour::Listings(json!({ "items": [1, null] })));
        let b = ScriptedAdapter::new("b", listings(&["b1"]));
        let (reporter, _) = reporter();
        let aggregator = ProviderAggregator::new(as_dyn(&[a, b]), reporter);

        let result = aggregator.search(&request()).await.unwrap();
        assert_eq!(result[0].id, "b1");
    }

    #[tokio::test]
    async fn no_adapters_means_no_provider_available() {
        let (reporter, _) = reporter();
        let aggregator = ProviderAggregator::new(Vec::new(), reporter);
        assert!(matches!(
            aggregator.search(&request()).await,
            Err(SearchError::NoProviderAvailable)
        ));
    }

    #[tokio::test]
    async fn priority_follows_configured_order_not_names() {
        let z = ScriptedAdapter::new("zeta", listings(&["z1"]));
        let a = ScriptedAdapter::new("alpha", listings(&["a1"]));
        let (reporter, _) = reporter();
        let aggregator = ProviderAggregator::new(as_dyn(&[z.clone(), a.clone()]), reporter);

        assert_eq!(aggregator.provider_names(), vec!["zeta", "alpha"]);
        let result = aggregator.search(&request()).await.unwrap();
        assert_eq!(result[0].id, "z1");
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn independent_searches_run_concurrently() {
        let a = ScriptedAdapter::new("a", Behaviour::FailInvoke(502));
        let b = ScriptedAdapter::new("b", listings(&["b1"]));
        let (reporter, _) = reporter();
        let aggregator = Arc::new(ProviderAggregator::new(as_dyn(&[a.clone(), b.clone()]), reporter));

        let req = request();
        let searches = (0..8).map(|_| aggregator.search(&req));
        let results = futures::future::join_all(searches).await;

        assert!(results.iter().all(|r| r.as_ref().is_ok_and(|l| l[0].id == "b1")));
        assert_eq!(a.calls(), 8);
        assert_eq!(b.calls(), 8);
    }
}
