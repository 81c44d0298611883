// Hotel listing aggregation across unreliable providers, plus the retry and
// error-reporting discipline applied to every outbound call

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod listing;
pub mod provider;
pub mod reporter;
pub mod retry;

// Re-export key types for convenience
pub use aggregator::ProviderAggregator;
pub use classifier::{classify, Classification, Severity};
pub use config::{load_app_config, AppConfig, RuntimeMode};
pub use error::{ProviderError, ProviderFailure, SearchError, UserFacingError, ValidationError};
pub use listing::{CanonicalListing, SearchRequest};
pub use provider::{ProviderAdapter, ProviderKind, Query};
pub use reporter::{ErrorContext, ErrorRecord, ErrorReporter};
pub use retry::{RetryExecutor, RetryPolicy};
