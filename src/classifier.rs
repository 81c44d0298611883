// Severity and retryability verdicts derived from error messages

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub severity: Severity,
    pub retryable: bool,
}

impl Classification {
    const fn new(severity: Severity, retryable: bool) -> Self {
        Self {
            severity,
            retryable,
        }
    }
}

// Rules are checked top to bottom, first match wins.
// Business-critical and input errors must shadow the transient transport rules.
const RULES: &[(&[&str], Classification)] = &[
    (
        &["payment", "booking"],
        Classification::new(Severity::Critical, false),
    ),
    (
        &["validation", "form"],
        Classification::new(Severity::Low, false),
    ),
    (
        &["network", "fetch"],
        Classification::new(Severity::Medium, true),
    ),
    (
        &["timeout", "502", "503"],
        Classification::new(Severity::Medium, true),
    ),
];

const FALLBACK: Classification = Classification::new(Severity::Medium, false);

/// Classifies an error message by case-insensitive substring matching.
pub fn classify(message: &str) -> Classification {
    let message = message.to_lowercase();
    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| message.contains(needle)))
        .map(|(_, verdict)| *verdict)
        .unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_timeout_is_retryable() {
        assert_eq!(
            classify("Network timeout exceeded"),
            Classification {
                severity: Severity::Medium,
                retryable: true
            }
        );
    }

    #[test]
    fn payment_shadows_network() {
        assert_eq!(
            classify("Payment declined due to network error"),
            Classification {
                severity: Severity::Critical,
                retryable: false
            }
        );
    }

    #[test]
    fn booking_is_critical() {
        let verdict = classify("Booking could not be confirmed");
        assert_eq!(verdict.severity, Severity::Critical);
        assert!(!verdict.retryable);
    }

    #[test]
    fn validation_shadows_fetch() {
        let verdict = classify("Form validation failed while fetching");
        assert_eq!(verdict.severity, Severity::Low);
        assert!(!verdict.retryable);
    }

    #[test]
    fn gateway_statuses_are_retryable() {
        assert!(classify("HTTP error: status 502").retryable);
        assert!(classify("HTTP error: status 503").retryable);
        assert!(classify("Request TIMEOUT").retryable);
    }

    #[test]
    fn unknown_messages_fall_back_to_medium() {
        assert_eq!(classify("HTTP error: status 500"), FALLBACK);
        assert_eq!(classify(""), FALLBACK);
    }

    #[test]
    fn matching_ignores_case() {
        assert!(classify("NETWORK unreachable").retryable);
        assert_eq!(classify("PAYMENT").severity, Severity::Critical);
    }

    #[test]
    fn classify_never_yields_high() {
        for message in ["payment", "form", "fetch", "503", "anything else"] {
            assert_ne!(classify(message).severity, Severity::High);
        }
    }
}
