use std::time::Duration;

/// Runtime settings for the billing flow.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingConfig {
    /// ISO currency code attached to recorded payments.
    pub currency: String,
    /// Advisory limit on how long a caller waits for a capture.
    pub wait_timeout: Option<Duration>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            wait_timeout: None,
        }
    }
}

impl BillingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source; unparsable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            currency: lookup("BILLING_CURRENCY")
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or(defaults.currency),
            wait_timeout: lookup("CAPTURE_WAIT_TIMEOUT_MS")
                .and_then(|ms| ms.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(BillingConfig::from_lookup(|_| None), BillingConfig::default());
    }

    #[test]
    fn test_reads_variables() {
        let vars = HashMap::from([
            ("BILLING_CURRENCY", "eur"),
            ("CAPTURE_WAIT_TIMEOUT_MS", "1500"),
        ]);
        let config = BillingConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.wait_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let config = BillingConfig::from_lookup(|k| {
            (k == "CAPTURE_WAIT_TIMEOUT_MS").then(|| "soon".to_string())
        });
        assert_eq!(config.wait_timeout, None);
    }
}
