//! Referrer validation predicate
//!
//! The gate is a weak access precondition over the ambient referring-page string:
//! an empty referrer and anything containing "localhost" pass (development bypass),
//! as does anything containing the configured trusted-domain substring. The check is
//! a plain substring match and trivially spoofable; this is preserved deliberately.

use tracing::debug;

/// Pure predicate over the ambient referrer string
#[derive(Debug, Clone)]
pub struct ReferrerGate {
    trusted_domain: String,
}

impl ReferrerGate {
    pub fn new(trusted_domain: impl Into<String>) -> Self {
        Self {
            trusted_domain: trusted_domain.into(),
        }
    }

    /// Returns true if the session arrived via a trusted referrer
    pub fn is_valid(&self, referrer: Option<&str>) -> bool {
        let referrer = referrer.unwrap_or("");

        if referrer.is_empty() || referrer.contains("localhost") {
            debug!("Development mode: skipping referrer check");
            return true;
        }

        referrer.contains(&self.trusted_domain)
    }
}
