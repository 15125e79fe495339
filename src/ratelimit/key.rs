//! Counter key generation and handling.

use std::fmt;

/// The scope a counter applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A specific endpoint, counted hourly and subject to cooldown.
    Endpoint(String),
    /// The per-subject daily counter shared by every endpoint.
    Daily,
}

/// A key that uniquely identifies a rate limit counter.
///
/// Equality is structural over the subject and scope, so no choice of
/// delimiter in either part can make two distinct keys collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    /// The caller identity
    pub subject: String,
    /// What the counter tracks for that caller
    pub scope: Scope,
}

impl RateKey {
    /// Key for the hourly and cooldown counter of one endpoint.
    pub fn endpoint(subject: &str, endpoint: &str) -> Self {
        Self {
            subject: subject.to_string(),
            scope: Scope::Endpoint(endpoint.to_string()),
        }
    }

    /// Key for the daily counter of a subject.
    pub fn daily(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            scope: Scope::Daily,
        }
    }

    /// Whether this key tracks the daily counter.
    pub fn is_daily(&self) -> bool {
        matches!(self.scope, Scope::Daily)
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Scope::Endpoint(endpoint) => write!(f, "{}|{}", self.subject, endpoint),
            Scope::Daily => write!(f, "{}|daily", self.subject),
        }
    }
}
