//! Service-call seam to the home-automation platform
//!
//! Playback and announcements are both "call `<domain>.<service>` with a JSON
//! payload". [`ServiceCaller`] is the one trait the controller depends on; the
//! REST client implements it in production and tests substitute a recorder.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// `<domain>.<service>` address of a platform service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAddress {
    pub domain: String,
    pub service: String,
}

impl ServiceAddress {
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
        }
    }
}

impl FromStr for ServiceAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('.') {
            Some((domain, service))
                if !domain.is_empty() && !service.is_empty() && !service.contains('.') =>
            {
                Ok(Self::new(domain, service))
            }
            _ => Err(Error::Config(format!(
                "Invalid service address '{}', expected <domain>.<service>",
                s
            ))),
        }
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.service)
    }
}

/// A single service invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub address: ServiceAddress,
    pub data: Value,
}

/// Performs service calls and waits for them to complete
///
/// Implementations return [`Error::PlaybackService`] on any failure; they never
/// panic and never retry.
#[async_trait]
pub trait ServiceCaller: Send + Sync {
    async fn call(&self, call: &ServiceCall) -> Result<()>;
}
