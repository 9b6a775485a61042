//! Runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the
//! services that need it; nothing in the core reads environment variables
//! during request handling. The admin passkey lives here as an injected
//! value and is compared at exactly one boundary
//! ([`AppConfig::is_admin_passkey`]).

use crate::error::{CoreError, CoreResult};
use carebook_types::NonEmptyText;

/// Application configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    clinic_name: NonEmptyText,
    admin_passkey: Option<String>,
    storage_endpoint: String,
}

impl AppConfig {
    /// Creates a new `AppConfig`.
    ///
    /// The clinic name brands outbound notifications and must be non-empty.
    /// An empty or whitespace-only passkey is treated as "no admin access
    /// configured", which locks the admin surface rather than opening it.
    pub fn new(
        clinic_name: impl AsRef<str>,
        admin_passkey: Option<String>,
        storage_endpoint: impl Into<String>,
    ) -> CoreResult<Self> {
        let clinic_name = NonEmptyText::new(clinic_name)
            .map_err(|_| CoreError::InvalidInput("clinic name cannot be empty".into()))?;

        let admin_passkey = admin_passkey
            .map(|key| key.trim().to_owned())
            .filter(|key| !key.is_empty());

        Ok(Self {
            clinic_name,
            admin_passkey,
            storage_endpoint: storage_endpoint.into(),
        })
    }

    pub fn clinic_name(&self) -> &str {
        self.clinic_name.as_str()
    }

    pub fn storage_endpoint(&self) -> &str {
        &self.storage_endpoint
    }

    /// The single comparison point for the admin gate. Returns `false` when
    /// no passkey is configured.
    pub fn is_admin_passkey(&self, provided: &str) -> bool {
        match &self.admin_passkey {
            Some(expected) => provided == expected,
            None => false,
        }
    }
}
