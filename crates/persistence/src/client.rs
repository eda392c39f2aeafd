//! Supabase REST client and connection settings

use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;

use roy_config::StoreConfig;

use crate::error::PersistenceError;

/// Supabase configuration
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    pub api_key: String,
    pub table: String,
    pub timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: "leads".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Build from the `store` settings section
    pub fn from_settings(settings: &StoreConfig) -> Result<Self, PersistenceError> {
        let url = settings
            .url
            .as_deref()
            .ok_or_else(|| PersistenceError::Configuration("SUPABASE_URL not set".into()))?;
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| PersistenceError::Configuration("SUPABASE_ANON_KEY not set".into()))?;

        Ok(Self {
            table: settings.table.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            ..Self::new(url, api_key)
        })
    }
}

/// PostgREST client bound to one table
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, PersistenceError> {
        if config.url.is_empty() || config.api_key.is_empty() {
            return Err(PersistenceError::Configuration(
                "Supabase URL and API key are required".to_string(),
            ));
        }
        tracing::info!(url = %config.url, table = %config.table, "Configuring Supabase lead store");

        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// `{url}/rest/v1/{table}`
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    /// Request against the table with auth headers attached
    pub fn request(&self, method: Method) -> RequestBuilder {
        self.http
            .request(method, self.table_url())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=representation")
    }

    /// Turn a non-success response into [`PersistenceError::Rejected`]
    pub async fn check(response: Response) -> Result<Response, PersistenceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PersistenceError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url() {
        let client =
            SupabaseClient::new(SupabaseConfig::new("https://xyz.supabase.co/", "anon")).unwrap();
        assert_eq!(client.table_url(), "https://xyz.supabase.co/rest/v1/leads");
    }

    #[test]
    fn test_missing_settings() {
        let settings = StoreConfig {
            url: None,
            api_key: Some("anon".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            SupabaseConfig::from_settings(&settings),
            Err(PersistenceError::Configuration(_))
        ));
        assert!(SupabaseClient::new(SupabaseConfig::new("", "anon")).is_err());
    }
}
