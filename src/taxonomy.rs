use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TaxoError;

const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Identification sent with every E-utilities request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrezCredentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

pub trait TaxonomyClient: Send + Sync {
    /// `Ok(None)` when the service answered but holds no record for `tax_id`.
    fn scientific_name(&self, tax_id: u64) -> Result<Option<String>, TaxoError>;
}

#[derive(Clone)]
pub struct NcbiTaxonomyClient {
    client: Client,
    base_url: String,
    credentials: EntrezCredentials,
}

impl NcbiTaxonomyClient {
    pub fn new(credentials: EntrezCredentials) -> Result<Self, TaxoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("taxodb/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| TaxoError::TaxonomyHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| TaxoError::TaxonomyHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: EUTILS_BASE_URL.to_string(),
            credentials,
        })
    }

    fn summary_url(&self) -> String {
        format!("{}/esummary.fcgi", self.base_url)
    }

    fn query_params(&self, tax_id: u64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "taxonomy".to_string()),
            ("id", tax_id.to_string()),
            ("retmode", "json".to_string()),
            ("tool", "taxodb".to_string()),
        ];
        if let Some(email) = non_empty(self.credentials.email.as_deref()) {
            params.push(("email", email.to_string()));
        }
        if let Some(api_key) = non_empty(self.credentials.api_key.as_deref()) {
            params.push(("api_key", api_key.to_string()));
        }
        params
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, TaxoError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "taxonomy request failed".to_string());
        Err(TaxoError::TaxonomyStatus { status, message })
    }
}

impl TaxonomyClient for NcbiTaxonomyClient {
    fn scientific_name(&self, tax_id: u64) -> Result<Option<String>, TaxoError> {
        let response = self
            .client
            .get(self.summary_url())
            .query(&self.query_params(tax_id))
            .send()
            .map_err(|err| TaxoError::TaxonomyHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let body: Value = response
            .json()
            .map_err(|err| TaxoError::TaxonomyHttp(err.to_string()))?;
        parse_esummary(&body, tax_id)
    }
}

/// Pulls `scientificname` for `tax_id` out of an esummary JSON document.
pub fn parse_esummary(body: &Value, tax_id: u64) -> Result<Option<String>, TaxoError> {
    if let Some(error) = body.get("error") {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(TaxoError::TaxonomyService(message));
    }

    let Some(result) = body.get("result") else {
        // esummaryresult carries messages like "Invalid uid" with no result block
        return Ok(None);
    };

    let uid = tax_id.to_string();
    let listed = result
        .get("uids")
        .and_then(|v| v.as_array())
        .map(|uids| uids.iter().any(|v| v.as_str() == Some(uid.as_str())))
        .unwrap_or(false);
    if !listed {
        return Ok(None);
    }

    let Some(entry) = result.get(&uid) else {
        return Ok(None);
    };
    if entry.get("error").is_some() {
        return Ok(None);
    }

    Ok(entry
        .get("scientificname")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
