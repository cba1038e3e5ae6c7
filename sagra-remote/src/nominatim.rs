//! OpenStreetMap Nominatim search client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sagra_core::SourceError;
use sagra_core::config::SagraConfig;
use sagra_core::geocode::{Candidate, GeocodeQuery, GeocodingService};
use url::Url;

/// Nominatim's usage policy requires an identifying User-Agent.
const USER_AGENT: &str = concat!("sagra/", env!("CARGO_PKG_VERSION"));

pub struct NominatimClient {
    http: reqwest::Client,
    search_url: Url,
}

impl NominatimClient {
    pub fn new(search_url: &str) -> Result<Self> {
        let search_url = Url::parse(search_url)
            .with_context(|| format!("Invalid geocoding URL: {}", search_url))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(NominatimClient { http, search_url })
    }

    pub fn from_config(config: &SagraConfig) -> Result<Self> {
        Self::new(&config.geocoding_url)
    }

    fn query_url(&self, query: &GeocodeQuery) -> Url {
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("format", "json")
                .append_pair("q", &query.text)
                .append_pair("limit", "1");
            if !query.country_code.is_empty() {
                pairs.append_pair("countrycodes", &query.country_code);
            }
        }
        url
    }
}

fn parse_candidates(body: &str) -> Result<Vec<Candidate>, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))
}

#[async_trait]
impl GeocodingService for NominatimClient {
    async fn search(&self, query: &GeocodeQuery) -> Result<Vec<Candidate>, SourceError> {
        let url = self.query_url(query);
        tracing::debug!(q = %query.text, "nominatim search");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        parse_candidates(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(text: &str, country_code: &str) -> GeocodeQuery {
        GeocodeQuery {
            text: text.into(),
            country_code: country_code.into(),
        }
    }

    #[test]
    fn builds_search_url() {
        let client = NominatimClient::new("https://nominatim.openstreetmap.org/search").unwrap();
        let url = client.query_url(&query("Piazza Duomo, Milano, Italia", "it"));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("format".into(), "json".into()),
                ("q".into(), "Piazza Duomo, Milano, Italia".into()),
                ("limit".into(), "1".into()),
                ("countrycodes".into(), "it".into()),
            ]
        );
        assert_eq!(url.path(), "/search");
    }

    #[test]
    fn omits_empty_country_code() {
        let client = NominatimClient::new("https://nominatim.example.org/search").unwrap();
        let url = client.query_url(&query("Bergamo", ""));
        assert!(!url.query_pairs().any(|(k, _)| k == "countrycodes"));
    }

    #[test]
    fn parses_candidates() {
        let body = r#"[{"place_id": 1, "lat": "45.4641", "lon": "9.1919",
                        "display_name": "Duomo, Milano"}]"#;
        let candidates = parse_candidates(body).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].lat, "45.4641");
        assert_eq!(candidates[0].display_name.as_deref(), Some("Duomo, Milano"));
    }

    #[test]
    fn empty_array_is_no_candidates() {
        assert!(parse_candidates("[]").unwrap().is_empty());
    }

    #[test]
    fn error_object_is_malformed() {
        assert!(matches!(
            parse_candidates(r#"{"error": "rate limited"}"#),
            Err(SourceError::Malformed(_))
        ));
    }
}
