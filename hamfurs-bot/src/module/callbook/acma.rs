//! Australian licenses from the ACMA register mirror.

use super::error::LookupError;
use super::source::CallbookSource;
use super::types::{CallbookRecord, Source};
use async_trait::async_trait;
use hamfurs_common::Callsign;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcmaLicense {
    /// Not part of the response body; filled in from the query.
    pub callsign: String,
    #[serde(rename = "type")]
    pub license_type: String,
    pub status: String,
    pub name: String,
    pub date_of_effect: String,
    pub date_of_expiry: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub link: String,
}

pub struct AcmaClient {
    client: Client,
    base_url: String,
}

impl AcmaClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CallbookSource for AcmaClient {
    fn source(&self) -> Source {
        Source::Acma
    }

    async fn lookup(&self, callsign: &Callsign) -> Result<Option<CallbookRecord>, LookupError> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(callsign.as_str()));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::transient(Source::Acma, e))?;

        // The register answers unknown callsigns with an error status
        if !response.status().is_success() {
            tracing::debug!("ACMA returned HTTP {} for {}", response.status(), callsign);
            return Ok(None);
        }

        let mut license: AcmaLicense = response
            .json()
            .await
            .map_err(|e| LookupError::transient(Source::Acma, e))?;
        license.callsign = callsign.to_string();
        Ok(Some(CallbookRecord::Au(license)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/VK2ABC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "Amateur Advanced",
                "status": "Current",
                "name": "Jane Citizen",
                "date_of_effect": "2020-01-01",
                "date_of_expiry": "2025-01-01",
                "suburb": "SYDNEY",
                "state": "NSW",
                "postcode": "2000",
                "link": "https://web.acma.gov.au/rrl/licence_search.licence_lookup?pLICENCE_NO=1"
            })))
            .mount(&server)
            .await;

        let client = AcmaClient::new(Client::new(), server.uri());
        let record = client.lookup(&Callsign::parse("vk2abc").unwrap()).await.unwrap();
        match record {
            Some(CallbookRecord::Au(license)) => {
                assert_eq!(license.callsign, "VK2ABC");
                assert_eq!(license.state, "NSW");
                assert_eq!(license.license_type, "Amateur Advanced");
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = AcmaClient::new(Client::new(), server.uri());
        assert_eq!(client.lookup(&Callsign::parse("VK9XX").unwrap()).await.unwrap(), None);
    }
}
