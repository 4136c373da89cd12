//! US licenses via the callook.info JSON API.

use super::error::LookupError;
use super::source::CallbookSource;
use super::types::{CallbookRecord, Source};
use async_trait::async_trait;
use hamfurs_common::Callsign;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsLicense {
    pub status: String,
    #[serde(rename = "type")]
    pub license_type: String,
    pub current: CurrentCallsign,
    pub trustee: Trustee,
    pub name: String,
    pub address: Address,
    pub location: Location,
    #[serde(rename = "otherInfo")]
    pub other_info: OtherInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentCallsign {
    pub callsign: String,
    #[serde(rename = "operClass")]
    pub oper_class: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trustee {
    pub callsign: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub attn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub latitude: String,
    pub longitude: String,
    pub gridsquare: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OtherInfo {
    pub grant_date: String,
    pub expiry_date: String,
    pub last_action_date: String,
    pub frn: String,
    pub uls_url: String,
}

impl UsLicense {
    pub fn is_valid(&self) -> bool {
        self.status == "VALID"
    }

    pub fn is_club(&self) -> bool {
        self.license_type.eq_ignore_ascii_case("CLUB")
    }
}

pub struct CallookClient {
    client: Client,
    base_url: String,
}

impl CallookClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CallbookSource for CallookClient {
    fn source(&self) -> Source {
        Source::Callook
    }

    async fn lookup(&self, callsign: &Callsign) -> Result<Option<CallbookRecord>, LookupError> {
        let url = format!(
            "{}/{}/json",
            self.base_url,
            urlencoding::encode(callsign.as_str())
        );
        tracing::debug!("Querying callook: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::transient(Source::Callook, e))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("callook returned HTTP {} for {}", status, callsign);
            return Err(LookupError::transient(Source::Callook, format!("HTTP {}", status)));
        }

        let license: UsLicense = response
            .json()
            .await
            .map_err(|e| LookupError::transient(Source::Callook, e))?;
        if !license.is_valid() {
            tracing::debug!("callook status for {} is {}", callsign, license.status);
            return Ok(None);
        }
        Ok(Some(CallbookRecord::Us(license)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn kf3rry_json() -> serde_json::Value {
        json!({
            "status": "VALID",
            "type": "PERSON",
            "current": {"callsign": "KF3RRY", "operClass": "GENERAL"},
            "previous": {"callsign": "", "operClass": ""},
            "trustee": {"callsign": "", "name": ""},
            "name": "TERRY HAM",
            "address": {"line1": "1 MAIN ST", "line2": "PITTSBURGH, PA 15213", "attn": ""},
            "location": {"latitude": "40.44", "longitude": "-79.99", "gridsquare": "FN00aj"},
            "otherInfo": {
                "grantDate": "03/01/2018",
                "expiryDate": "03/01/2028",
                "lastActionDate": "03/01/2018",
                "frn": "0012345678",
                "ulsUrl": "http://wireless2.fcc.gov/UlsApp/UlsSearch/license.jsp?licKey=1"
            }
        })
    }

    fn callsign(raw: &str) -> Callsign {
        Callsign::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_valid_license() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/KF3RRY/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(kf3rry_json()))
            .mount(&server)
            .await;

        let client = CallookClient::new(Client::new(), server.uri());
        let record = client.lookup(&callsign("kf3rry")).await.unwrap();
        match record {
            Some(CallbookRecord::Us(license)) => {
                assert_eq!(license.current.oper_class, "GENERAL");
                assert_eq!(license.location.gridsquare, "FN00aj");
                assert!(license.other_info.uls_url.starts_with("http://wireless2"));
                assert!(!license.is_club());
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_status_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ZZ1ZZZ/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "INVALID"})))
            .mount(&server)
            .await;

        let client = CallookClient::new(Client::new(), server.uri());
        assert_eq!(client.lookup(&callsign("ZZ1ZZZ")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = CallookClient::new(Client::new(), server.uri());
        let err = client.lookup(&callsign("W1AW")).await.unwrap_err();
        assert!(matches!(err, LookupError::Transient { origin: Source::Callook, .. }));
    }
}
