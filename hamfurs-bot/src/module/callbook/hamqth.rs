//! Secondary lookups through the HamQTH XML interface.
//!
//! HamQTH needs a session id obtained with account credentials. The session
//! is created lazily on the first search and reused until the service
//! reports it expired, at which point it is dropped and the search retried.

use super::error::LookupError;
use super::source::CallbookSource;
use super::types::{CallbookRecord, Source};
use async_trait::async_trait;
use hamfurs_common::Callsign;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tokio::sync::Mutex;

const MAX_ATTEMPTS: u32 = 3;
const AGENT: &str = "hamfurs-bot";

static ERROR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("session > error").expect("static selector"));
static SESSION_ID_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("session > session_id").expect("static selector"));
static SEARCH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("search").expect("static selector"));

#[derive(Debug, thiserror::Error)]
pub enum HamQthError {
    #[error("HamQTH authentication failed: {0}")]
    Authentication(String),

    #[error("HamQTH request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HamQTH returned an error: {0}")]
    Remote(String),

    #[error("Malformed HamQTH response: {0}")]
    Malformed(String),

    #[error("HamQTH search gave up after {0} attempts")]
    RetriesExhausted(u32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HamQthRecord {
    pub callsign: String,
    pub nick: Option<String>,
    pub qth: Option<String>,
    pub country: Option<String>,
    pub grid: Option<String>,
    pub adr_name: Option<String>,
    pub adr_city: Option<String>,
    pub adr_zip: Option<String>,
    pub adr_country: Option<String>,
    pub utc_offset: Option<String>,
}

impl HamQthRecord {
    fn from_fields(mut fields: BTreeMap<String, String>) -> Self {
        let mut take = |key: &str| fields.remove(key).filter(|v| !v.is_empty());
        Self {
            callsign: take("callsign").unwrap_or_default().to_uppercase(),
            nick: take("nick"),
            qth: take("qth"),
            country: take("country"),
            grid: take("grid"),
            adr_name: take("adr_name"),
            adr_city: take("adr_city"),
            adr_zip: take("adr_zip"),
            adr_country: take("adr_country"),
            utc_offset: take("utc_offset"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Session(String),
    Search(BTreeMap<String, String>),
    Error(String),
}

fn parse_reply(body: &str) -> Result<Reply, HamQthError> {
    let document = Html::parse_document(body);

    if let Some(error) = document.select(&ERROR_SELECTOR).next() {
        return Ok(Reply::Error(element_text(error)));
    }
    if let Some(session) = document.select(&SESSION_ID_SELECTOR).next() {
        return Ok(Reply::Session(element_text(session)));
    }
    if let Some(search) = document.select(&SEARCH_SELECTOR).next() {
        let fields = search
            .children()
            .filter_map(ElementRef::wrap)
            .map(|child| (child.value().name().to_string(), element_text(child)))
            .collect();
        return Ok(Reply::Search(fields));
    }
    Err(HamQthError::Malformed(
        "no session, search or error element".to_string(),
    ))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[derive(Debug, PartialEq, Eq)]
enum ErrorKind {
    NotFound,
    SessionExpired,
    BadCredentials,
    Other,
}

fn classify_error(message: &str) -> ErrorKind {
    match message {
        "Callsign not found" => ErrorKind::NotFound,
        "Session does not exist or expired" => ErrorKind::SessionExpired,
        "Wrong user name or password" => ErrorKind::BadCredentials,
        _ => ErrorKind::Other,
    }
}

pub struct HamQthClient {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
    session: Mutex<Option<String>>,
}

impl HamQthClient {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            session: Mutex::new(None),
        }
    }

    async fn fetch(&self, query: &[(&str, &str)]) -> Result<Reply, HamQthError> {
        let body = self
            .client
            .get(&self.endpoint)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_reply(&body)
    }

    async fn login(&self) -> Result<String, HamQthError> {
        tracing::info!("Logging in to HamQTH as {}", self.username);
        match self
            .fetch(&[("u", self.username.as_str()), ("p", self.password.as_str())])
            .await?
        {
            Reply::Session(id) if !id.is_empty() => Ok(id),
            Reply::Error(message) => Err(HamQthError::Authentication(message)),
            other => Err(HamQthError::Malformed(format!("unexpected login reply: {other:?}"))),
        }
    }

    async fn session_id(&self) -> Result<String, HamQthError> {
        let mut session = self.session.lock().await;
        if let Some(id) = session.as_ref() {
            return Ok(id.clone());
        }
        let id = self.login().await?;
        *session = Some(id.clone());
        Ok(id)
    }

    pub async fn search(&self, callsign: &Callsign) -> Result<Option<HamQthRecord>, HamQthError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let session_id = self.session_id().await?;
            let reply = self
                .fetch(&[
                    ("id", session_id.as_str()),
                    ("callsign", callsign.as_str()),
                    ("prg", AGENT),
                ])
                .await?;

            match reply {
                Reply::Search(fields) => return Ok(Some(HamQthRecord::from_fields(fields))),
                Reply::Error(message) => match classify_error(&message) {
                    ErrorKind::NotFound => return Ok(None),
                    ErrorKind::SessionExpired => {
                        tracing::debug!(
                            "HamQTH session expired (attempt {}/{}), logging in again",
                            attempt,
                            MAX_ATTEMPTS
                        );
                        *self.session.lock().await = None;
                    }
                    ErrorKind::BadCredentials => return Err(HamQthError::Authentication(message)),
                    ErrorKind::Other => return Err(HamQthError::Remote(message)),
                },
                Reply::Session(_) => {
                    return Err(HamQthError::Malformed("session reply to a search".to_string()));
                }
            }
        }
        Err(HamQthError::RetriesExhausted(MAX_ATTEMPTS))
    }
}

#[async_trait]
impl CallbookSource for HamQthClient {
    fn source(&self) -> Source {
        Source::HamQth
    }

    async fn lookup(&self, callsign: &Callsign) -> Result<Option<CallbookRecord>, LookupError> {
        self.search(callsign)
            .await
            .map(|record| record.map(CallbookRecord::HamQth))
            .map_err(|e| LookupError::transient(Source::HamQth, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SESSION_XML: &str = r#"<?xml version="1.0"?>
<HamQTH version="2.8" xmlns="https://www.hamqth.com">
<session>
<session_id>abc123</session_id>
</session>
</HamQTH>"#;

    const SEARCH_XML: &str = r#"<?xml version="1.0"?>
<HamQTH version="2.8" xmlns="https://www.hamqth.com">
<search>
<callsign>ok1rr</callsign>
<nick>Petr</nick>
<qth>Neratovice</qth>
<country>Czech Republic</country>
<grid>JO70GG</grid>
<adr_name>Petr Hlozek</adr_name>
<adr_city>Neratovice</adr_city>
<adr_zip>27711</adr_zip>
<adr_country>Czech Republic</adr_country>
<utc_offset>1</utc_offset>
<lotw></lotw>
</search>
</HamQTH>"#;

    fn error_xml(message: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<HamQTH version="2.8" xmlns="https://www.hamqth.com">
<session>
<error>{}</error>
</session>
</HamQTH>"#,
            message
        )
    }

    fn xml(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(body.to_string())
    }

    fn client(server: &MockServer) -> HamQthClient {
        HamQthClient::new(Client::new(), format!("{}/xml.php", server.uri()), "user", "pass")
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(parse_reply(SESSION_XML).unwrap(), Reply::Session("abc123".into()));
        assert_eq!(
            parse_reply(&error_xml("Callsign not found")).unwrap(),
            Reply::Error("Callsign not found".into())
        );

        let Reply::Search(fields) = parse_reply(SEARCH_XML).unwrap() else {
            panic!("expected search reply");
        };
        let record = HamQthRecord::from_fields(fields);
        assert_eq!(record.callsign, "OK1RR");
        assert_eq!(record.nick.as_deref(), Some("Petr"));
        assert_eq!(record.grid.as_deref(), Some("JO70GG"));
        assert_eq!(record.utc_offset.as_deref(), Some("1"));

        assert!(matches!(parse_reply("<html></html>"), Err(HamQthError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_search_logs_in_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("u", "user"))
            .respond_with(xml(SESSION_XML))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("id", "abc123"))
            .and(query_param("callsign", "OK1RR"))
            .respond_with(xml(SEARCH_XML))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server);
        let callsign = Callsign::parse("ok1rr").unwrap();
        assert!(client.search(&callsign).await.unwrap().is_some());
        assert!(client.search(&callsign).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_session_is_renewed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("u", "user"))
            .respond_with(xml(SESSION_XML))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("callsign", "OK1RR"))
            .respond_with(xml(&error_xml("Session does not exist or expired")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("callsign", "OK1RR"))
            .respond_with(xml(SEARCH_XML))
            .mount(&server)
            .await;

        let record = client(&server)
            .search(&Callsign::parse("OK1RR").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.adr_city.as_deref(), Some("Neratovice"));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("u", "user"))
            .respond_with(xml(SESSION_XML))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("callsign", "OK1RR"))
            .respond_with(xml(&error_xml("Session does not exist or expired")))
            .expect(u64::from(MAX_ATTEMPTS))
            .mount(&server)
            .await;

        let err = client(&server)
            .search(&Callsign::parse("OK1RR").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, HamQthError::RetriesExhausted(3)));
    }

    #[tokio::test]
    async fn test_not_found_and_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("u", "user"))
            .respond_with(xml(SESSION_XML))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("callsign", "ZZ1ZZZ"))
            .respond_with(xml(&error_xml("Callsign not found")))
            .mount(&server)
            .await;
        let client = client(&server);
        assert_eq!(client.search(&Callsign::parse("ZZ1ZZZ").unwrap()).await.unwrap(), None);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(xml(&error_xml("Wrong user name or password")))
            .mount(&server)
            .await;
        let err = HamQthClient::new(Client::new(), server.uri(), "user", "bad")
            .lookup(&Callsign::parse("OK1RR").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Transient { origin: Source::HamQth, .. }));
    }
}
