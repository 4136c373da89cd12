//! Best-effort DMR id and VE session count decorations.

use crate::store::Collection;
use anyhow::{Context, Result, bail};
use hamfurs_common::Callsign;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One entry of the radioid.net user dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmrUser {
    pub radio_id: u64,
    pub callsign: String,
    pub fname: String,
    pub surname: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VeSessionCount {
    pub callsign: String,
    pub name: String,
    pub count: u32,
    pub state: String,
    pub updated: i64,
}

#[derive(Deserialize)]
struct DmrDump {
    users: Vec<DmrUser>,
}

pub struct Enrichment {
    dmr: Arc<Collection<DmrUser>>,
    ve_sessions: Arc<Collection<VeSessionCount>>,
}

impl Enrichment {
    pub fn new(dmr: Arc<Collection<DmrUser>>, ve_sessions: Arc<Collection<VeSessionCount>>) -> Self {
        Self { dmr, ve_sessions }
    }

    pub async fn dmr_id(&self, callsign: &Callsign) -> Option<u64> {
        self.dmr.get(callsign.as_str()).await.map(|user| user.radio_id)
    }

    pub async fn ve_sessions(&self, callsign: &Callsign) -> Option<u32> {
        self.ve_sessions
            .get(callsign.as_str())
            .await
            .map(|ve| ve.count)
    }
}

/// Parse the radioid.net `users.json` dump.
pub fn parse_radioid_users(json: &str) -> Result<Vec<DmrUser>> {
    let dump: DmrDump = serde_json::from_str(json).context("Malformed radioid.net dump")?;
    Ok(dump
        .users
        .into_iter()
        .filter(|user| !user.callsign.trim().is_empty())
        .map(|mut user| {
            user.callsign = user.callsign.trim().to_uppercase();
            user
        })
        .collect())
}

/// Parse a saved ARRL "VE session counts" page for one state.
///
/// The first table holds a header row followed by `CALL (Name) | count` rows.
pub fn parse_ve_session_page(html: &str, state: &str, timestamp: i64) -> Result<Vec<VeSessionCount>> {
    let document = Html::parse_document(html);
    let table = Selector::parse("table").map_err(|e| anyhow::anyhow!("{e}"))?;
    let rows = Selector::parse("tr").map_err(|e| anyhow::anyhow!("{e}"))?;
    let cells = Selector::parse("td").map_err(|e| anyhow::anyhow!("{e}"))?;

    let Some(table) = document.select(&table).next() else {
        bail!("No table found for state {}", state);
    };

    let mut counts = Vec::new();
    for row in table.select(&rows).skip(1) {
        let columns: Vec<String> = row
            .select(&cells)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();
        let [examiner, count, ..] = columns.as_slice() else {
            continue;
        };

        let (callsign, name) = match examiner.split_once('(') {
            Some((callsign, name)) => (callsign.trim(), name.trim().trim_end_matches(')')),
            None => (examiner.trim(), ""),
        };
        let count = count
            .replace(',', "")
            .parse()
            .with_context(|| format!("Bad session count '{}' for {}", count, callsign))?;

        counts.push(VeSessionCount {
            callsign: callsign.to_uppercase(),
            name: name.to_string(),
            count,
            state: state.to_string(),
            updated: timestamp,
        });
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_radioid_users() {
        let users = parse_radioid_users(
            r#"{"users": [
                {"radio_id": 3142001, "callsign": "kf3rry", "fname": "Terry", "surname": "Ham",
                 "city": "Pittsburgh", "state": "Pennsylvania", "country": "United States", "remarks": ""},
                {"radio_id": 3142002, "callsign": " ", "fname": "Nobody"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].callsign, "KF3RRY");
        assert_eq!(users[0].radio_id, 3142001);
    }

    #[test]
    fn test_parse_ve_session_page() {
        let html = r#"<html><body>
            <table>
              <tr><th>VE</th><th>Sessions</th></tr>
              <tr><td>KF3RRY (Terry Ham)</td><td>12</td></tr>
              <tr><td>W1AW (Hiram Maxim)</td><td>1,204</td></tr>
              <tr><td></td><td></td></tr>
            </table>
            <table><tr><td>ignored</td><td>1</td></tr></table>
        </body></html>"#;

        let counts = parse_ve_session_page(html, "PA", 5).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].callsign, "KF3RRY");
        assert_eq!(counts[0].name, "Terry Ham");
        assert_eq!(counts[0].count, 12);
        assert_eq!(counts[0].state, "PA");
        assert_eq!(counts[1].count, 1204);
    }

    #[test]
    fn test_page_without_table_fails() {
        assert!(parse_ve_session_page("<html></html>", "VA", 0).is_err());
    }

    #[tokio::test]
    async fn test_enrichment_lookups() {
        let dmr = Collection::from_docs(
            "dmr",
            [("KF3RRY".to_string(), DmrUser { radio_id: 3142001, callsign: "KF3RRY".into(), ..Default::default() })],
        );
        let ve = Collection::from_docs(
            "ve_sessions",
            [("KF3RRY".to_string(), VeSessionCount { callsign: "KF3RRY".into(), count: 12, ..Default::default() })],
        );
        let enrichment = Enrichment::new(Arc::new(dmr), Arc::new(ve));

        let known = Callsign::parse("kf3rry").unwrap();
        let unknown = Callsign::parse("W1AW").unwrap();
        assert_eq!(enrichment.dmr_id(&known).await, Some(3142001));
        assert_eq!(enrichment.ve_sessions(&known).await, Some(12));
        assert_eq!(enrichment.dmr_id(&unknown).await, None);
        assert_eq!(enrichment.ve_sessions(&unknown).await, None);
    }
}
