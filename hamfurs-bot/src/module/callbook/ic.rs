//! Canadian callbook, imported from the ISED (IC) amateur CSV dump.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Minimum columns in a row: callsign, address block and qualifications.
const MIN_COLUMNS: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcRecord {
    pub callsign: String,
    pub name: String,
    pub surname: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postcode: String,
    pub qualifications: IcQualifications,
    pub club: Option<IcClub>,
    /// Import time, seconds since the epoch
    pub updated: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcQualifications {
    pub basic: bool,
    #[serde(rename = "5wpm")]
    pub morse_5wpm: bool,
    #[serde(rename = "12wpm")]
    pub morse_12wpm: bool,
    pub advanced: bool,
    pub basic_honours: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcClub {
    pub name: String,
    pub name2: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postcode: String,
}

impl IcQualifications {
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.basic, "Basic"),
            (self.morse_5wpm, "5WPM"),
            (self.morse_12wpm, "12WPM"),
            (self.advanced, "Advanced"),
            (self.basic_honours, "Basic Honours"),
        ]
        .into_iter()
        .filter_map(|(held, label)| held.then_some(label))
        .collect()
    }
}

/// Parse the `;`-delimited ISO-8859-14 dump into records.
pub fn parse_ic_csv(bytes: &[u8], timestamp: i64) -> Result<Vec<IcRecord>> {
    let (text, _, had_errors) = encoding_rs::ISO_8859_14.decode(bytes);
    if had_errors {
        tracing::warn!("IC dump contained bytes outside ISO-8859-14");
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Malformed IC row {}", line + 1))?;
        let field = |i: usize| row.get(i).unwrap_or("").trim().to_string();

        let callsign = field(0).to_uppercase();
        if callsign.is_empty() || callsign == "CALLSIGN" {
            continue;
        }
        if row.len() < MIN_COLUMNS {
            tracing::warn!("Skipping short IC row {} ({} columns)", line + 1, row.len());
            continue;
        }

        let club = (!field(12).is_empty()).then(|| IcClub {
            name: field(12),
            name2: field(13),
            address: field(14),
            city: field(15),
            province: field(16),
            postcode: field(17),
        });

        records.push(IcRecord {
            callsign,
            name: field(1),
            surname: field(2),
            address: field(3),
            city: field(4),
            province: field(5),
            postcode: field(6),
            qualifications: IcQualifications {
                basic: field(7) == "A",
                morse_5wpm: field(8) == "B",
                morse_12wpm: field(9) == "C",
                advanced: field(10) == "D",
                basic_honours: field(11) == "E",
            },
            club,
            updated: timestamp,
        });
    }
    Ok(records)
}
