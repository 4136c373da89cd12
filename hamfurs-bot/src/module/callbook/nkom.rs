//! Norwegian callbook, imported from the Nkom CSV register.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MIN_COLUMNS: usize = 13;

/// Code page 865 (Nordic DOS), bytes 0x80..=0xFF.
const CP865_HIGH: &str = "ÇüéâäàåçêëèïîìÄÅÉæÆôöòûùÿÖÜø£Ø₧ƒáíóúñÑªº¿⌐¬½¼¡«¤░▒▓│┤╡╢╖╕╣║╗╝╜╛┐└┴┬├─┼╞╟╚╔╩╦╠═╬╧╨╤╥╙╘╒╓╫╪┘┌█▄▌▐▀αßΓπΣσµτΦΘΩδ∞φε∩≡±≥≤⌠⌡÷≈°∙·√ⁿ²■\u{a0}";

static CP865_TABLE: LazyLock<Vec<char>> = LazyLock::new(|| CP865_HIGH.chars().collect());

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NkomRecord {
    pub callsign: String,
    pub club: String,
    pub name: String,
    pub surname: String,
    pub address: String,
    pub address2: String,
    pub city: String,
    pub country: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub postcode: String,
    pub valid: String,
    pub expiration: String,
    /// Register update date, `YYYY-MM-DD` when parseable
    pub updated: String,
    pub comment: String,
    /// Import time, seconds since the epoch
    pub cached: i64,
}

fn decode_cp865(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP865_TABLE
                    .get(usize::from(b - 0x80))
                    .copied()
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            }
        })
        .collect()
}

fn translate_type(raw: &str) -> String {
    match raw {
        "Personlig" => "Person",
        "Organisasjon" => "Organisation",
        "Myndighet" => "Authority",
        "Bedrift" => "Defense",
        "Skole" => "School",
        other => other,
    }
    .to_string()
}

fn normalize_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%d.%m.%Y")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Parse the `;`-delimited CP865 register into records.
pub fn parse_nkom_csv(bytes: &[u8], timestamp: i64) -> Result<Vec<NkomRecord>> {
    let text = decode_cp865(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Malformed Nkom row {}", line + 1))?;
        let field = |i: usize| row.get(i).unwrap_or("").trim().to_string();

        let callsign = field(0).to_uppercase();
        if callsign.is_empty() || row.len() < MIN_COLUMNS {
            tracing::warn!("Skipping Nkom row {} ({} columns)", line + 1, row.len());
            continue;
        }

        records.push(NkomRecord {
            callsign,
            club: field(1),
            name: field(2),
            surname: field(3),
            address: field(4),
            address2: field(5),
            postcode: field(6),
            city: field(7),
            country: field(8),
            record_type: translate_type(&field(9)),
            valid: field(10),
            expiration: field(11),
            updated: normalize_date(&field(12)),
            comment: field(13),
            cached: timestamp,
        });
    }
    Ok(records)
}
