//! Jurisdiction classification for callsigns.
//!
//! Classification runs in two stages. The fast path looks only at the first
//! two characters and recognizes the jurisdictions with a locally cached or
//! dedicated callbook (Canada, Norway, Australia). Everything else is matched
//! against an ordered table of ITU prefix patterns; the first match wins.

use crate::callsign::Callsign;
use regex::Regex;
use std::sync::LazyLock;

const CANADA_PREFIXES: &[&str] = &["VE", "VA", "VO", "VY", "CY"];
const NORWAY_PREFIXES: &[&str] = &["JW", "JX", "3Y", "LA", "LB", "LC", "LD", "LE", "LF", "LG", "LH", "LI", "LJ", "LK", "LL", "LM", "LN"];
const AUSTRALIA_PREFIXES: &[&str] = &["VK", "VI", "AX"];

/// Countries known to the ITU prefix table, in match precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItuCountry {
    /// Structurally a callsign, but from a block with no callbook behind it.
    Unavailable,
    UnitedStates,
    Spain,
    Pakistan,
    India,
    Australia,
    Argentina,
    Canada,
    Netherlands,
    Germany,
    UnitedKingdom,
}

impl ItuCountry {
    pub const ALL: [ItuCountry; 11] = [
        ItuCountry::Unavailable,
        ItuCountry::UnitedStates,
        ItuCountry::Spain,
        ItuCountry::Pakistan,
        ItuCountry::India,
        ItuCountry::Australia,
        ItuCountry::Argentina,
        ItuCountry::Canada,
        ItuCountry::Netherlands,
        ItuCountry::Germany,
        ItuCountry::UnitedKingdom,
    ];

    /// Display name, `None` for [`ItuCountry::Unavailable`].
    pub fn name(&self) -> Option<&'static str> {
        match self {
            ItuCountry::Unavailable => None,
            ItuCountry::UnitedStates => Some("United States"),
            ItuCountry::Spain => Some("Spain"),
            ItuCountry::Pakistan => Some("Pakistan"),
            ItuCountry::India => Some("India"),
            ItuCountry::Australia => Some("Australia"),
            ItuCountry::Argentina => Some("Argentina"),
            ItuCountry::Canada => Some("Canada"),
            ItuCountry::Netherlands => Some("Netherlands"),
            ItuCountry::Germany => Some("Germany"),
            ItuCountry::UnitedKingdom => Some("United Kingdom"),
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            ItuCountry::Unavailable => r"^((?:[0-9]{2})|Q)[A-Z]{0,1}[0-9][A-Z]{1,4}$",
            ItuCountry::UnitedStates => r"^((?:A[A-L][A-Z]?)|(?:[KNW][A-Z]{0,2}))([0-9])[A-Z0-9]{0,3}[A-Z]$",
            ItuCountry::Spain => r"^((?:A[M-O][A-Z]?)|(?:E[A-H][A-Z]?))([0-9])[A-Z0-9]{0,3}[A-Z]$",
            ItuCountry::Pakistan => r"^((?:A[P-S][A-Z]?)|(?:6[P-S][A-Z]?))([0-9])[A-Z0-9]{0,3}[A-Z]$",
            ItuCountry::India => {
                r"^((?:A[T-W][A-Z]?)|(?:V[T-W][A-Z]?)|(?:8[T-Y][A-Z]?))([0-9])[A-Z0-9]{0,3}[A-Z]$"
            }
            ItuCountry::Australia => r"^((?:AX[A-Z]?)|(?:V[H-NZ][A-Z]?))([0-9])[A-Z0-9]{0,3}[A-Z]$",
            ItuCountry::Argentina => {
                r"^((?:A[YZ][A-Z]?)|(?:L[O-W][A-Z]?)|(?:L[2-9][A-Z]?))([0-9])[A-Z0-9]{0,3}[A-Z]$"
            }
            ItuCountry::Canada => {
                r"^((?:V[A-GOX-Y][A-Z]?)|(?:X[J-O][A-Z]?)|(?:C[F-KYZ][A-Z]?))([0-9])[A-Z0-9]{0,3}[A-Z]$"
            }
            ItuCountry::Netherlands => r"^(P[A-J][A-Z]?)([0-9])[A-Z0-9]{0,3}[A-Z]$",
            ItuCountry::Germany => r"^((?:D[A-R][A-Z]?)|(?:Y[2-9][A-Z]{1,2}))([0-9])[A-Z0-9]{0,3}[A-Z]$",
            ItuCountry::UnitedKingdom => {
                r"^((?:[GM2][A-Z]{0,2})|(?:V[P-QS][A-Z]{0,2})|(?:Z[B-JNOQ][A-Z]?)|(?:2[A-Z]{1,2}))([0-9])[A-Z0-9]{0,3}[A-Z]$"
            }
        }
    }
}

static ITU_TABLE: LazyLock<Vec<(ItuCountry, Regex)>> = LazyLock::new(|| {
    ItuCountry::ALL
        .iter()
        .map(|country| {
            let regex = Regex::new(&format!("(?i){}", country.pattern()))
                .expect("ITU prefix patterns are static and valid");
            (*country, regex)
        })
        .collect()
});

/// Result of classifying a callsign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jurisdiction {
    Us,
    Ca,
    No,
    Au,
    /// Matched an ITU block that has no dedicated adapter.
    Other(ItuCountry),
    Unclassified,
}

/// Two-character prefix check, tried in Canada, Norway, Australia order.
pub fn fast_path(callsign: &Callsign) -> Option<Jurisdiction> {
    let prefix = callsign.prefix(2);
    if CANADA_PREFIXES.contains(&prefix) {
        Some(Jurisdiction::Ca)
    } else if NORWAY_PREFIXES.contains(&prefix) {
        Some(Jurisdiction::No)
    } else if AUSTRALIA_PREFIXES.contains(&prefix) {
        Some(Jurisdiction::Au)
    } else {
        None
    }
}

/// First ITU table entry matching `callsign`.
pub fn itu_country(callsign: &str) -> Option<ItuCountry> {
    ITU_TABLE
        .iter()
        .find(|(_, regex)| regex.is_match(callsign))
        .map(|(country, _)| *country)
}

pub fn classify(callsign: &Callsign) -> Jurisdiction {
    if let Some(jurisdiction) = fast_path(callsign) {
        return jurisdiction;
    }
    match itu_country(callsign.as_str()) {
        Some(ItuCountry::UnitedStates) => Jurisdiction::Us,
        Some(country) => Jurisdiction::Other(country),
        None => Jurisdiction::Unclassified,
    }
}
