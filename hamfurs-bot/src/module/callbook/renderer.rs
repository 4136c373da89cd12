//! Markdown replies for resolved callsigns, one template per source.

use super::acma::AcmaLicense;
use super::callook::UsLicense;
use super::error::LookupError;
use super::hamqth::HamQthRecord;
use super::ic::IcRecord;
use super::nkom::NkomRecord;
use super::pipeline::Resolved;
use super::types::{CallbookRecord, UnknownCallsign};
use crate::telegram::TextMessage;
use hamfurs_common::flags::{FLAG_AU, FLAG_CA, FLAG_NO, FLAG_US, flag_for_country};
use hamfurs_common::markdown::{escape_markdown, title_case};

const HAMQTH_PROFILE: &str = "https://www.hamqth.com";

pub fn render(resolved: &Resolved) -> TextMessage {
    let text = match &resolved.record {
        CallbookRecord::Us(license) => render_us(license, resolved),
        CallbookRecord::Ca(record) if record.club.is_some() => render_ca_club(record, resolved),
        CallbookRecord::Ca(record) => render_ca_person(record, resolved),
        CallbookRecord::No(record) => render_no(record, resolved),
        CallbookRecord::Au(license) => render_au(license, resolved),
        CallbookRecord::HamQth(record) => render_hamqth(record, resolved),
        CallbookRecord::Unknown(unknown) => render_unknown(unknown, resolved),
    };
    TextMessage::markdown(text).without_preview()
}

pub fn render_error(error: &LookupError) -> TextMessage {
    TextMessage::markdown(escape_markdown(&error.user_message()))
}

fn alias_line(lines: &mut Vec<String>, resolved: &Resolved) {
    if let Some(alias) = &resolved.alias {
        lines.push(format!("*Alias:* {}", alias.display_text()));
    }
}

fn dmr_line(lines: &mut Vec<String>, resolved: &Resolved) {
    if let Some(id) = resolved.dmr_id {
        lines.push(format!("*DMR ID*: {}", id));
    }
}

fn optional_line(lines: &mut Vec<String>, label: &str, value: &str) {
    if !value.trim().is_empty() {
        lines.push(format!("*{}:* {}", label, escape_markdown(value.trim())));
    }
}

/// "a b" with empty parts dropped, escaped.
fn joined(parts: &[&str]) -> String {
    let text = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    escape_markdown(&text)
}

/// "city, region postcode", tolerating missing parts.
fn location(city: &str, region: &str, postcode: &str) -> String {
    let tail = joined(&[region, postcode]);
    match (city.trim().is_empty(), tail.is_empty()) {
        (false, false) => format!("{}, {}", escape_markdown(city.trim()), tail),
        (false, true) => escape_markdown(city.trim()),
        _ => tail,
    }
}

fn render_us(license: &UsLicense, resolved: &Resolved) -> String {
    let mut header = format!(
        "{} *{}* - ({})",
        FLAG_US,
        resolved.callsign,
        title_case(&license.license_type)
    );
    if !license.current.oper_class.is_empty() {
        header.push(' ');
        header.push_str(&title_case(&license.current.oper_class));
    }
    if let Some(count) = resolved.ve_sessions {
        header.push_str(&format!(" VE (Session count: {})", count));
    }

    let mut lines = vec![header, format!("*Name:* {}", escape_markdown(&license.name))];
    alias_line(&mut lines, resolved);

    let grid = &license.location.gridsquare;
    let mut place = escape_markdown(&license.address.line2);
    if !grid.is_empty() {
        place.push_str(&format!(" ({})", grid));
    }
    lines.push(format!("*Location:* {}", place.trim()));

    optional_line(&mut lines, "Granted", &license.other_info.grant_date);
    optional_line(&mut lines, "Expiry", &license.other_info.expiry_date);
    dmr_line(&mut lines, resolved);
    if license.is_club() && !license.trustee.callsign.is_empty() {
        lines.push(format!(
            "*Trustee:* {}, {}",
            license.trustee.callsign,
            escape_markdown(&license.trustee.name)
        ));
    }
    if !license.other_info.uls_url.is_empty() {
        lines.push(format!("[ULS license page]({})", license.other_info.uls_url));
    }
    lines.join("\n")
}

fn render_ca_person(record: &IcRecord, resolved: &Resolved) -> String {
    let qualifications = record.qualifications.labels().join(", ");
    let mut lines = vec![
        format!("{} *{}* - (Person) {}", FLAG_CA, resolved.callsign, qualifications)
            .trim_end()
            .to_string(),
        format!("*Name:* {}", joined(&[&record.name, &record.surname])),
    ];
    alias_line(&mut lines, resolved);
    lines.push(format!(
        "*Location:* {}",
        location(&record.city, &record.province, &record.postcode)
    ));
    dmr_line(&mut lines, resolved);
    lines.join("\n")
}

fn render_ca_club(record: &IcRecord, resolved: &Resolved) -> String {
    let club = record.club.clone().unwrap_or_default();
    let mut lines = vec![
        format!("{} *{}* - (Club)", FLAG_CA, resolved.callsign),
        format!("*Name:* {}", joined(&[&club.name, &club.name2])),
        format!("*Trustee:* {}", joined(&[&record.name, &record.surname])),
    ];
    alias_line(&mut lines, resolved);
    lines.push(format!(
        "*Club location:* {}",
        location(&club.city, &club.province, &club.postcode)
    ));
    dmr_line(&mut lines, resolved);
    lines.join("\n")
}

fn render_no(record: &NkomRecord, resolved: &Resolved) -> String {
    let mut name = joined(&[&record.name, &record.surname]);
    if !record.club.trim().is_empty() {
        name.push_str(&format!(" ({})", escape_markdown(record.club.trim())));
    }
    let mut lines = vec![
        format!(
            "{} *{}* - ({})",
            FLAG_NO,
            resolved.callsign,
            escape_markdown(&record.record_type)
        ),
        format!("*Name:* {}", name),
    ];
    alias_line(&mut lines, resolved);
    optional_line(&mut lines, "Updated", &record.updated);
    optional_line(&mut lines, "Valid", &record.valid);
    optional_line(&mut lines, "Expiry", &record.expiration);
    lines.push(format!(
        "*Location:* {}",
        location(&record.city, &record.country, &record.postcode)
    ));
    dmr_line(&mut lines, resolved);
    lines.join("\n")
}

fn render_au(license: &AcmaLicense, resolved: &Resolved) -> String {
    let mut lines = vec![
        format!(
            "{} *{}* - ({} - {})",
            FLAG_AU,
            resolved.callsign,
            escape_markdown(&license.license_type),
            escape_markdown(&license.status)
        ),
        format!("*Name:* {}", escape_markdown(&license.name)),
    ];
    alias_line(&mut lines, resolved);
    optional_line(&mut lines, "Effective", &license.date_of_effect);
    optional_line(&mut lines, "Expiry", &license.date_of_expiry);
    lines.push(format!(
        "*Location:* {}",
        location(&license.suburb, &license.state, &license.postcode)
    ));
    dmr_line(&mut lines, resolved);
    if !license.link.is_empty() {
        lines.push(format!("[ACMA License Page]({})", license.link));
    }
    lines.join("\n")
}

fn utc_offset(raw: &str) -> String {
    match raw.trim() {
        "" => String::new(),
        offset if offset.starts_with('-') || offset.starts_with('+') => format!(" (UTC{})", offset),
        offset => format!(" (UTC+{})", offset),
    }
}

fn render_hamqth(record: &HamQthRecord, resolved: &Resolved) -> String {
    let country = record
        .adr_country
        .as_deref()
        .or(record.country.as_deref())
        .unwrap_or_default();
    let flag = flag_for_country(country);
    let header = format!(
        "{} *{}*{}",
        flag,
        resolved.callsign,
        utc_offset(record.utc_offset.as_deref().unwrap_or_default())
    );

    let name = match (&record.adr_name, &record.nick) {
        (Some(name), Some(nick)) => format!("{} ({})", escape_markdown(name), escape_markdown(nick)),
        (Some(name), None) => escape_markdown(name),
        (None, Some(nick)) => escape_markdown(nick),
        (None, None) => "Unknown".to_string(),
    };

    let mut lines = vec![header.trim_start().to_string(), format!("*Name:* {}", name)];
    alias_line(&mut lines, resolved);

    let city = record
        .adr_city
        .as_deref()
        .or(record.qth.as_deref())
        .unwrap_or_default();
    let mut place = location(city, country, record.adr_zip.as_deref().unwrap_or_default());
    if let Some(grid) = &record.grid {
        place.push_str(&format!(" ({})", grid));
    }
    if !place.trim().is_empty() {
        lines.push(format!("*Location:* {}", place.trim()));
    }
    dmr_line(&mut lines, resolved);
    lines.push(format!("[HamQTH Profile]({}/{})", HAMQTH_PROFILE, resolved.callsign));
    lines.join("\n")
}

fn render_unknown(unknown: &UnknownCallsign, resolved: &Resolved) -> String {
    let country = unknown.country.and_then(|c| c.name());
    let known_something = country.is_some() || resolved.alias.is_some() || resolved.dmr_id.is_some();

    if !known_something {
        return format!(
            "*{}* was not found\n\
             (We looked everywhere, but that callsign probably isn't in any database we know about)\n\
             [Submit Profile]({}/{})",
            unknown.callsign, HAMQTH_PROFILE, unknown.callsign
        );
    }

    let flag = country.map(flag_for_country).unwrap_or_default();
    let mut lines = vec![format!("{} *{}*", flag, unknown.callsign).trim_start().to_string()];
    alias_line(&mut lines, resolved);
    dmr_line(&mut lines, resolved);
    lines.push(format!(
        "(That's all we know - [Update Profile]({}/{}))",
        HAMQTH_PROFILE, unknown.callsign
    ));
    lines.join("\n")
}
