//! Country name to flag emoji lookup.

pub const FLAG_US: &str = "🇺🇸";
pub const FLAG_CA: &str = "🇨🇦";
pub const FLAG_NO: &str = "🇳🇴";
pub const FLAG_AU: &str = "🇦🇺";

/// Country names as reported by callbooks, mapped to ISO 3166-1 alpha-2.
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("Argentina", "AR"),
    ("Australia", "AU"),
    ("Austria", "AT"),
    ("Belgium", "BE"),
    ("Brazil", "BR"),
    ("Bulgaria", "BG"),
    ("Canada", "CA"),
    ("Chile", "CL"),
    ("China", "CN"),
    ("Colombia", "CO"),
    ("Croatia", "HR"),
    ("Cuba", "CU"),
    ("Czech Republic", "CZ"),
    ("Czechia", "CZ"),
    ("Denmark", "DK"),
    ("England", "GB"),
    ("Estonia", "EE"),
    ("Finland", "FI"),
    ("France", "FR"),
    ("Germany", "DE"),
    ("Fed. Rep. of Germany", "DE"),
    ("Greece", "GR"),
    ("Hong Kong", "HK"),
    ("Hungary", "HU"),
    ("Iceland", "IS"),
    ("India", "IN"),
    ("Indonesia", "ID"),
    ("Ireland", "IE"),
    ("Israel", "IL"),
    ("Italy", "IT"),
    ("Japan", "JP"),
    ("Latvia", "LV"),
    ("Lithuania", "LT"),
    ("Luxembourg", "LU"),
    ("Malaysia", "MY"),
    ("Mexico", "MX"),
    ("Netherlands", "NL"),
    ("New Zealand", "NZ"),
    ("Northern Ireland", "GB"),
    ("Norway", "NO"),
    ("Pakistan", "PK"),
    ("Peru", "PE"),
    ("Philippines", "PH"),
    ("Poland", "PL"),
    ("Portugal", "PT"),
    ("Puerto Rico", "PR"),
    ("Romania", "RO"),
    ("Russia", "RU"),
    ("European Russia", "RU"),
    ("Asiatic Russia", "RU"),
    ("Scotland", "GB"),
    ("Serbia", "RS"),
    ("Singapore", "SG"),
    ("Slovakia", "SK"),
    ("Slovak Republic", "SK"),
    ("Slovenia", "SI"),
    ("South Africa", "ZA"),
    ("South Korea", "KR"),
    ("Republic of Korea", "KR"),
    ("Spain", "ES"),
    ("Sweden", "SE"),
    ("Switzerland", "CH"),
    ("Taiwan", "TW"),
    ("Thailand", "TH"),
    ("Turkey", "TR"),
    ("Ukraine", "UA"),
    ("United Kingdom", "GB"),
    ("United States", "US"),
    ("USA", "US"),
    ("Uruguay", "UY"),
    ("Venezuela", "VE"),
    ("Wales", "GB"),
];

/// Build the regional-indicator emoji for a two-letter country code.
pub fn flag_for_iso(code: &str) -> Option<String> {
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    code.to_ascii_uppercase()
        .chars()
        .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

pub fn iso_for_country(name: &str) -> Option<&'static str> {
    let name = name.trim();
    COUNTRY_CODES
        .iter()
        .find(|(country, _)| country.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

/// Flag emoji for a country name, empty when the country is unknown.
pub fn flag_for_country(name: &str) -> String {
    iso_for_country(name)
        .and_then(flag_for_iso)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_for_iso() {
        assert_eq!(flag_for_iso("us").as_deref(), Some(FLAG_US));
        assert_eq!(flag_for_iso("CA").as_deref(), Some(FLAG_CA));
        assert_eq!(flag_for_iso("NO").as_deref(), Some(FLAG_NO));
        assert_eq!(flag_for_iso("USA"), None);
        assert_eq!(flag_for_iso("1A"), None);
    }

    #[test]
    fn test_flag_for_country() {
        assert_eq!(flag_for_country("Australia"), FLAG_AU);
        assert_eq!(flag_for_country("  germany "), "🇩🇪");
        assert_eq!(flag_for_country("Scotland"), "🇬🇧");
        assert_eq!(flag_for_country("Atlantis"), "");
    }
}
