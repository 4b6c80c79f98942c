//! Home network lookup from the IMSI prefix (MCC + MNC).

/// Known (prefix, country, network) triples. MNCs are two or three digits,
/// so prefixes differ in length and the longest match wins.
const IMSI_PREFIXES: &[(&str, &str, &str)] = &[
    ("60600", "Libya", "Libyana"),
    ("60601", "Libya", "Almadar"),
    ("60603", "Libya", "LibyaPhone"),
    ("310260", "USA", "T-Mobile"),
    ("310410", "USA", "AT&T"),
    ("23430", "UK", "T-Mobile UK"),
    ("23415", "UK", "Vodafone UK"),
    ("26201", "Germany", "Telekom"),
    ("26202", "Germany", "Vodafone DE"),
    ("20801", "France", "Orange"),
    ("20810", "France", "SFR"),
];

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeNetwork {
    pub country: &'static str,
    pub network: &'static str,
}

impl HomeNetwork {
    pub const UNKNOWN: HomeNetwork = HomeNetwork { country: UNKNOWN, network: UNKNOWN };
}

pub fn detect_home_network(imsi: &str) -> HomeNetwork {
    IMSI_PREFIXES
        .iter()
        .filter(|(prefix, _, _)| imsi.starts_with(prefix))
        .max_by_key(|(prefix, _, _)| prefix.len())
        .map(|&(_, country, network)| HomeNetwork { country, network })
        .unwrap_or(HomeNetwork::UNKNOWN)
}
