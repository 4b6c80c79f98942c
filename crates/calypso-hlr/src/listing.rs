//! Fixed-width subscriber table as printed by `subscriber-list`.

use std::fmt::Write;

use crate::network::detect_home_network;
use crate::store::SubscriberRecord;

pub const EMPTY_MESSAGE: &str = "No subscribers found.";
const RULE_WIDTH: usize = 114;

/// Renders `records` as an aligned table, one line per subscriber.
/// Columns are padded, never truncated; long values push the row wider.
pub fn render_table(records: &[SubscriberRecord]) -> String {
    if records.is_empty() {
        return format!("{}\n", EMPTY_MESSAGE);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4}{:<18}{:<15}{:<18}{:<12}{:<22}{:<10}{:<15}",
        "ID", "IMSI", "MSISDN", "IMEI", "TMSI", "Timestamp", "Country", "Network"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for r in records {
        let home = detect_home_network(&r.imsi);
        let _ = writeln!(
            out,
            "{:<4}{:<18}{:<15}{:<18}{:<12}{:<22}{:<10}{:<15}",
            r.id.to_string(),
            r.imsi,
            r.number.as_deref().unwrap_or(""),
            r.imei.as_deref().unwrap_or(""),
            r.tmsi.as_deref().unwrap_or(""),
            r.created.as_deref().unwrap_or("N/A"),
            home.country,
            home.network
        );
    }
    out
}
