//! Plain-text table export of the break log.

use chrono::SecondsFormat;

use crate::storage::LogEntry;

pub const CSV_HEADER: &str = "timestamp_iso,type";

/// Render the log as `timestamp_iso,type` rows.
///
/// Timestamps are ISO-8601 UTC with millisecond precision. Rows are joined
/// with `\n` and there is no trailing newline. Entries whose timestamp falls
/// outside chrono's range are skipped.
pub fn export_csv(entries: &[LogEntry]) -> String {
    let mut rows = vec![CSV_HEADER.to_string()];
    rows.extend(entries.iter().filter_map(|entry| {
        let at = entry.at()?;
        Some(format!(
            "{},{}",
            at.to_rfc3339_opts(SecondsFormat::Millis, true),
            entry.kind.as_str()
        ))
    }));
    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BreakKind;

    #[test]
    fn two_entries_exact_output() {
        let entries = [
            LogEntry::new(1_704_067_200_000, BreakKind::Break),
            LogEntry::new(1_704_068_400_250, BreakKind::LongBreak),
        ];
        assert_eq!(
            export_csv(&entries),
            "timestamp_iso,type\n2024-01-01T00:00:00.000Z,break\n2024-01-01T00:20:00.250Z,longbreak"
        );
    }

    #[test]
    fn empty_log_is_header_only() {
        assert_eq!(export_csv(&[]), "timestamp_iso,type");
    }
}
