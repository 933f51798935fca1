//! Slot end parsing.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Wall-clock formats used by the booking page.
const SLOT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%d.%m.%Y %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses a slot boundary. Naive values are read as local time.
pub fn parse_slot(slot: &str) -> Option<DateTime<Utc>> {
    let slot = slot.trim();
    if slot.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(slot) {
        return Some(dt.with_timezone(&Utc));
    }
    SLOT_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(slot, format).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Whether the slot ending at `end_slot` has passed. Unparseable ends never expire.
pub fn is_expired(end_slot: &str, now: DateTime<Utc>) -> bool {
    parse_slot(end_slot).is_some_and(|end| end < now)
}
