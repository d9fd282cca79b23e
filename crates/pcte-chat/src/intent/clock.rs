//! Wall-clock resolution for the time/date intents.

use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;

use crate::config::TimezoneConfig;

fn parse_zone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            tracing::debug!(zone = name, "Unknown timezone name, trying next fallback");
            None
        }
    }
}

/// Pick the zone for a request: request value, deployment default, project
/// default. `None` means fall back to the process-local zone.
pub fn resolve_zone(requested: Option<&str>, config: &TimezoneConfig) -> Option<Tz> {
    requested
        .and_then(parse_zone)
        .or_else(|| config.default_zone.as_deref().and_then(parse_zone))
        .or_else(|| parse_zone(&config.project_zone))
}

/// Current instant in the resolved zone. Never fails.
pub fn resolve_now(requested: Option<&str>, config: &TimezoneConfig) -> DateTime<FixedOffset> {
    now_in(resolve_zone(requested, config), Utc::now())
}

pub(crate) fn now_in(zone: Option<Tz>, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    match zone {
        Some(tz) => instant.with_timezone(&tz).fixed_offset(),
        None => instant.with_timezone(&Local).fixed_offset(),
    }
}
