use chrono::{Duration, Local};
use serde::{Deserialize, Serialize};

use crate::constants::{DAY_START_HOUR, SLOTS_PER_DAY, SLOT_MINUTES};

/// One bookable half-hour position within a day's schedule.
///
/// A slot's identity is its index in the date's ordered sequence; the time
/// label is display-only and fixed at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub time: String,
    pub booked: bool,
    pub guest: Option<String>,
}

/// Build the fixed slot sequence for one day: 17 unbooked half-hour slots
/// starting at 09:00.
pub fn new_day_schedule() -> Vec<Slot> {
    (0..SLOTS_PER_DAY)
        .map(|i| Slot {
            time: slot_label(i),
            booked: false,
            guest: None,
        })
        .collect()
}

/// 12-hour time label for slot `index`, e.g. "09:00 AM" or "12:30 PM"
pub fn slot_label(index: usize) -> String {
    let total_minutes = DAY_START_HOUR * 60 + SLOT_MINUTES * index as u32;
    let hour = (total_minutes / 60) % 24;
    let minute = total_minutes % 60;
    let (display_hour, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{:02}:{:02} {}", display_hour, minute, meridiem)
}

/// Index of the lowest unbooked slot, if any
pub fn first_free_slot(slots: &[Slot]) -> Option<usize> {
    slots.iter().position(|s| !s.booked)
}

/// Trim a guest name, falling back to "Guest" when absent or blank
pub fn normalize_guest_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => "Guest".to_string(),
    }
}

/// Today's date key in the store's YYYY-MM-DD form (local time)
pub fn today_key() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Tomorrow's date key, offered as the fallback when today is fully booked
pub fn tomorrow_key() -> String {
    (Local::now() + Duration::days(1)).format("%Y-%m-%d").to_string()
}
