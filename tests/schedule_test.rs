//! # Schedule Store Tests
//!
//! These tests verify slot generation, booking, and cancellation against
//! the whole-file JSON schedule store.
//!
//! ## Running the Tests
//!
//! ```bash
//! cargo test --test schedule_test
//! ```

use std::fs;
use tempfile::TempDir;

use reception_kiosk::constants::SLOTS_PER_DAY;
use reception_kiosk::schedule::{
    first_free_slot, new_day_schedule, normalize_guest_name, slot_label, Slot,
};
use reception_kiosk::store::{BookingOutcome, MeetingBook, ScheduleMap};

/// Helper to create a store backed by a scratch file
fn temp_book() -> (MeetingBook, TempDir) {
    let dir = TempDir::new().unwrap();
    let book = MeetingBook::new(dir.path().join("meetings.json"));
    (book, dir)
}

/// Parse a "09:30 AM" style label back into minutes since midnight
fn label_minutes(label: &str) -> u32 {
    let (clock, meridiem) = label.split_once(' ').unwrap();
    let (hour, minute) = clock.split_once(':').unwrap();
    let mut hour: u32 = hour.parse().unwrap();
    let minute: u32 = minute.parse().unwrap();
    if meridiem == "PM" && hour != 12 {
        hour += 12;
    }
    if meridiem == "AM" && hour == 12 {
        hour = 0;
    }
    hour * 60 + minute
}

#[test]
fn test_day_schedule_has_seventeen_half_hour_slots() {
    let slots = new_day_schedule();
    assert_eq!(slots.len(), SLOTS_PER_DAY);

    // Labels start at 09:00 and increase strictly by 30 minutes
    assert_eq!(label_minutes(&slots[0].time), 9 * 60);
    for pair in slots.windows(2) {
        assert_eq!(
            label_minutes(&pair[1].time),
            label_minutes(&pair[0].time) + 30
        );
    }

    for slot in &slots {
        assert!(!slot.booked);
        assert!(slot.guest.is_none());
    }
}

#[test]
fn test_slot_labels_use_twelve_hour_clock() {
    assert_eq!(slot_label(0), "09:00 AM");
    assert_eq!(slot_label(1), "09:30 AM");
    assert_eq!(slot_label(5), "11:30 AM");
    assert_eq!(slot_label(6), "12:00 PM");
    assert_eq!(slot_label(7), "12:30 PM");
    assert_eq!(slot_label(8), "01:00 PM");
    assert_eq!(slot_label(16), "05:00 PM");
}

#[test]
fn test_schedule_creation_is_idempotent() {
    let (book, _guard) = temp_book();

    let first = book.slots_for("2026-03-01").unwrap();
    let second = book.slots_for("2026-03-01").unwrap();

    assert_eq!(first.len(), SLOTS_PER_DAY);
    assert_eq!(first, second);
}

#[test]
fn test_existing_schedule_is_never_regenerated() {
    let (book, _guard) = temp_book();

    book.slots_for("2026-03-01").unwrap();
    book.book_next_available("2026-03-01", "Dana").unwrap();

    // A later read must return the booked state, not a fresh sequence
    let slots = book.slots_for("2026-03-01").unwrap();
    assert!(slots[0].booked);
    assert_eq!(slots[0].guest.as_deref(), Some("Dana"));
}

#[test]
fn test_booking_assigns_lowest_free_slot_and_touches_nothing_else() {
    let (book, _guard) = temp_book();
    let before = book.slots_for("2026-03-02").unwrap();

    let outcome = book.book_next_available("2026-03-02", "Alice").unwrap();
    assert_eq!(
        outcome,
        BookingOutcome::Booked {
            time: "09:00 AM".to_string()
        }
    );

    let after = book.slots_for("2026-03-02").unwrap();
    assert!(after[0].booked);
    assert_eq!(after[0].guest.as_deref(), Some("Alice"));
    assert_eq!(&after[1..], &before[1..]);

    // Next booking takes the next index
    let outcome = book.book_next_available("2026-03-02", "Bob").unwrap();
    assert_eq!(
        outcome,
        BookingOutcome::Booked {
            time: "09:30 AM".to_string()
        }
    );
}

#[test]
fn test_booking_skips_over_booked_prefix() {
    let (book, _guard) = temp_book();

    book.book_next_available("2026-03-03", "Alice").unwrap();
    book.book_next_available("2026-03-03", "Bob").unwrap();
    book.cancel("2026-03-03", 0).unwrap();

    // Slot 0 was freed, so it is the lowest free index again
    let outcome = book.book_next_available("2026-03-03", "Cleo").unwrap();
    assert_eq!(
        outcome,
        BookingOutcome::Booked {
            time: "09:00 AM".to_string()
        }
    );
}

#[test]
fn test_full_day_reports_exhaustion_and_mutates_nothing() {
    let (book, _guard) = temp_book();

    for i in 0..SLOTS_PER_DAY {
        let outcome = book
            .book_next_available("2026-03-04", &format!("Guest {}", i))
            .unwrap();
        assert!(matches!(outcome, BookingOutcome::Booked { .. }));
    }

    let before = book.load();
    let outcome = book.book_next_available("2026-03-04", "Late").unwrap();
    assert_eq!(outcome, BookingOutcome::Full);
    assert_eq!(book.load(), before);
}

#[test]
fn test_cancel_frees_slot() {
    let (book, _guard) = temp_book();
    book.book_next_available("2026-03-05", "Alice").unwrap();

    assert!(book.cancel("2026-03-05", 0).unwrap());

    let slots = book.slots_for("2026-03-05").unwrap();
    assert!(!slots[0].booked);
    assert!(slots[0].guest.is_none());
}

#[test]
fn test_cancel_out_of_range_or_unknown_date_fails_without_mutation() {
    let (book, _guard) = temp_book();
    book.book_next_available("2026-03-06", "Alice").unwrap();
    let before = book.load();

    assert!(!book.cancel("2026-03-06", SLOTS_PER_DAY).unwrap());
    assert!(!book.cancel("2026-12-31", 0).unwrap());
    assert_eq!(book.load(), before);
}

#[test]
fn test_save_load_round_trip() {
    let (book, _guard) = temp_book();

    // Empty store
    book.save(&ScheduleMap::new()).unwrap();
    assert!(book.load().is_empty());

    // One date
    let mut one = ScheduleMap::new();
    one.insert("2026-04-01".to_string(), new_day_schedule());
    book.save(&one).unwrap();
    assert_eq!(book.load(), one);

    // Several dates with bookings
    let mut many = one.clone();
    let mut booked = new_day_schedule();
    booked[3].booked = true;
    booked[3].guest = Some("Dana".to_string());
    many.insert("2026-04-02".to_string(), booked);
    many.insert("2026-04-03".to_string(), new_day_schedule());
    book.save(&many).unwrap();
    assert_eq!(book.load(), many);
}

#[test]
fn test_missing_or_malformed_store_loads_empty() {
    let (book, guard) = temp_book();

    // Missing file
    assert!(book.load().is_empty());

    // Malformed contents
    fs::write(guard.path().join("meetings.json"), "{ not json ]").unwrap();
    assert!(book.load().is_empty());
}

#[test]
fn test_slot_serializes_with_original_field_names() {
    let slot = Slot {
        time: "09:00 AM".to_string(),
        booked: false,
        guest: None,
    };
    let value = serde_json::to_value(&slot).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"time": "09:00 AM", "booked": false, "guest": null})
    );
}

#[test]
fn test_guest_name_normalization() {
    assert_eq!(normalize_guest_name(Some("  Alice  ")), "Alice");
    assert_eq!(normalize_guest_name(Some("   ")), "Guest");
    assert_eq!(normalize_guest_name(Some("")), "Guest");
    assert_eq!(normalize_guest_name(None), "Guest");
}

#[test]
fn test_first_free_slot_scans_in_order() {
    let mut slots = new_day_schedule();
    assert_eq!(first_free_slot(&slots), Some(0));

    slots[0].booked = true;
    slots[1].booked = true;
    assert_eq!(first_free_slot(&slots), Some(2));

    for slot in &mut slots {
        slot.booked = true;
    }
    assert_eq!(first_free_slot(&slots), None);
}
