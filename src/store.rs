use log::warn;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schedule::{first_free_slot, new_day_schedule, Slot};

/// The persisted date -> slot-sequence mapping
pub type ScheduleMap = BTreeMap<String, Vec<Slot>>;

/// Outcome of a booking attempt
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    /// A slot was claimed; carries the assigned time label
    Booked { time: String },
    /// Every slot for the date is already booked
    Full,
}

/// Whole-file JSON store for meeting schedules.
///
/// Every operation reloads the backing file and every mutation rewrites it
/// in full. There is no locking and the rewrite is not atomic: concurrent
/// writers race with last-write-wins on the whole file. Callers that need
/// exactly-once booking under concurrency must serialize writes themselves.
pub struct MeetingBook {
    path: PathBuf,
}

impl MeetingBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full store. A missing, unreadable, or malformed file yields
    /// an empty store so a corrupt file never takes the service down.
    pub fn load(&self) -> ScheduleMap {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "Failed to read schedule store {}: {}. Starting empty",
                        self.path.display(),
                        e
                    );
                }
                return ScheduleMap::new();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    "Malformed schedule store {}: {}. Starting empty",
                    self.path.display(),
                    e
                );
                ScheduleMap::new()
            }
        }
    }

    /// Serialize the full store and overwrite the backing file.
    /// Not atomic and not crash-safe.
    pub fn save(&self, map: &ScheduleMap) -> Result<(), String> {
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| format!("Failed to serialize schedule store: {}", e))?;
        fs::write(&self.path, json)
            .map_err(|e| format!("Failed to write {}: {}", self.path.display(), e))
    }

    /// A date's slot sequence, generated and persisted on first access.
    /// Existing dates are returned as stored, never regenerated.
    pub fn slots_for(&self, date_key: &str) -> Result<Vec<Slot>, String> {
        let mut map = self.load();
        if let Some(slots) = map.get(date_key) {
            return Ok(slots.clone());
        }
        let slots = new_day_schedule();
        map.insert(date_key.to_string(), slots.clone());
        self.save(&map)?;
        Ok(slots)
    }

    /// Claim the lowest-index free slot for `date_key` under `guest_name`.
    /// A fully booked date reports `Full` and leaves the store untouched.
    pub fn book_next_available(
        &self,
        date_key: &str,
        guest_name: &str,
    ) -> Result<BookingOutcome, String> {
        let mut map = self.load();
        let slots = map
            .entry(date_key.to_string())
            .or_insert_with(new_day_schedule);
        match first_free_slot(slots) {
            Some(index) => {
                slots[index].booked = true;
                slots[index].guest = Some(guest_name.to_string());
                let time = slots[index].time.clone();
                self.save(&map)?;
                Ok(BookingOutcome::Booked { time })
            }
            None => Ok(BookingOutcome::Full),
        }
    }

    /// Free the slot at `index` for `date_key`. Returns Ok(false) for an
    /// unknown date or out-of-range index, mutating nothing.
    pub fn cancel(&self, date_key: &str, index: usize) -> Result<bool, String> {
        let mut map = self.load();
        match map.get_mut(date_key).and_then(|slots| slots.get_mut(index)) {
            Some(slot) => {
                slot.booked = false;
                slot.guest = None;
                self.save(&map)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
