/// Number of bookable half-hour slots per day (09:00 through 17:00)
pub const SLOTS_PER_DAY: usize = 17;

/// Hour at which the first slot of the day starts (local time)
pub const DAY_START_HOUR: u32 = 9;

/// Length of one slot in minutes
pub const SLOT_MINUTES: u32 = 30;

/// Face match distance tolerance consumed by FaceEngine implementations
pub const MATCH_TOLERANCE: f64 = 0.6;

/// Minimum seconds between rescans of the known-admins directory
pub const GALLERY_REFRESH_SECS: u64 = 10;

/// Sanitized guest names are truncated to this many characters
pub const MAX_GUEST_NAME_LEN: usize = 20;

/// Request body cap for video uploads (512 MiB)
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;
