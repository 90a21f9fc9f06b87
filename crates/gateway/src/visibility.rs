/// How much of a record's location a restricted caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Full redaction: the location is replaced by a placeholder.
    Hidden,
    /// Ward-level truncation with a placeholder note.
    Coarse,
    /// The exact value.
    Full,
}

/// The lifecycle-to-visibility table.
///
/// This is the one piece of genuine business logic in the gateway and is
/// kept as a single explicit table: a booking's location is hidden until
/// the booking is confirmed, coarse until the treatment starts, and fully
/// visible from check-in onwards (including terminal states).
const LIFECYCLE_VISIBILITY: &[(&str, Visibility)] = &[
    ("REQUESTED", Visibility::Hidden),
    ("PENDING", Visibility::Hidden),
    ("BOOKED", Visibility::Coarse),
    ("CONFIRMED", Visibility::Coarse),
    ("CHECKED_IN", Visibility::Full),
    ("IN_PROGRESS", Visibility::Full),
    ("COMPLETED", Visibility::Full),
    ("CANCELLED", Visibility::Full),
];

/// Look up the visibility level for an upstream status string.
///
/// Matching is case-insensitive on the trimmed value. Returns `None` for
/// statuses outside the table; callers must treat those records as
/// unclassifiable and pass them through unchanged.
pub fn for_status(status: &str) -> Option<Visibility> {
    let normalized = status.trim().to_ascii_uppercase();
    LIFECYCLE_VISIBILITY
        .iter()
        .find(|(s, _)| *s == normalized)
        .map(|(_, v)| *v)
}
