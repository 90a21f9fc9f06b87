//! Progressive disclosure filter.
//!
//! Walks an upstream JSON body and redacts or truncates `location` fields
//! according to the caller's role and each record's lifecycle state. The
//! filter is structural: any object carrying a string `status` and a
//! string `location` is treated as a disclosure record, at any nesting
//! depth, with no knowledge of the upstream's full schema.
//!
//! The filter is total. Missing fields, unexpected types, and statuses
//! outside the lifecycle table degrade to pass-through for that record;
//! the response as a whole never fails on a shape the filter cannot
//! classify.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use iyashi_core::Role;

use crate::visibility::{self, Visibility};

/// Placeholder substituted for a hidden location.
pub const HIDDEN_PLACEHOLDER: &str = "非公開（予約確定後に公開されます）";

/// Suffix appended to a coarsened location.
pub const COARSE_SUFFIX: &str = "（以降、施術開始前に公開）";

/// Contact fields stripped for roles with [`Role::strips_contacts`],
/// independent of lifecycle state.
const CONTACT_FIELDS: &[&str] = &["therapist_phone", "host_phone", "office_contact"];

/// Counts of what one filter pass changed. Feeds metrics and debug logs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    /// Locations replaced by the hidden placeholder.
    pub hidden: u64,
    /// Locations truncated to their coarse form.
    pub coarsened: u64,
    /// Contact fields removed.
    pub contacts_stripped: u64,
    /// Records whose status was outside the lifecycle table.
    pub unclassified: u64,
}

/// Filter a parsed upstream body in place for the given caller role.
///
/// Pure and deterministic: filtering an already-filtered value again for
/// the same role is a no-op.
pub fn apply(value: &mut Value, role: Role) -> FilterStats {
    let mut stats = FilterStats::default();
    walk(value, role, &mut stats);
    stats
}

fn walk(value: &mut Value, role: Role, stats: &mut FilterStats) {
    match value {
        Value::Object(map) => {
            if role.strips_contacts() {
                for field in CONTACT_FIELDS {
                    if map.remove(*field).is_some() {
                        stats.contacts_stripped += 1;
                    }
                }
            }

            if !role.is_unrestricted() {
                redact_record(map, stats);
            }

            for child in map.values_mut() {
                walk(child, role, stats);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, role, stats);
            }
        }
        _ => {}
    }
}

/// Apply the lifecycle rule to one object if it matches the disclosure
/// record shape (string `status` plus string `location`).
fn redact_record(map: &mut serde_json::Map<String, Value>, stats: &mut FilterStats) {
    let status = match map.get("status").and_then(Value::as_str) {
        Some(s) => s.to_owned(),
        None => return,
    };
    if !map.get("location").is_some_and(Value::is_string) {
        return;
    }

    match visibility::for_status(&status) {
        Some(Visibility::Hidden) => {
            map.insert(
                "location".to_owned(),
                Value::String(HIDDEN_PLACEHOLDER.to_owned()),
            );
            stats.hidden += 1;
        }
        Some(Visibility::Coarse) => {
            if let Some(Value::String(location)) = map.get_mut("location") {
                let coarse = coarse_location(location);
                if coarse != *location {
                    *location = coarse;
                    stats.coarsened += 1;
                }
            }
        }
        Some(Visibility::Full) => {}
        None => {
            debug!(status = %status, "status outside lifecycle table, leaving record unfiltered");
            stats.unclassified += 1;
        }
    }
}

/// Truncate a location to its coarse form and append the fixed suffix.
///
/// Japanese addresses carry no whitespace, so the municipality boundary
/// (prefecture plus city/ward/district) is matched first; addresses with
/// no such boundary fall back to their first two whitespace-delimited
/// tokens. Already-coarsened values are returned unchanged so the filter
/// stays idempotent.
fn coarse_location(full: &str) -> String {
    if full.ends_with(COARSE_SUFFIX) {
        return full.to_owned();
    }

    if let Some(prefix) = municipality_prefix(full) {
        return format!("{prefix}{COARSE_SUFFIX}");
    }

    let tokens: Vec<&str> = full.split_whitespace().take(2).collect();
    format!("{}{COARSE_SUFFIX}", tokens.join(" "))
}

/// Match the leading prefecture + municipality of a Japanese address,
/// e.g. `東京都渋谷区神宮前6-23-4` → `東京都渋谷区`.
fn municipality_prefix(address: &str) -> Option<&str> {
    static MUNICIPALITY: OnceLock<Regex> = OnceLock::new();
    let re = MUNICIPALITY.get_or_init(|| {
        Regex::new(r"^(?:.{1,8}?[都道府県])?.{1,10}?[市区郡町村]")
            .expect("municipality pattern compiles")
    });
    re.find(address).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn booking(status: &str, location: &str) -> Value {
        json!({
            "id": "bk-1",
            "status": status,
            "location": location,
            "price": 9000,
        })
    }

    #[test]
    fn unconfirmed_location_is_hidden_byte_for_byte() {
        let mut value = booking("REQUESTED", "東京都渋谷区神宮前6-23-4");
        apply(&mut value, Role::Client);
        assert_eq!(value["location"], "非公開（予約確定後に公開されます）");
    }

    #[test]
    fn booked_location_is_coarsened_to_ward_level() {
        let mut value = booking("BOOKED", "東京都渋谷区神宮前6-23-4");
        let stats = apply(&mut value, Role::Client);
        assert_eq!(value["location"], "東京都渋谷区（以降、施術開始前に公開）");
        assert_eq!(stats.coarsened, 1);
    }

    #[test]
    fn coarse_falls_back_to_two_whitespace_tokens() {
        let mut value = booking("BOOKED", "1600 Pennsylvania Avenue NW Washington");
        apply(&mut value, Role::Client);
        assert_eq!(value["location"], "1600 Pennsylvania（以降、施術開始前に公開）");
    }

    #[test]
    fn checked_in_and_later_pass_through_for_any_role() {
        for status in ["CHECKED_IN", "IN_PROGRESS", "COMPLETED", "CANCELLED"] {
            for role in [Role::Client, Role::Therapist, Role::FacilityHost] {
                let mut value = booking(status, "東京都渋谷区神宮前6-23-4");
                apply(&mut value, role);
                assert_eq!(value["location"], "東京都渋谷区神宮前6-23-4", "{status}/{role}");
            }
        }
    }

    #[test]
    fn unrestricted_roles_always_see_full_location() {
        for role in [Role::PlatformAdmin, Role::Agency] {
            for status in ["REQUESTED", "BOOKED", "CHECKED_IN"] {
                let mut value = booking(status, "東京都渋谷区神宮前6-23-4");
                let stats = apply(&mut value, role);
                assert_eq!(value["location"], "東京都渋谷区神宮前6-23-4");
                assert_eq!(stats.hidden + stats.coarsened, 0, "{status}/{role}");
            }
        }
    }

    #[test]
    fn contact_fields_are_stripped_for_clients_regardless_of_state() {
        let mut value = json!({
            "status": "COMPLETED",
            "location": "東京都渋谷区神宮前6-23-4",
            "therapist_phone": "080-1234-5678",
            "host_phone": "03-1111-2222",
            "office_contact": "内線 401",
        });
        let stats = apply(&mut value, Role::Client);
        assert!(value.get("therapist_phone").is_none());
        assert!(value.get("host_phone").is_none());
        assert!(value.get("office_contact").is_none());
        assert_eq!(stats.contacts_stripped, 3);
    }

    #[test]
    fn contact_fields_survive_for_therapists() {
        let mut value = json!({
            "status": "BOOKED",
            "location": "東京都渋谷区神宮前6-23-4",
            "therapist_phone": "080-1234-5678",
        });
        apply(&mut value, Role::Therapist);
        assert_eq!(value["therapist_phone"], "080-1234-5678");
    }

    #[test]
    fn nested_arrays_are_filtered_element_wise() {
        let mut value = json!({
            "bookings": [
                booking("REQUESTED", "東京都渋谷区神宮前6-23-4"),
                booking("BOOKED", "大阪府大阪市北区梅田1-1-3"),
                booking("COMPLETED", "北海道札幌市中央区大通西3"),
            ],
            "total": 3,
        });
        let stats = apply(&mut value, Role::Client);
        assert_eq!(value["bookings"][0]["location"], HIDDEN_PLACEHOLDER);
        assert_eq!(
            value["bookings"][1]["location"],
            "大阪府大阪市（以降、施術開始前に公開）"
        );
        assert_eq!(value["bookings"][2]["location"], "北海道札幌市中央区大通西3");
        assert_eq!(stats.hidden, 1);
        assert_eq!(stats.coarsened, 1);
    }

    #[test]
    fn records_nested_inside_records_are_filtered() {
        let mut value = json!({
            "status": "BOOKED",
            "location": "東京都渋谷区神宮前6-23-4",
            "previous": {
                "status": "REQUESTED",
                "location": "東京都新宿区西新宿2-8-1",
            },
        });
        apply(&mut value, Role::Client);
        assert_eq!(value["location"], "東京都渋谷区（以降、施術開始前に公開）");
        assert_eq!(value["previous"]["location"], HIDDEN_PLACEHOLDER);
    }

    #[test]
    fn filter_is_total_on_malformed_shapes() {
        // Missing location, non-string status, non-string location, scalars,
        // and unknown statuses must all pass through untouched.
        let mut value = json!({
            "a": { "status": "REQUESTED" },
            "b": { "status": 4, "location": "東京都渋谷区神宮前6-23-4" },
            "c": { "status": "REQUESTED", "location": { "lat": 35.67, "lng": 139.7 } },
            "d": { "status": "ON_HOLD", "location": "東京都渋谷区神宮前6-23-4" },
            "e": null,
            "f": [1, "two", true],
        });
        let original = value.clone();
        let stats = apply(&mut value, Role::Client);
        assert_eq!(value, original);
        assert_eq!(stats.hidden + stats.coarsened, 0);
        assert_eq!(stats.unclassified, 1);
    }

    #[test]
    fn filtering_twice_is_idempotent() {
        let mut value = json!({
            "bookings": [
                booking("REQUESTED", "東京都渋谷区神宮前6-23-4"),
                booking("BOOKED", "東京都渋谷区神宮前6-23-4"),
                booking("BOOKED", "1600 Pennsylvania Avenue NW"),
                booking("IN_PROGRESS", "東京都渋谷区神宮前6-23-4"),
            ],
            "therapist_phone": "080-1234-5678",
        });
        apply(&mut value, Role::Client);
        let once = value.clone();
        apply(&mut value, Role::Client);
        assert_eq!(value, once);
    }

    #[test]
    fn municipality_prefix_handles_prefecture_variants() {
        assert_eq!(
            municipality_prefix("東京都渋谷区神宮前6-23-4"),
            Some("東京都渋谷区")
        );
        assert_eq!(
            municipality_prefix("大阪府大阪市北区梅田1-1-3"),
            Some("大阪府大阪市")
        );
        assert_eq!(
            municipality_prefix("北海道札幌市中央区大通西3"),
            Some("北海道札幌市")
        );
        assert_eq!(municipality_prefix("横浜市西区北幸1-1-1"), Some("横浜市"));
        assert_eq!(municipality_prefix("1600 Pennsylvania Avenue"), None);
    }
}
