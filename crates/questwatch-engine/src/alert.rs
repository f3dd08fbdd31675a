//! Alert composition for watch-list hits and cycle failures.

use chrono::{DateTime, FixedOffset, Utc};
use questwatch_core::WatchList;
use questwatch_db::{Quest, QuestInstance};
use std::collections::HashMap;
use std::fmt::Display;

/// Fixed offset applied to ending times in alert bodies, in minutes east
/// of UTC. Matches the original deployment so rendered times are the same
/// wherever the process runs.
const ALERT_OFFSET_MINUTES: i32 = 360;

/// Subject used when reporting a cycle-fatal failure.
const FAILURE_SUBJECT: &str = "WQ Tracker Error";

/// A composed notification, ready for the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Mail subject line
    pub subject: String,
    /// Mail body
    pub body: String,
}

/// Compose the watch-list alert for one cycle's delta.
///
/// Returns `None` when no newly-instantiated quest is watched. Names come
/// from the quest index, falling back to the watch list's configured
/// display name; output is ordered by quest id so it is deterministic.
#[must_use]
pub fn compose(
    new_quest_ids: &[i64],
    watch: &WatchList,
    quests: &HashMap<i64, Quest>,
    active: &HashMap<i64, QuestInstance>,
) -> Option<Alert> {
    let mut watched: Vec<i64> = new_quest_ids
        .iter()
        .copied()
        .filter(|id| watch.contains(*id))
        .collect();
    if watched.is_empty() {
        return None;
    }
    watched.sort_unstable();
    watched.dedup();

    let names: Vec<&str> = watched
        .iter()
        .map(|&id| quest_name(id, quests, watch))
        .collect();
    let subject = format!("WQ Alert: {}", names.join(", "));

    let body = watched
        .iter()
        .map(|&id| {
            let name = quest_name(id, quests, watch);
            match active.get(&id) {
                Some(instance) => format!("{name}: {}", format_ending(instance.ending)),
                None => format!("{name}: ending unknown"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(Alert { subject, body })
}

/// Compose the report for a cycle-fatal failure.
///
/// Same delivery channel as watch-list alerts, distinct subject.
pub fn compose_failure<E: Display>(error: &E) -> Alert {
    Alert {
        subject: FAILURE_SUBJECT.to_string(),
        body: error.to_string(),
    }
}

fn quest_name<'a>(
    id: i64,
    quests: &'a HashMap<i64, Quest>,
    watch: &'a WatchList,
) -> &'a str {
    quests
        .get(&id)
        .map(|quest| quest.name.as_str())
        .or_else(|| watch.name(id))
        .unwrap_or("(unknown quest)")
}

/// Render an ending time at the fixed alert offset: `M/D/YYYY, H:MM AM`.
fn format_ending(ending: DateTime<Utc>) -> String {
    let offset =
        FixedOffset::east_opt(ALERT_OFFSET_MINUTES * 60).expect("offset is within bounds");
    ending
        .with_timezone(&offset)
        .format("%-m/%-d/%Y, %-I:%M %p")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use questwatch_core::WatchedQuest;
    use serde_json::Value as JsonValue;
    use std::collections::BTreeSet;

    fn watch() -> WatchList {
        WatchList::new(&[
            WatchedQuest {
                id: 41896,
                name: "Operation Murloc Freedom".to_string(),
            },
            WatchedQuest {
                id: 42023,
                name: "Black Rook Rumble".to_string(),
            },
        ])
    }

    fn quest(id: i64, name: &str) -> Quest {
        Quest {
            id,
            name: name.to_string(),
            last_seen: Utc::now(),
            quest_type: 1,
            factions: BTreeSet::new(),
            zones: BTreeSet::new(),
        }
    }

    fn instance(quest_id: i64, ending: DateTime<Utc>) -> QuestInstance {
        QuestInstance {
            id: quest_id,
            quest_id,
            ending,
            rewards: JsonValue::Array(Vec::new()),
        }
    }

    #[test]
    fn test_no_alert_without_watched_hit() {
        let quests = HashMap::from([(7, quest(7, "Unwatched"))]);
        let active = HashMap::new();
        assert_eq!(compose(&[7], &watch(), &quests, &active), None);
        assert_eq!(compose(&[], &watch(), &quests, &active), None);
    }

    #[test]
    fn test_alert_contains_exactly_watched_quests() {
        let ending = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let quests = HashMap::from([
            (41896, quest(41896, "Operation Murloc Freedom")),
            (42023, quest(42023, "Black Rook Rumble")),
            (7, quest(7, "Unwatched")),
        ]);
        let active = HashMap::from([
            (41896, instance(41896, ending)),
            (42023, instance(42023, ending)),
            (7, instance(7, ending)),
        ]);

        let alert =
            compose(&[42023, 7, 41896], &watch(), &quests, &active).expect("alert composed");

        assert_eq!(
            alert.subject,
            "WQ Alert: Operation Murloc Freedom, Black Rook Rumble"
        );
        assert!(alert.body.contains("Operation Murloc Freedom:"));
        assert!(alert.body.contains("Black Rook Rumble:"));
        assert!(!alert.body.contains("Unwatched"));
        assert_eq!(alert.body.lines().count(), 2);
    }

    #[test]
    fn test_ending_rendered_at_fixed_offset() {
        // 2024-01-01T00:00:00Z at +06:00 is 6 AM the same day
        let ending = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_ending(ending), "1/1/2024, 6:00 AM");

        // Minutes are zero-padded, hours are not, PM wraps past noon
        let ending = Utc.with_ymd_and_hms(2024, 3, 15, 8, 5, 0).unwrap();
        assert_eq!(format_ending(ending), "3/15/2024, 2:05 PM");
    }

    #[test]
    fn test_name_falls_back_to_watch_list() {
        // Watched quest absent from the index still renders by its
        // configured name
        let ending = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let quests = HashMap::new();
        let active = HashMap::from([(41896, instance(41896, ending))]);

        let alert = compose(&[41896], &watch(), &quests, &active).expect("alert composed");
        assert_eq!(alert.subject, "WQ Alert: Operation Murloc Freedom");
    }

    #[test]
    fn test_failure_alert_has_distinct_subject() {
        let alert = compose_failure(&"quest listing anchor not found in page body");
        assert_eq!(alert.subject, "WQ Tracker Error");
        assert!(alert.body.contains("listing anchor"));
    }
}
