use chrono::DateTime;

use super::filter::DisplayProperties;
use super::presence::{Avatar, Dataset, PresenceState};

/// Lower bound used when no `from` is set (epoch seconds).
pub const EPOCH_MIN: i64 = 0;
/// Upper bound used when no `to` is set (epoch seconds).
pub const EPOCH_MAX: i64 = 1_000_000_000_000;

/// Default shift subtracted from every interval before display.
pub const DEFAULT_TIME_SHIFT_SECS: i64 = 3600;
/// Largest accepted time shift in either direction (one year).
pub const MAX_TIME_SHIFT_SECS: i64 = 366 * 86_400;

/// A single bar, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePair {
    pub starting_time: i64,
    pub ending_time: i64,
}

/// One renderable chart row: a user in one state.
#[derive(Debug, Clone)]
pub struct LabelRow {
    pub user: String,
    /// Colour tag.
    pub state: PresenceState,
    /// Name followed by the state glyph.
    pub label: String,
    pub icon: Option<Avatar>,
    pub times: Vec<TimePair>,
}

/// Turn the loaded log into chart rows according to `props`.
///
/// Users are visited in the order given (sorted when defaulted), and for
/// each user the states in the order given. A row is only emitted when at
/// least one of its intervals lies within `[from, to]`.
pub fn build_label_rows(
    dataset: &Dataset,
    props: &DisplayProperties,
    time_shift_secs: i64,
) -> Vec<LabelRow> {
    let states: &[PresenceState] = if props.states.is_empty() {
        &PresenceState::ALL
    } else {
        &props.states
    };
    let users: &[String] = if props.users.is_empty() {
        &dataset.users
    } else {
        &props.users
    };
    let epoch_min = props.from.unwrap_or(EPOCH_MIN);
    let epoch_max = props.to.unwrap_or(EPOCH_MAX);

    let mut rows = Vec::new();
    for user in users {
        let Some(record) = dataset.user(user) else {
            tracing::debug!(user = %user, "selected user is not in the log");
            continue;
        };
        for &state in states {
            let times: Vec<TimePair> = record
                .intervals(state)
                .iter()
                .filter_map(|interval| {
                    let end = interval.end?;
                    if interval.start < epoch_min || end > epoch_max {
                        return None;
                    }
                    match (
                        shifted_millis(interval.start, time_shift_secs),
                        shifted_millis(end, time_shift_secs),
                    ) {
                        (Some(starting_time), Some(ending_time)) => Some(TimePair {
                            starting_time,
                            ending_time,
                        }),
                        _ => {
                            tracing::warn!(
                                user = %user,
                                state = state.name(),
                                start = interval.start,
                                end,
                                "skipping interval outside the displayable time range"
                            );
                            None
                        }
                    }
                })
                .collect();

            if times.is_empty() {
                continue;
            }

            let name = record.display_name(user);
            let glyph = state.glyph();
            let label = if glyph.is_empty() {
                format!("{} ", name)
            } else {
                format!("{} {}", name, glyph)
            };

            rows.push(LabelRow {
                user: user.clone(),
                state,
                label,
                icon: dataset.avatars.get(user).cloned(),
                times,
            });
        }
    }
    rows
}

/// `secs - shift` in milliseconds, or `None` when the result does not fit a
/// chrono timestamp.
fn shifted_millis(secs: i64, shift: i64) -> Option<i64> {
    let ms = secs.checked_sub(shift)?.checked_mul(1000)?;
    DateTime::from_timestamp_millis(ms).map(|_| ms)
}

/// Earliest start and latest end over all rows, in milliseconds.
pub fn time_span(rows: &[LabelRow]) -> Option<(i64, i64)> {
    let start = rows.iter().flat_map(|r| r.times.iter()).map(|t| t.starting_time).min()?;
    let end = rows.iter().flat_map(|r| r.times.iter()).map(|t| t.ending_time).max()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::presence::PresenceLog;
    use chrono::Utc;

    fn dataset(json: &str) -> Dataset {
        Dataset::new(PresenceLog::from_json(json).unwrap(), Utc::now())
    }

    const TWO_USERS: &str = r#"{
        "bob": {"online": [[100, 200], [5000, 6000]], "mobile": [[150, 180]],
                "fullname": "Bob"},
        "alice": {"online": [[1000, 2000]], "active": [[1200, 1300]],
                  "fullname": "Alice"}
    }"#;

    #[test]
    fn single_online_interval_yields_one_shifted_row() {
        let data = dataset(r#"{"alice": {"online": [[1000, 2000]], "active": [], "mobile": []}}"#);
        let rows = build_label_rows(&data, &DisplayProperties::default(), DEFAULT_TIME_SHIFT_SECS);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, PresenceState::Online);
        assert_eq!(
            rows[0].times,
            vec![TimePair {
                starting_time: (1000 - 3600) * 1000,
                ending_time: (2000 - 3600) * 1000,
            }]
        );
    }

    #[test]
    fn defaults_cover_all_users_and_states_in_order() {
        let data = dataset(TWO_USERS);
        let rows = build_label_rows(&data, &DisplayProperties::default(), 0);
        let keys: Vec<(&str, PresenceState)> =
            rows.iter().map(|r| (r.user.as_str(), r.state)).collect();
        assert_eq!(
            keys,
            vec![
                ("alice", PresenceState::Online),
                ("alice", PresenceState::Active),
                ("bob", PresenceState::Online),
                ("bob", PresenceState::Mobile),
            ]
        );
        assert_eq!(rows[2].times.len(), 2);
    }

    #[test]
    fn range_filter_is_boundary_inclusive() {
        let data = dataset(TWO_USERS);
        let props = DisplayProperties {
            from: Some(100),
            to: Some(2000),
            ..Default::default()
        };
        let rows = build_label_rows(&data, &props, 0);
        let bob_online = rows
            .iter()
            .find(|r| r.user == "bob" && r.state == PresenceState::Online)
            .unwrap();
        assert_eq!(
            bob_online.times,
            vec![TimePair {
                starting_time: 100_000,
                ending_time: 200_000
            }]
        );
        let alice_online = rows
            .iter()
            .find(|r| r.user == "alice" && r.state == PresenceState::Online)
            .unwrap();
        assert_eq!(
            alice_online.times,
            vec![TimePair {
                starting_time: 1_000_000,
                ending_time: 2_000_000
            }]
        );

        // Interval straddling the bound is dropped, leaving no row.
        let props = DisplayProperties {
            from: Some(1001),
            to: Some(1999),
            ..Default::default()
        };
        let rows = build_label_rows(&data, &props, 0);
        assert!(rows.iter().all(|r| !(r.user == "alice" && r.state == PresenceState::Online)));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, PresenceState::Active);
    }

    #[test]
    fn out_of_range_timestamps_are_skipped() {
        let data = dataset(
            r#"{"a": {"online": [[9300000000000000, 9300000000000001], [1000, 2000]]}}"#,
        );
        let props = crate::model::FilterForm {
            to: "9300000000000001".into(),
            ..Default::default()
        }
        .build(Some(&data))
        .unwrap();
        let rows = build_label_rows(&data, &props, DEFAULT_TIME_SHIFT_SECS);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].times,
            vec![TimePair {
                starting_time: (1000 - 3600) * 1000,
                ending_time: (2000 - 3600) * 1000,
            }]
        );
    }

    #[test]
    fn huge_time_shift_yields_no_rows() {
        let data = dataset(r#"{"a": {"online": [[1000, 2000]]}}"#);
        let rows = build_label_rows(&data, &DisplayProperties::default(), 10_000_000_000_000_000);
        assert!(rows.is_empty());
        let rows = build_label_rows(&data, &DisplayProperties::default(), i64::MIN);
        assert!(rows.is_empty());
    }

    #[test]
    fn explicit_users_and_states_drive_order() {
        let data = dataset(TWO_USERS);
        let props = DisplayProperties {
            users: vec!["bob".into(), "ghost".into(), "alice".into()],
            states: vec![PresenceState::Mobile, PresenceState::Online],
            ..Default::default()
        };
        let rows = build_label_rows(&data, &props, 0);
        let keys: Vec<(&str, PresenceState)> =
            rows.iter().map(|r| (r.user.as_str(), r.state)).collect();
        assert_eq!(
            keys,
            vec![
                ("bob", PresenceState::Mobile),
                ("bob", PresenceState::Online),
                ("alice", PresenceState::Online),
            ]
        );
    }

    #[test]
    fn labels_carry_state_glyph_and_fall_back_to_username() {
        let data = dataset(r#"{"x1": {"online": [[1, 2]], "active": [[1, 2]]}}"#);
        let rows = build_label_rows(&data, &DisplayProperties::default(), 0);
        assert_eq!(rows[0].label, "x1 ");
        assert_eq!(rows[1].label, format!("x1 {}", egui_phosphor::regular::EYE));
        assert!(rows[0].icon.is_none());
    }

    #[test]
    fn empty_log_yields_no_rows_or_span() {
        let data = dataset("{}");
        let rows = build_label_rows(&data, &DisplayProperties::default(), 0);
        assert!(rows.is_empty());
        assert_eq!(time_span(&rows), None);
    }

    #[test]
    fn span_covers_all_bars() {
        let data = dataset(TWO_USERS);
        let rows = build_label_rows(&data, &DisplayProperties::default(), 0);
        assert_eq!(time_span(&rows), Some((100_000, 6_000_000)));
    }
}
