use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the presence states recorded per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    Online,
    Active,
    Mobile,
}

impl PresenceState {
    /// Canonical display order.
    pub const ALL: [PresenceState; 3] = [Self::Online, Self::Active, Self::Mobile];

    pub fn name(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Active => "active",
            Self::Mobile => "mobile",
        }
    }

    /// Glyph appended to row labels. Plain online rows carry none.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Online => "",
            Self::Active => egui_phosphor::regular::EYE,
            Self::Mobile => egui_phosphor::regular::DEVICE_MOBILE,
        }
    }
}

/// A `[start, end]` pair of epoch seconds. `end` is `None` while the
/// recording was still open when the database was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i64, Option<i64>)", into = "(i64, Option<i64>)")]
pub struct Interval {
    pub start: i64,
    pub end: Option<i64>,
}

impl From<(i64, Option<i64>)> for Interval {
    fn from((start, end): (i64, Option<i64>)) -> Self {
        Self { start, end }
    }
}

impl From<Interval> for (i64, Option<i64>) {
    fn from(interval: Interval) -> Self {
        (interval.start, interval.end)
    }
}

/// Everything recorded about a single user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub online: Vec<Interval>,
    #[serde(default)]
    pub active: Vec<Interval>,
    #[serde(default)]
    pub mobile: Vec<Interval>,
    #[serde(default)]
    pub fullname: Option<String>,
    /// Base64 encoded thumbnail.
    #[serde(default)]
    pub image: Option<String>,
}

impl UserRecord {
    pub fn intervals(&self, state: PresenceState) -> &[Interval] {
        match state {
            PresenceState::Online => &self.online,
            PresenceState::Active => &self.active,
            PresenceState::Mobile => &self.mobile,
        }
    }

    fn intervals_mut(&mut self, state: PresenceState) -> &mut Vec<Interval> {
        match state {
            PresenceState::Online => &mut self.online,
            PresenceState::Active => &mut self.active,
            PresenceState::Mobile => &mut self.mobile,
        }
    }

    /// Full name when known, otherwise the username key.
    pub fn display_name<'a>(&'a self, user: &'a str) -> &'a str {
        match self.fullname.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => user,
        }
    }
}

/// The presence database: username → record, kept sorted by username.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresenceLog {
    pub users: BTreeMap<String, UserRecord>,
}

impl PresenceLog {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// A decoded avatar ready for the egui image loaders.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub uri: String,
    pub bytes: Arc<[u8]>,
}

impl Avatar {
    /// Decode a base64 payload, with or without a `data:` URI prefix.
    pub fn decode(user: &str, encoded: &str) -> Result<Self, base64::DecodeError> {
        let payload = match encoded.split_once(";base64,") {
            Some((_, rest)) => rest,
            None => encoded,
        };
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        bytes.hash(&mut hasher);
        Ok(Self {
            uri: format!("bytes://avatar/{}-{:016x}", user, hasher.finish()),
            bytes: bytes.into(),
        })
    }
}

/// A loaded presence log plus everything derived from it once per load.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub log: PresenceLog,
    /// Usernames in sorted order.
    pub users: Vec<String>,
    pub avatars: HashMap<String, Avatar>,
    pub loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Open intervals are closed at `now`.
    pub fn new(mut log: PresenceLog, now: DateTime<Utc>) -> Self {
        let now_secs = now.timestamp();
        let mut avatars = HashMap::new();

        for (user, record) in log.users.iter_mut() {
            for state in PresenceState::ALL {
                let intervals = record.intervals_mut(state);
                let mut closed = 0;
                for interval in intervals.iter_mut().filter(|i| i.end.is_none()) {
                    interval.end = Some(now_secs.max(interval.start));
                    closed += 1;
                }
                if closed > 0 {
                    tracing::debug!(user = %user, state = state.name(), closed, "closed open intervals");
                }
            }

            if let Some(encoded) = record.image.as_deref().filter(|s| !s.is_empty()) {
                match Avatar::decode(user, encoded) {
                    Ok(avatar) => {
                        avatars.insert(user.clone(), avatar);
                    }
                    Err(e) => tracing::warn!(user = %user, "ignoring undecodable avatar: {}", e),
                }
            }
        }

        let users = log.users.keys().cloned().collect();
        Self {
            log,
            users,
            avatars,
            loaded_at: now,
        }
    }

    pub fn user(&self, name: &str) -> Option<&UserRecord> {
        self.log.users.get(name)
    }

    pub fn interval_count(&self) -> usize {
        self.log
            .users
            .values()
            .map(|r| PresenceState::ALL.iter().map(|s| r.intervals(*s).len()).sum::<usize>())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{
        "bob": {"online": [[100, 200], [300, null]], "active": [], "mobile": [],
                "fullname": "Bob Builder", "image": null},
        "alice": {"online": [[1000, 2000]], "active": [[1100, 1200]],
                  "fullname": null, "image": "aGVsbG8="}
    }"#;

    fn closed(start: i64, end: i64) -> Interval {
        Interval {
            start,
            end: Some(end),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn parses_log_with_missing_states_and_nulls() {
        let log = PresenceLog::from_json(SAMPLE).unwrap();
        let alice = &log.users["alice"];
        assert_eq!(alice.online, vec![closed(1000, 2000)]);
        assert!(alice.mobile.is_empty());
        assert_eq!(log.users["bob"].online[1], Interval { start: 300, end: None });
    }

    #[test]
    fn rejects_malformed_intervals() {
        assert!(PresenceLog::from_json(r#"{"x": {"online": [[1]]}}"#).is_err());
        assert!(PresenceLog::from_json("[]").is_err());
    }

    #[test]
    fn dataset_sorts_users_and_closes_open_intervals() {
        let log = PresenceLog::from_json(SAMPLE).unwrap();
        let dataset = Dataset::new(log, at(5000));
        assert_eq!(dataset.users, vec!["alice", "bob"]);
        assert_eq!(
            dataset.user("bob").unwrap().online[1],
            closed(300, 5000)
        );
        assert_eq!(dataset.interval_count(), 4);
    }

    #[test]
    fn open_interval_never_ends_before_it_starts() {
        let log = PresenceLog::from_json(r#"{"c": {"online": [[9000, null]]}}"#).unwrap();
        let dataset = Dataset::new(log, at(10));
        assert_eq!(dataset.user("c").unwrap().online[0], closed(9000, 9000));
    }

    #[test]
    fn decodes_avatars_and_skips_garbage() {
        let log = PresenceLog::from_json(
            r#"{"a": {"image": "aGVsbG8="}, "b": {"image": "%%%"}, "c": {"image": ""}}"#,
        )
        .unwrap();
        let dataset = Dataset::new(log, at(0));
        assert_eq!(&*dataset.avatars["a"].bytes, b"hello");
        assert!(dataset.avatars["a"].uri.starts_with("bytes://avatar/a-"));
        assert!(!dataset.avatars.contains_key("b"));
        assert!(!dataset.avatars.contains_key("c"));
    }

    #[test]
    fn avatar_accepts_data_uri_prefix() {
        let avatar = Avatar::decode("a", "data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(&*avatar.bytes, b"hello");
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let log = PresenceLog::from_json(SAMPLE).unwrap();
        assert_eq!(log.users["alice"].display_name("alice"), "alice");
        assert_eq!(log.users["bob"].display_name("bob"), "Bob Builder");
    }
}
