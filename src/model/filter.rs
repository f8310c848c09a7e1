use chrono::format::{Item, StrftimeItems};
use regex::Regex;

use super::presence::{Dataset, PresenceState};
use crate::error::FilterError;

pub const DEFAULT_TICK_FORMAT: &str = "%a. %H:%M";
pub const DEFAULT_TICK_FREQUENCY: u32 = 6;

/// Granularity of the time axis ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickUnit {
    Minutes,
    Hours,
    Days,
    Months,
    Years,
}

impl TickUnit {
    pub const ALL: [TickUnit; 5] = [
        Self::Minutes,
        Self::Hours,
        Self::Days,
        Self::Months,
        Self::Years,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Minutes => "Minutes",
            Self::Hours => "Hours",
            Self::Days => "Days",
            Self::Months => "Months",
            Self::Years => "Years",
        }
    }
}

/// Resolved, validated view configuration.
///
/// Empty `states`/`users` and `None` bounds mean "no restriction"; the
/// defaults are applied when rows are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayProperties {
    pub states: Vec<PresenceState>,
    pub users: Vec<String>,
    /// Inclusive lower bound in epoch seconds.
    pub from: Option<i64>,
    /// Inclusive upper bound in epoch seconds.
    pub to: Option<i64>,
    /// strftime format for tick labels. May be empty.
    pub tick_format: String,
    pub tick_unit: TickUnit,
    pub tick_frequency: u32,
}

impl Default for DisplayProperties {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            users: Vec::new(),
            from: None,
            to: None,
            tick_format: DEFAULT_TICK_FORMAT.to_string(),
            tick_unit: TickUnit::Hours,
            tick_frequency: DEFAULT_TICK_FREQUENCY,
        }
    }
}

/// Raw state of the filter controls, edited directly by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterForm {
    pub online: bool,
    pub active: bool,
    pub mobile: bool,
    /// Regex matched against usernames and full names.
    pub user_pattern: String,
    pub from: String,
    pub to: String,
    pub tick_year: bool,
    pub tick_month: bool,
    pub tick_day: bool,
    pub tick_weekday: bool,
    pub tick_hour: bool,
    pub tick_minute: bool,
    pub tick_unit: TickUnit,
    pub tick_frequency: String,
}

impl Default for FilterForm {
    fn default() -> Self {
        Self {
            online: false,
            active: false,
            mobile: false,
            user_pattern: String::new(),
            from: String::new(),
            to: String::new(),
            tick_year: false,
            tick_month: false,
            tick_day: false,
            tick_weekday: true,
            tick_hour: true,
            tick_minute: true,
            tick_unit: TickUnit::Hours,
            tick_frequency: DEFAULT_TICK_FREQUENCY.to_string(),
        }
    }
}

impl FilterForm {
    /// Validate the controls and resolve them into display properties.
    pub fn build(&self, dataset: Option<&Dataset>) -> Result<DisplayProperties, FilterError> {
        let states = [
            (self.online, PresenceState::Online),
            (self.active, PresenceState::Active),
            (self.mobile, PresenceState::Mobile),
        ]
        .into_iter()
        .filter_map(|(checked, state)| checked.then_some(state))
        .collect();

        let users = self.matching_users(dataset)?;

        let from = parse_epoch("from", &self.from)?;
        let to = parse_epoch("to", &self.to)?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(FilterError::EmptyRange { from, to });
            }
        }

        let tick_format = self.tick_format();
        if StrftimeItems::new(&tick_format).any(|item| matches!(item, Item::Error)) {
            return Err(FilterError::InvalidTickFormat(tick_format));
        }

        let tick_frequency = match self.tick_frequency.trim() {
            "" => 1,
            text => match text.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(FilterError::InvalidTickFrequency(text.to_string())),
            },
        };

        Ok(DisplayProperties {
            states,
            users,
            from,
            to,
            tick_format,
            tick_unit: self.tick_unit,
            tick_frequency,
        })
    }

    /// Tick label format assembled from the checked parts, in fixed order.
    pub fn tick_format(&self) -> String {
        let parts = [
            (self.tick_year, "%Y "),
            (self.tick_month, "%b "),
            (self.tick_day, "%d "),
            (self.tick_weekday, "%a. "),
            (self.tick_hour, "%H"),
            (self.tick_minute, ":%M"),
        ];
        let format: String = parts
            .iter()
            .filter(|(checked, _)| *checked)
            .map(|(_, part)| *part)
            .collect();
        format.trim().to_string()
    }

    fn matching_users(&self, dataset: Option<&Dataset>) -> Result<Vec<String>, FilterError> {
        let pattern = self.user_pattern.trim();
        if pattern.is_empty() {
            return Ok(Vec::new());
        }

        let re = Regex::new(pattern)?;
        let users: Vec<String> = dataset
            .map(|data| {
                data.users
                    .iter()
                    .filter(|user| {
                        let name = data
                            .user(user)
                            .map(|r| r.display_name(user))
                            .unwrap_or(user.as_str());
                        re.is_match(user) || re.is_match(name)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if users.is_empty() {
            return Err(FilterError::NoMatchingUsers(pattern.to_string()));
        }
        Ok(users)
    }
}

/// Empty and `0` both mean "unbounded".
fn parse_epoch(field: &'static str, text: &str) -> Result<Option<i64>, FilterError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<i64>() {
        Ok(0) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(FilterError::InvalidEpoch {
            field,
            value: text.to_string(),
        }),
    }
}
