use std::path::Path;

use crate::error::ViewerError;
use crate::model::timeline::format_timestamp;
use crate::model::LabelRow;

/// Export the displayed rows to a semicolon-delimited CSV file, one line per
/// bar.
///
/// Columns: User ; Label ; State ; Start ; End
/// Times are the displayed (shifted) times, formatted `%Y-%m-%d %H:%M:%S`.
/// Returns the number of bars written.
pub fn export_csv(rows: &[LabelRow], path: &Path) -> Result<usize, ViewerError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_path(path)?;

    wtr.write_record(["User", "Label", "State", "Start", "End"])?;

    let mut count = 0;
    for row in rows {
        for pair in &row.times {
            let start = format_timestamp(pair.starting_time);
            let end = format_timestamp(pair.ending_time);
            wtr.write_record([
                row.user.as_str(),
                row.label.trim(),
                row.state.name(),
                start.as_str(),
                end.as_str(),
            ])?;
            count += 1;
        }
    }

    wtr.flush().map_err(|e| ViewerError::io(path, e))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::label::TimePair;
    use crate::model::PresenceState;

    #[test]
    fn writes_one_line_per_bar() {
        let rows = vec![LabelRow {
            user: "alice".into(),
            state: PresenceState::Online,
            label: "Alice ".into(),
            icon: None,
            times: vec![
                TimePair {
                    starting_time: 0,
                    ending_time: 60_000,
                },
                TimePair {
                    starting_time: 86_400_000,
                    ending_time: 86_460_000,
                },
            ],
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");

        assert_eq!(export_csv(&rows, &path).unwrap(), 2);
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "User;Label;State;Start;End");
        assert_eq!(lines[1], "alice;Alice;online;1970-01-01 00:00:00;1970-01-01 00:01:00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("rows.csv");
        assert!(matches!(export_csv(&[], &path), Err(ViewerError::Csv(_))));
    }
}
