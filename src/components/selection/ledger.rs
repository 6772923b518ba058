use serde::{Deserialize, Serialize};

/// One day's accumulated list of selected time ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    /// Day label, e.g. `6月1日(木)`
    pub date: String,
    /// Time range labels in the order they were picked
    pub times: Vec<String>,
}

impl SelectionEntry {
    fn new(date: &str, time: &str) -> Self {
        Self {
            date: date.to_string(),
            times: vec![time.to_string()],
        }
    }

    /// Render as one summary line, e.g. `6月1日(木) 10:00-10:30, 11:00-11:30`
    pub fn to_line(&self) -> String {
        format!("{} {}", self.date, self.times.join(", "))
    }
}

/// Ordered, day-keyed collection of user-chosen time ranges.
///
/// Entries keep the order in which their day was first picked. There is never
/// more than one entry for the same day label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionLedger {
    entries: Vec<SelectionEntry>,
}

impl SelectionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a time range to the entry for `date`, creating the entry if needed.
    ///
    /// Identical selections are not de-duplicated.
    pub fn record_selection(&mut self, date: &str, time: &str) {
        match self.entries.iter_mut().find(|entry| entry.date == date) {
            Some(entry) => entry.times.push(time.to_string()),
            None => self.entries.push(SelectionEntry::new(date, time)),
        }
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Summary text, one line per day in insertion order
    pub fn export(&self) -> String {
        self.entries
            .iter()
            .map(SelectionEntry::to_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether `time` has already been picked on `date`
    pub fn contains(&self, date: &str, time: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.date == date && entry.times.iter().any(|t| t == time))
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
