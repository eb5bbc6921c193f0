use chrono::{Datelike, NaiveDate};

/// How dates are written into stamp lines and suggested file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `YY-MM-DD`
    Short,
    /// `YYYY-Month-DD`
    Long,
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const LINE_WIDTH: usize = 80;
const MAX_CENTER_LEN: usize = LINE_WIDTH - 4;

impl DateFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::Short => "YY-MM-DD",
            DateFormat::Long => "YYYY-Month-DD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "YY-MM-DD" | "short" => Some(DateFormat::Short),
            "YYYY-Month-DD" | "long" => Some(DateFormat::Long),
            _ => None,
        }
    }

    pub fn format(&self, date: NaiveDate) -> String {
        match self {
            DateFormat::Short => date.format("%y-%m-%d").to_string(),
            DateFormat::Long => format!(
                "{}-{}-{:02}",
                date.year(),
                MONTH_NAMES[date.month0() as usize],
                date.day()
            ),
        }
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat::Short
    }
}

/// Build the 80-column separator line: the optional date and the custom text
/// joined with an underscore, centered in a run of underscores. With nothing
/// to center, the line is a plain separator.
pub fn date_line(
    include_date: bool,
    format: DateFormat,
    custom_text: &str,
    date: NaiveDate,
) -> String {
    let mut center = if include_date {
        format.format(date)
    } else {
        String::new()
    };

    let custom = custom_text.trim();
    if !custom.is_empty() {
        if center.is_empty() {
            center = custom.to_string();
        } else {
            center = format!("{}_{}", center, custom);
        }
    }

    if center.chars().count() > MAX_CENTER_LEN {
        center = center.chars().take(MAX_CENTER_LEN).collect();
    }

    let pad = LINE_WIDTH - center.chars().count();
    let left = "_".repeat(pad / 2);
    let right = "_".repeat(pad - pad / 2);
    format!("{}{}{}", left, center, right)
}

/// Wrap content between two stamp lines, blank-line separated.
pub fn decorate(content: &str, line: &str) -> String {
    format!("{}\n\n{}\n\n{}", line, content, line)
}

/// Suggested name for a new note, `YY-MM-DD_`.
pub fn default_file_name(date: NaiveDate) -> String {
    format!("{}_", date.format("%y-%m-%d"))
}
