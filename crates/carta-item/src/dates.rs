// SPDX-License-Identifier: MIT OR Apache-2.0
//! Precision-aware date formatting for item pages.

use serde::Serialize;

use carta_record::elements::common::{Date, DateValue};
use carta_record::enums::DatePrecisionCode;

/// A date formatted for display in an HTML `<time>` element.
///
/// `datetime` is the machine-readable attribute value; `value` the
/// human-readable text, reduced to the date's precision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormattedDate {
    pub datetime: String,
    pub value: String,
}

impl FormattedDate {
    pub fn from_date(date: &Date) -> Self {
        let datetime = date.isoformat();
        let value = match (&date.value, date.precision) {
            (DateValue::Day(day), None) => day.format("%-d %B %Y").to_string(),
            (DateValue::Day(day), Some(DatePrecisionCode::Month)) => {
                day.format("%B %Y").to_string()
            }
            (DateValue::Day(day), Some(DatePrecisionCode::Year)) => day.format("%Y").to_string(),
            (DateValue::Instant(instant), _) => {
                format!("{} (UTC)", instant.format("%-d %B %Y %H:%M"))
            }
        };
        Self { datetime, value }
    }

    /// Render as a complete `<time>` element.
    pub fn as_html(&self) -> String {
        format!(
            "<time datetime=\"{}\">{}</time>",
            self.datetime, self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(raw: &str) -> Date {
        Date::structure(&json!(raw)).unwrap()
    }

    #[test]
    fn day_precision_formats_full_date() {
        let formatted = FormattedDate::from_date(&date("2014-06-30"));
        assert_eq!(formatted.datetime, "2014-06-30");
        assert_eq!(formatted.value, "30 June 2014");
    }

    #[test]
    fn month_precision_omits_day() {
        let formatted = FormattedDate::from_date(&date("2014-06"));
        assert_eq!(formatted.datetime, "2014-06");
        assert_eq!(formatted.value, "June 2014");
    }

    #[test]
    fn year_precision_omits_month() {
        let formatted = FormattedDate::from_date(&date("2014"));
        assert_eq!(formatted.datetime, "2014");
        assert_eq!(formatted.value, "2014");
    }

    #[test]
    fn instant_includes_time_marker() {
        let formatted = FormattedDate::from_date(&date("2014-06-30T14:30:45+00:00"));
        assert_eq!(formatted.datetime, "2014-06-30T14:30:45+00:00");
        assert!(formatted.value.contains("(UTC)"));
    }

    #[test]
    fn html_wraps_time_element() {
        let html = FormattedDate::from_date(&date("2014")).as_html();
        assert_eq!(html, "<time datetime=\"2014\">2014</time>");
    }
}
