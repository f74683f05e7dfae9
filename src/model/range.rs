//! The inclusive date range that drives the transaction query and the
//! shareable link.

use chrono::{Datelike, NaiveDate};
use tracing::warn;
use url::Url;

const START_DATE_PARAM: &str = "startDate";
const END_DATE_PARAM: &str = "endDate";

/// An inclusive date range. `start <= end` is not enforced: the backend
/// answers an inverted range with an empty transaction list, so we log and
/// pass it through instead of rejecting user input.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let range = Self { start, end };
        range.warn_if_inverted();
        range
    }

    /// The default range: first day of `today`'s month through `today`.
    pub fn default_for(today: NaiveDate) -> Self {
        let first_of_month = today.with_day(1).unwrap_or(today);
        Self {
            start: first_of_month,
            end: today,
        }
    }

    /// Builds a range from a shared link's `startDate`/`endDate` query
    /// parameters. Missing or unparseable parameters fall back per-field to
    /// the default range for `today`.
    pub fn from_url(url: &Url, today: NaiveDate) -> Self {
        let defaults = Self::default_for(today);
        let start = query_date(url, START_DATE_PARAM).unwrap_or(defaults.start);
        let end = query_date(url, END_DATE_PARAM).unwrap_or(defaults.end);
        Self::new(start, end)
    }

    /// Resolves the effective range at startup: explicit dates win over link
    /// parameters, which win over the defaults for `today`.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        link: Option<&Url>,
        today: NaiveDate,
    ) -> Self {
        let base = match link {
            Some(url) => Self::from_url(url, today),
            None => Self::default_for(today),
        };
        Self::new(from.unwrap_or(base.start), to.unwrap_or(base.end))
    }

    /// Writes the range into `url` as `startDate`/`endDate` query parameters,
    /// replacing any existing values while keeping unrelated parameters.
    pub fn apply_to_url(&self, url: &mut Url) {
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != START_DATE_PARAM && k != END_DATE_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &others {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(START_DATE_PARAM, &self.start.to_string());
        pairs.append_pair(END_DATE_PARAM, &self.end.to_string());
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn set_start(&mut self, start: NaiveDate) {
        self.start = start;
        self.warn_if_inverted();
    }

    pub fn set_end(&mut self, end: NaiveDate) {
        self.end = end;
        self.warn_if_inverted();
    }

    fn warn_if_inverted(&self) {
        if self.start > self.end {
            warn!(
                "date range starts after it ends ({} > {}), expect an empty result",
                self.start, self.end
            );
        }
    }
}

/// Reads a date-valued query parameter, ignoring values that do not parse.
fn query_date(url: &Url, param: &str) -> Option<NaiveDate> {
    let raw = url
        .query_pairs()
        .find(|(k, _)| k == param)
        .map(|(_, v)| v.into_owned())?;
    match raw.parse::<NaiveDate>() {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("ignoring unparseable {param} value '{raw}'");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_is_first_of_month_through_today() {
        let range = DateRange::default_for(date("2025-03-17"));
        assert_eq!(range.start(), date("2025-03-01"));
        assert_eq!(range.end(), date("2025-03-17"));
    }

    #[test]
    fn test_url_round_trip() {
        let range = DateRange::new(date("2025-01-05"), date("2025-02-10"));
        let mut url = Url::parse("https://example.com/dashboard").unwrap();
        range.apply_to_url(&mut url);
        assert_eq!(
            url.as_str(),
            "https://example.com/dashboard?startDate=2025-01-05&endDate=2025-02-10"
        );
        let parsed = DateRange::from_url(&url, date("2025-06-30"));
        assert_eq!(parsed, range);
    }

    #[test]
    fn test_apply_replaces_previous_values_and_keeps_others() {
        let mut url =
            Url::parse("https://example.com/?theme=dark&startDate=2024-01-01&endDate=2024-01-31")
                .unwrap();
        DateRange::new(date("2025-05-01"), date("2025-05-31")).apply_to_url(&mut url);
        assert_eq!(
            url.as_str(),
            "https://example.com/?theme=dark&startDate=2025-05-01&endDate=2025-05-31"
        );
    }

    #[test]
    fn test_from_url_falls_back_per_field() {
        let url = Url::parse("https://example.com/?startDate=2025-03-05").unwrap();
        let range = DateRange::from_url(&url, date("2025-03-17"));
        assert_eq!(range.start(), date("2025-03-05"));
        assert_eq!(range.end(), date("2025-03-17"));
    }

    #[test]
    fn test_from_url_ignores_garbage() {
        let url = Url::parse("https://example.com/?startDate=yesterday&endDate=2025-03-10").unwrap();
        let range = DateRange::from_url(&url, date("2025-03-17"));
        assert_eq!(range.start(), date("2025-03-01"));
        assert_eq!(range.end(), date("2025-03-10"));
    }

    #[test]
    fn test_resolve_precedence() {
        let url = Url::parse("https://example.com/?startDate=2025-03-05&endDate=2025-03-20").unwrap();
        let range = DateRange::resolve(
            Some(date("2025-03-10")),
            None,
            Some(&url),
            date("2025-03-31"),
        );
        assert_eq!(range.start(), date("2025-03-10"));
        assert_eq!(range.end(), date("2025-03-20"));
    }

    #[test]
    fn test_inverted_range_is_allowed() {
        let range = DateRange::new(date("2025-03-17"), date("2025-03-01"));
        assert!(range.start() > range.end());
    }
}
