use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::clean::{resolve_links, strip_refs};
use super::template::{rewrite_templates, top_level_templates};

static DAY_MONTH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})\b").unwrap());
static MONTH_DAY_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]+)\s+(\d{1,2}),?\s+(\d{4})\b").unwrap());
static ISO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

const BIRTH_TEMPLATES: &[&str] = &["birth date", "birth date and age", "bda", "dob"];

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Canonical `YYYY-MM-DD` for a raw `birth_date` value, or `None`.
///
/// Tries the birth-date template, then `4 May 1929`, then `May 4, 1929`,
/// then `1929-5-4`. Candidates that are not real calendar dates are skipped.
pub fn normalize_birth_date(raw: &str) -> Option<String> {
    let text = strip_refs(raw);
    if let Some(date) = from_template(&text) {
        return Some(date);
    }

    let prose = resolve_links(&rewrite_templates(&text, |_| None));
    from_day_month_year(&prose)
        .or_else(|| from_month_day_year(&prose))
        .or_else(|| from_iso(&prose))
}

fn from_template(text: &str) -> Option<String> {
    top_level_templates(text)
        .iter()
        .filter(|t| BIRTH_TEMPLATES.contains(&t.normalized_name().as_str()))
        .find_map(|t| {
            let args: Vec<&str> = t.positional().filter(|a| !a.is_empty()).collect();
            match args.as_slice() {
                [y, m, d, ..] => ymd(y, m, d),
                [single] => from_iso(single),
                _ => None,
            }
        })
}

fn from_day_month_year(text: &str) -> Option<String> {
    DAY_MONTH_YEAR_RE.captures_iter(text).find_map(|c| {
        let month = month_number(&c[2])?;
        ymd(&c[3], &month.to_string(), &c[1])
    })
}

fn from_month_day_year(text: &str) -> Option<String> {
    MONTH_DAY_YEAR_RE.captures_iter(text).find_map(|c| {
        let month = month_number(&c[1])?;
        ymd(&c[3], &month.to_string(), &c[2])
    })
}

fn from_iso(text: &str) -> Option<String> {
    ISO_RE
        .captures_iter(text)
        .find_map(|c| ymd(&c[1], &c[2], &c[3]))
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|i| i as u32 + 1)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<String> {
    let year = year.trim();
    if year.len() != 4 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(
        year.parse().ok()?,
        month.trim().parse().ok()?,
        day.trim().parse().ok()?,
    )?;
    Some(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_form() {
        assert_eq!(normalize_birth_date("{{birth date|1955|3|9}}").as_deref(), Some("1955-03-09"));
        assert_eq!(
            normalize_birth_date("{{Birth date and age|df=yes|1970|12|1}}").as_deref(),
            Some("1970-12-01")
        );
        assert_eq!(
            normalize_birth_date("{{birth date and age|1980-7-4}}").as_deref(),
            Some("1980-07-04")
        );
    }

    #[test]
    fn prose_forms() {
        assert_eq!(normalize_birth_date("4 May 1929").as_deref(), Some("1929-05-04"));
        assert_eq!(normalize_birth_date("4 MAY 1929").as_deref(), Some("1929-05-04"));
        assert_eq!(normalize_birth_date("March 9, 1955").as_deref(), Some("1955-03-09"));
        assert_eq!(
            normalize_birth_date("[[4 May]] [[1929]]<ref>Born 1 June 1930</ref>").as_deref(),
            Some("1929-05-04")
        );
    }

    #[test]
    fn iso_form() {
        assert_eq!(normalize_birth_date("1980-7-4").as_deref(), Some("1980-07-04"));
    }

    #[test]
    fn unparseable_is_absent() {
        assert_eq!(normalize_birth_date("circa 1920s"), None);
        assert_eq!(normalize_birth_date("1920"), None);
        assert_eq!(normalize_birth_date(""), None);
        assert_eq!(normalize_birth_date("{{birth year and age|1950}}"), None);
    }

    #[test]
    fn impossible_dates_are_absent() {
        assert_eq!(normalize_birth_date("{{birth date|1955|13|9}}"), None);
        assert_eq!(normalize_birth_date("31 February 1990"), None);
        assert_eq!(normalize_birth_date("4 Maytember 1929"), None);
    }
}
