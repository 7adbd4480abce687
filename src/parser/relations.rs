use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::clean::{clean_text, resolve_links, strip_refs, unwrap_wrapper};
use super::template::{expand_templates, Template};

static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^()]*\)").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d+)\b").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]+").unwrap());

/// What an article that lists no parseable child count stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildrenPolicy {
    /// Leave the count absent.
    #[default]
    Null,
    /// Store zero.
    Zero,
}

impl ChildrenPolicy {
    pub fn apply(self, count: Option<u32>) -> Option<u32> {
        match self {
            ChildrenPolicy::Null => count,
            ChildrenPolicy::Zero => Some(count.unwrap_or(0)),
        }
    }
}

/// Normalise one or more raw `spouse`/`partner` values into a single string.
///
/// `{{marriage|Name|start|end}}` contributes `Name`; parenthetical asides
/// such as divorce years are dropped; each person is joined with `", "`.
pub fn normalize_relationship<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut people = Vec::new();
    for raw in values {
        let text = expand_templates(&resolve_links(&strip_refs(raw)), marriage_or_wrapper);
        for element in text.split(['|', '\n']) {
            let mut element = element.to_string();
            while PAREN_RE.is_match(&element) {
                element = PAREN_RE.replace_all(&element, "").into_owned();
            }
            if let Some(person) = clean_text(&element) {
                people.push(person);
            }
        }
    }
    if people.is_empty() {
        None
    } else {
        Some(people.join(", "))
    }
}

fn marriage_or_wrapper(t: &Template) -> Option<String> {
    match t.normalized_name().as_str() {
        "marriage" | "married" => t.positional().next().map(|name| format!("|{}|", name)),
        _ => unwrap_wrapper(t),
    }
}

/// Child count from a raw `children` value: a digit token first, then English
/// number words. `None` when neither is present.
pub fn count_children(raw: &str) -> Option<u32> {
    let text = expand_templates(&resolve_links(&strip_refs(raw)), unwrap_wrapper);

    if let Some(caps) = DIGITS_RE.captures(&text) {
        return caps[1].parse().ok();
    }
    words_to_number(&text)
}

/// Sum of a run of number words. `None` when the run is empty or does not
/// fit in a `u32`.
fn words_to_number(text: &str) -> Option<u32> {
    let mut seen = false;
    let mut current = 0u32;
    for word in WORD_RE.find_iter(text).map(|m| m.as_str().to_lowercase()) {
        match number_word(&word) {
            Some(NumberWord::Value(v)) => {
                current = current.checked_add(v)?;
                seen = true;
            }
            Some(NumberWord::Hundred) if seen => current = current.max(1).checked_mul(100)?,
            _ if seen && word == "and" => {}
            _ if seen => break,
            _ => {}
        }
    }
    seen.then_some(current)
}

enum NumberWord {
    Value(u32),
    Hundred,
}

fn number_word(word: &str) -> Option<NumberWord> {
    const UNITS: &[&str] = &[
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
        "eighteen", "nineteen",
    ];
    const TENS: &[&str] = &[
        "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ];
    if word == "hundred" {
        return Some(NumberWord::Hundred);
    }
    if let Some(i) = UNITS.iter().position(|w| *w == word) {
        return Some(NumberWord::Value(i as u32));
    }
    TENS.iter()
        .position(|w| *w == word)
        .map(|i| NumberWord::Value((i as u32 + 2) * 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marriage_template() {
        assert_eq!(
            normalize_relationship(["{{marriage|Jane Doe|2001|2010}}"]).as_deref(),
            Some("Jane Doe")
        );
    }

    #[test]
    fn several_marriages_and_links() {
        let raw = "{{marriage|[[Jane Doe]]|2001|2010|end=div}}<br />{{Marriage|Ann Roe (actress)|2012}}";
        assert_eq!(normalize_relationship([raw]).as_deref(), Some("Jane Doe, Ann Roe"));
    }

    #[test]
    fn parentheses_and_other_templates_dropped() {
        assert_eq!(
            normalize_relationship(["[[John Smith]] (m. 1990; div. 1995){{efn|second}}"]).as_deref(),
            Some("John Smith")
        );
    }

    #[test]
    fn list_of_raw_values() {
        let values = vec!["[[A. Person|Alice]]", "", "{{plainlist|\n* Bob\n* Carol}}"];
        assert_eq!(
            normalize_relationship(values.iter().copied()).as_deref(),
            Some("Alice, Bob, Carol")
        );
        assert_eq!(normalize_relationship(Vec::<&str>::new()), None);
    }

    #[test]
    fn children_digits_preferred() {
        assert_eq!(count_children("3"), Some(3));
        assert_eq!(count_children("2<ref>Interview, 1999</ref>"), Some(2));
        assert_eq!(count_children("two, including 1 adopted"), Some(1));
    }

    #[test]
    fn children_number_words() {
        assert_eq!(count_children("three"), Some(3));
        assert_eq!(count_children("Twenty-one"), Some(21));
        assert_eq!(count_children("one hundred and two"), Some(102));
        assert_eq!(count_children("none, zero"), Some(0));
    }

    #[test]
    fn children_number_words_out_of_range() {
        assert_eq!(count_children("one hundred hundred hundred hundred hundred"), None);
        assert_eq!(count_children("one hundred hundred"), Some(10000));
        assert_eq!(count_children("99999999999"), None);
    }

    #[test]
    fn children_unparseable_is_absent() {
        assert_eq!(count_children("[[Ann Smith|Ann]], [[Bob Smith|Bob]]"), None);
        assert_eq!(count_children(""), None);
    }

    #[test]
    fn children_policy() {
        assert_eq!(ChildrenPolicy::Null.apply(None), None);
        assert_eq!(ChildrenPolicy::Zero.apply(None), Some(0));
        assert_eq!(ChildrenPolicy::Zero.apply(Some(4)), Some(4));
    }
}
