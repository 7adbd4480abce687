use std::sync::LazyLock;

use regex::Regex;

use super::template::{expand_templates, Template};

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|$)").unwrap());
static REF_SELF_CLOSING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<ref[^>]*/\s*>").unwrap());
static REF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<ref(?:\s[^>]*)?>.*?(?:</ref\s*>|$)").unwrap());
static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap());
static FILE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[\[\s*(?:File|Image|Category)\s*:[^\]]*\]\]").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[(?:[^|\]]*\|)?([^\]]*)\]\]").unwrap());
static EXT_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?:https?:)?//[^\s\]]+\s*([^\]]*)\]").unwrap());
static QUOTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'{2,}").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:[A-Za-z]+|#[0-9]+|#[xX][0-9A-Fa-f]+);").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[*#:;]+[ \t]*").unwrap());
static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s,'\-().]").unwrap());
static URL_DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-.~:/?#@!&+=%]").unwrap());

/// Formatting wrappers whose positional arguments are content.
const WRAPPERS: &[&str] = &[
    "hlist",
    "flatlist",
    "plainlist",
    "ubl",
    "unbulleted list",
    "nowrap",
    "small",
    "url",
];

/// Remove HTML comments. Applied to whole articles before any scanning.
pub fn strip_comments(text: &str) -> String {
    COMMENT_RE.replace_all(text, "").into_owned()
}

/// Drop references and comments; turn `<br>` into a `|` separator.
pub fn strip_refs(text: &str) -> String {
    let text = COMMENT_RE.replace_all(text, "");
    let text = REF_SELF_CLOSING_RE.replace_all(&text, "");
    let text = REF_RE.replace_all(&text, "");
    BR_RE.replace_all(&text, "|").into_owned()
}

/// `[[Target]]` → `Target`, `[[Target|Label]]` → `Label`, external links to
/// their label; file and category links are removed.
pub fn resolve_links(text: &str) -> String {
    let text = FILE_LINK_RE.replace_all(text, "");
    let text = LINK_RE.replace_all(&text, "$1");
    EXT_LINK_RE.replace_all(&text, "$1").into_owned()
}

/// Unwrap the formatting wrappers; every other template is dropped.
pub fn unwrap_wrapper(t: &Template) -> Option<String> {
    let name = t.normalized_name();
    if WRAPPERS.contains(&name.as_str()) {
        return Some(t.positional().collect::<Vec<_>>().join("|"));
    }
    if name == "lang" {
        return t.positional().nth(1).map(str::to_string);
    }
    None
}

/// Steps shared by every field kind: markup removed, separators left as `|`
/// and line breaks.
pub fn prepare(raw: &str) -> String {
    let text = strip_refs(raw);
    let text = resolve_links(&text);
    let text = expand_templates(&text, unwrap_wrapper);
    let text = TAG_RE.replace_all(&text, "");
    let text = QUOTES_RE.replace_all(&text, "");
    let text = BULLET_RE.replace_all(&text, "|");
    ENTITY_RE.replace_all(&text, "").into_owned()
}

/// Normalise a scalar text value. Empty results are absent.
pub fn clean_text(raw: &str) -> Option<String> {
    let items: Vec<String> = separated(&prepare(raw)).filter_map(finish).collect();
    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}

/// Normalise a list value into its items; commas separate items too.
pub fn clean_list(raw: &str) -> Vec<String> {
    separated(&prepare(raw))
        .flat_map(|item| item.split(','))
        .filter_map(finish)
        .collect()
}

/// Normalise a website value, keeping the characters a URL needs.
pub fn clean_url(raw: &str) -> Option<String> {
    separated(&prepare(raw))
        .map(|item| URL_DISALLOWED_RE.replace_all(item.trim(), "").into_owned())
        .find(|item| !item.is_empty())
}

/// Character filter, whitespace collapse and trim for one item.
pub fn finish(item: &str) -> Option<String> {
    let kept = DISALLOWED_RE.replace_all(item, "");
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == ',' || c.is_whitespace());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn separated(text: &str) -> impl Iterator<Item = &str> {
    text.split(['|', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_resolution() {
        assert_eq!(clean_text("[[New York City|NYC]]").as_deref(), Some("NYC"));
        assert_eq!(clean_text("[[New York City]]").as_deref(), Some("New York City"));
    }

    #[test]
    fn refs_and_tags_removed() {
        let raw = "[[Paris]], France<ref name=\"bio\">{{cite web|url=x}}</ref><ref name=b/> <small>(capital)</small>";
        assert_eq!(clean_text(raw).as_deref(), Some("Paris, France (capital)"));
    }

    #[test]
    fn entities_removed_not_decoded() {
        assert_eq!(clean_text("Jo&nbsp;Smith&#160;Jr.").as_deref(), Some("JoSmithJr."));
    }

    #[test]
    fn unknown_templates_discarded() {
        assert_eq!(clean_text("{{circa}} Lagos {{flagicon|NGA}}").as_deref(), Some("Lagos"));
    }

    #[test]
    fn pipes_become_commas_in_text() {
        assert_eq!(
            clean_text("{{nowrap|Ann Marie}}<br/>Smith").as_deref(),
            Some("Ann Marie, Smith")
        );
    }

    #[test]
    fn list_items() {
        let raw = "{{hlist|[[Actor|actress]]|singer}}, [[songwriter]]";
        assert_eq!(clean_list(raw), vec!["actress", "singer", "songwriter"]);
    }

    #[test]
    fn plainlist_bullets_become_items() {
        let raw = "{{plainlist|\n* Painter\n* [[Sculpture|Sculptor]]\n}}";
        assert_eq!(clean_list(raw), vec!["Painter", "Sculptor"]);
    }

    #[test]
    fn empty_after_cleaning_is_absent() {
        assert_eq!(clean_text("{{unknown|x}}<ref>y</ref>"), None);
        assert_eq!(clean_text("  ''' ''' "), None);
        assert!(clean_list("").is_empty());
    }

    #[test]
    fn disallowed_characters_removed() {
        assert_eq!(clean_text("O'Neil & Sons; Ltd.").as_deref(), Some("O'Neil Sons Ltd."));
    }

    #[test]
    fn url_template() {
        assert_eq!(
            clean_url("{{URL|https://www.example.com/about}}").as_deref(),
            Some("https://www.example.com/about")
        );
        assert_eq!(clean_url("{{official website}}"), None);
    }
}
