pub mod infobox;
pub mod lists;

use tracing::debug;

use super::blocks::classify_lines;
use super::clean::{clean_list, clean_text, clean_url, strip_comments};
use super::dates::normalize_birth_date;
use super::fields::{FieldKind, FieldSpec, DEFAULT_FIELDS};
use super::relations::{count_children, normalize_relationship, ChildrenPolicy};
use super::sections::cluster_sections;
use crate::record::{Field, FieldValue, Record};
use infobox::Infobox;

pub const DEFAULT_INFOBOX_TYPES: &[&str] = &[
    "person",
    "musical artist",
    "actor",
    "writer",
    "artist",
    "scientist",
    "officeholder",
    "sportsperson",
    "comedian",
    "model",
    "presenter",
    "philosopher",
    "military person",
    "football biography",
    "basketball biography",
    "baseball biography",
    "tennis biography",
    "royalty",
    "religious biography",
    "academic",
    "journalist",
    "architect",
    "dancer",
    "chef",
    "astronaut",
];

pub const DEFAULT_AWARD_HEADINGS: &[&str] = &["Awards", "Honors"];
pub const DEFAULT_WORKS_HEADINGS: &[&str] = &["Works", "Selected works"];

/// Everything the pipeline can be tuned with.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub fields: Vec<FieldSpec>,
    /// Subject types (after `Infobox `) that mark a person article.
    pub infobox_types: Vec<String>,
    pub award_headings: Vec<String>,
    pub works_headings: Vec<String>,
    pub children_policy: ChildrenPolicy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELDS.to_vec(),
            infobox_types: to_strings(DEFAULT_INFOBOX_TYPES),
            award_headings: to_strings(DEFAULT_AWARD_HEADINGS),
            works_headings: to_strings(DEFAULT_WORKS_HEADINGS),
            children_policy: ChildrenPolicy::default(),
        }
    }
}

pub fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Build the record for one article, or `None` when it has no person infobox.
pub fn extract_record(title: &str, markup: &str, config: &ExtractConfig) -> Option<Record> {
    let markup = strip_comments(markup);
    let infobox = Infobox::locate(&markup, &config.infobox_types)?;

    let mut record = Record::new(title);
    for spec in &config.fields {
        if let Some(value) = field_value(&infobox, spec) {
            record.set(spec.field, value);
        }
    }

    // Section lists win over the infobox's own `awards` / `notable_works`.
    let sections = cluster_sections(&classify_lines(&markup));
    let works = lists::section_list(&sections, &config.works_headings);
    if !works.is_empty() {
        record.set(Field::Works, FieldValue::List(works));
    }
    let awards = lists::section_list(&sections, &config.award_headings);
    if !awards.is_empty() {
        record.set(Field::Awards, FieldValue::List(awards));
    }

    if let Some(n) = config.children_policy.apply(record.children) {
        record.set(Field::Children, FieldValue::Count(n));
    }

    debug!(title, subject = %infobox.subject, "extracted record");
    Some(record)
}

fn field_value(infobox: &Infobox, spec: &FieldSpec) -> Option<FieldValue> {
    let groups = infobox.values_by_source(spec.keys);
    let mut values = groups.iter().flatten().copied();
    match spec.kind {
        FieldKind::Text => values.find_map(clean_text).map(FieldValue::Text),
        FieldKind::Url => values.find_map(clean_url).map(FieldValue::Text),
        FieldKind::List => values
            .map(clean_list)
            .find(|items| !items.is_empty())
            .map(FieldValue::List),
        FieldKind::Date => values.find_map(normalize_birth_date).map(FieldValue::Text),
        FieldKind::Count => values.find_map(count_children).map(FieldValue::Count),
        // One source's values together; a module never adds to the primary's.
        FieldKind::Relation => groups
            .iter()
            .find_map(|g| normalize_relationship(g.iter().copied()))
            .map(FieldValue::Text),
    }
}

// ── Tests ──
