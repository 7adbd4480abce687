use crate::record::Field;

/// How a raw infobox value is normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Url,
    List,
    Date,
    Relation,
    Count,
}

/// Which infobox parameters feed a field, and how.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: Field,
    pub keys: &'static [&'static str],
    pub kind: FieldKind,
}

const fn spec(field: Field, keys: &'static [&'static str], kind: FieldKind) -> FieldSpec {
    FieldSpec { field, keys, kind }
}

pub const DEFAULT_FIELDS: &[FieldSpec] = &[
    spec(Field::Name, &["name"], FieldKind::Text),
    spec(Field::BirthName, &["birth_name"], FieldKind::Text),
    spec(Field::BirthDate, &["birth_date"], FieldKind::Date),
    spec(Field::BirthPlace, &["birth_place"], FieldKind::Text),
    spec(Field::Occupation, &["occupation", "occupations"], FieldKind::List),
    spec(Field::Spouse, &["spouse", "spouses"], FieldKind::Relation),
    spec(Field::Partner, &["partner", "partners", "domestic_partner"], FieldKind::Relation),
    spec(Field::Children, &["children", "num_children"], FieldKind::Count),
    spec(Field::Works, &["notable_works", "works"], FieldKind::List),
    spec(Field::Awards, &["awards"], FieldKind::List),
    spec(Field::Website, &["website", "url"], FieldKind::Url),
    spec(Field::Genre, &["genre", "genres"], FieldKind::Text),
    spec(Field::Instrument, &["instrument", "instruments"], FieldKind::Text),
    spec(Field::Label, &["label", "labels"], FieldKind::Text),
];

/// Infobox parameter names compare lower-cased with spaces read as underscores.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}
