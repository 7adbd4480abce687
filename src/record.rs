use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

/// Fields a person record can carry besides `person_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    BirthName,
    BirthDate,
    BirthPlace,
    Occupation,
    Spouse,
    Partner,
    Children,
    Works,
    Awards,
    Website,
    Genre,
    Instrument,
    Label,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::BirthName => "birth_name",
            Field::BirthDate => "birth_date",
            Field::BirthPlace => "birth_place",
            Field::Occupation => "occupation",
            Field::Spouse => "spouse",
            Field::Partner => "partner",
            Field::Children => "children",
            Field::Works => "works",
            Field::Awards => "awards",
            Field::Website => "website",
            Field::Genre => "genre",
            Field::Instrument => "instrument",
            Field::Label => "label",
        }
    }
}

/// A normalised value ready to be stored on a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Count(u32),
}

impl FieldValue {
    /// Whether this value has the shape `field` is stored as.
    pub fn fits(&self, field: Field) -> bool {
        match self {
            FieldValue::List(_) => matches!(field, Field::Occupation | Field::Works | Field::Awards),
            FieldValue::Count(_) => field == Field::Children,
            FieldValue::Text(_) => {
                !matches!(field, Field::Occupation | Field::Works | Field::Awards | Field::Children)
            }
        }
    }
}

/// Normalised data for one article. Produced once, then handed to a sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    pub person_id: String,
    pub name: String,
    pub birth_name: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub occupation: Vec<String>,
    pub spouse: Option<String>,
    pub partner: Option<String>,
    pub children: Option<u32>,
    pub works: Vec<String>,
    pub awards: Vec<String>,
    pub website: Option<String>,
    pub genre: Option<String>,
    pub instrument: Option<String>,
    pub label: Option<String>,
}

impl Record {
    /// Empty record for `title`; `name` starts as the title.
    pub fn new(title: &str) -> Self {
        Record {
            person_id: title.to_string(),
            name: title.to_string(),
            ..Default::default()
        }
    }

    /// Store `value` on `field`. A value of the wrong shape for the field is ignored.
    pub(crate) fn set(&mut self, field: Field, value: FieldValue) {
        if !value.fits(field) {
            warn!(?field, ?value, "value does not fit field, dropped");
            return;
        }
        match (field, value) {
            (Field::Name, FieldValue::Text(v)) => self.name = v,
            (Field::BirthName, FieldValue::Text(v)) => self.birth_name = Some(v),
            (Field::BirthDate, FieldValue::Text(v)) => self.birth_date = Some(v),
            (Field::BirthPlace, FieldValue::Text(v)) => self.birth_place = Some(v),
            (Field::Occupation, FieldValue::List(v)) => self.occupation = v,
            (Field::Spouse, FieldValue::Text(v)) => self.spouse = Some(v),
            (Field::Partner, FieldValue::Text(v)) => self.partner = Some(v),
            (Field::Children, FieldValue::Count(n)) => self.children = Some(n),
            (Field::Works, FieldValue::List(v)) => self.works = v,
            (Field::Awards, FieldValue::List(v)) => self.awards = v,
            (Field::Website, FieldValue::Text(v)) => self.website = Some(v),
            (Field::Genre, FieldValue::Text(v)) => self.genre = Some(v),
            (Field::Instrument, FieldValue::Text(v)) => self.instrument = Some(v),
            (Field::Label, FieldValue::Text(v)) => self.label = Some(v),
            _ => {}
        }
    }

    /// Flat field → value mapping. List fields are joined with `delimiter`;
    /// absent values and empty lists have no entry.
    pub fn to_fields(&self, delimiter: &str) -> BTreeMap<&'static str, String> {
        let mut fields = BTreeMap::new();
        fields.insert("person_id", self.person_id.clone());
        fields.insert(Field::Name.as_str(), self.name.clone());

        let texts = [
            (Field::BirthName, &self.birth_name),
            (Field::BirthDate, &self.birth_date),
            (Field::BirthPlace, &self.birth_place),
            (Field::Spouse, &self.spouse),
            (Field::Partner, &self.partner),
            (Field::Website, &self.website),
            (Field::Genre, &self.genre),
            (Field::Instrument, &self.instrument),
            (Field::Label, &self.label),
        ];
        for (field, value) in texts {
            if let Some(v) = value {
                fields.insert(field.as_str(), v.clone());
            }
        }

        let lists = [
            (Field::Occupation, &self.occupation),
            (Field::Works, &self.works),
            (Field::Awards, &self.awards),
        ];
        for (field, items) in lists {
            if !items.is_empty() {
                fields.insert(field.as_str(), items.join(delimiter));
            }
        }

        if let Some(n) = self.children {
            fields.insert(Field::Children.as_str(), n.to_string());
        }
        fields
    }
}
