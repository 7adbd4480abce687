use tracing::debug;

use crate::parser::fields::normalize_key;
use crate::parser::template::{top_level_templates, Template};

/// Raw parameters of a person infobox and the `Infobox …` modules embedded
/// in its values. The primary infobox comes first.
#[derive(Debug, Clone)]
pub struct Infobox {
    pub subject: String,
    sources: Vec<Vec<(String, String)>>,
}

impl Infobox {
    /// First top-level infobox whose subject type is one of `person_types`.
    pub fn locate(markup: &str, person_types: &[String]) -> Option<Infobox> {
        let (primary, subject) = top_level_templates(markup).into_iter().find_map(|t| {
            let subject = infobox_subject(&t.name)?;
            person_types
                .iter()
                .any(|p| p.to_lowercase() == subject)
                .then_some((t, subject))
        })?;

        let mut sources = vec![named_params(&primary)];
        for param in &primary.params {
            for module in top_level_templates(&param.value) {
                if let Some(module_subject) = infobox_subject(&module.name) {
                    debug!(subject = %subject, module = %module_subject, "found infobox module");
                    sources.push(named_params(&module));
                }
            }
        }

        Some(Infobox { subject, sources })
    }

    /// Raw values whose key is one of `keys`, grouped per source.
    pub fn values_by_source(&self, keys: &[&str]) -> Vec<Vec<&str>> {
        self.sources
            .iter()
            .map(|params| {
                params
                    .iter()
                    .filter(|(k, _)| keys.contains(&k.as_str()))
                    .map(|(_, v)| v.as_str())
                    .collect::<Vec<_>>()
            })
            .filter(|values| !values.is_empty())
            .collect()
    }
}

/// `Infobox musical artist` → `musical artist`. The head token is case-sensitive.
fn infobox_subject(name: &str) -> Option<String> {
    let rest = name.trim().strip_prefix("Infobox")?;
    if !rest.starts_with([' ', '_']) {
        return None;
    }
    let subject = rest
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if subject.is_empty() {
        None
    } else {
        Some(subject)
    }
}

fn named_params(t: &Template) -> Vec<(String, String)> {
    t.params
        .iter()
        .filter_map(|p| p.key.as_deref().map(|k| (normalize_key(k), p.value.clone())))
        .collect()
}
