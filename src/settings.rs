use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;

use crate::parser::extract::{
    to_strings, ExtractConfig, DEFAULT_AWARD_HEADINGS, DEFAULT_INFOBOX_TYPES,
    DEFAULT_WORKS_HEADINGS,
};
use crate::parser::relations::ChildrenPolicy;

/// Optional settings file in the working directory (`wiki_people.toml`).
const CONFIG_FILE: &str = "wiki_people";
const ENV_PREFIX: &str = "WIKI_PEOPLE";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    /// Pages extracted in parallel and saved per transaction.
    pub batch_size: usize,
    /// Joins list fields in flat output.
    pub list_delimiter: String,
    pub children_policy: ChildrenPolicy,
    /// Skip pages outside namespace 0 (talk pages, templates, ...).
    pub main_namespace_only: bool,
    pub award_headings: Vec<String>,
    pub works_headings: Vec<String>,
    pub infobox_types: Vec<String>,
}

impl Settings {
    /// Defaults, then `wiki_people.toml` if present, then `WIKI_PEOPLE_*` env vars.
    /// List settings read from the environment are comma separated.
    pub fn load() -> Result<Settings> {
        defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(environment())
            .build()
            .context("reading configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            infobox_types: self.infobox_types.clone(),
            award_headings: self.award_headings.clone(),
            works_headings: self.works_headings.clone(),
            children_policy: self.children_policy,
            ..ExtractConfig::default()
        }
    }
}

#[cfg(test)]
impl Default for Settings {
    fn default() -> Self {
        defaults()
            .and_then(|b| Ok(b.build()?.try_deserialize()?))
            .unwrap()
    }
}

const LIST_KEYS: &[&str] = &["award_headings", "works_headings", "infobox_types"];

fn environment() -> Environment {
    LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX).try_parsing(true).list_separator(","),
        |env, key| env.with_list_parse_key(key),
    )
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    let builder = Config::builder()
        .set_default("db_path", "data/people.sqlite")?
        .set_default("batch_size", 500_i64)?
        .set_default("list_delimiter", "; ")?
        .set_default("children_policy", "null")?
        .set_default("main_namespace_only", true)?
        .set_default("award_headings", to_strings(DEFAULT_AWARD_HEADINGS))?
        .set_default("works_headings", to_strings(DEFAULT_WORKS_HEADINGS))?
        .set_default("infobox_types", to_strings(DEFAULT_INFOBOX_TYPES))?;
    Ok(builder)
}
