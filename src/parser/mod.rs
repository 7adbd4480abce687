pub mod blocks;
pub mod clean;
pub mod dates;
pub mod extract;
pub mod fields;
pub mod relations;
pub mod sections;
pub mod template;

use crate::dump::Page;
use crate::record::Record;
use extract::ExtractConfig;

/// Markup → infobox + sections → normalised record.
/// `None` when the article has no person infobox.
pub fn extract(title: &str, markup: &str, config: &ExtractConfig) -> Option<Record> {
    extract::extract_record(title, markup, config)
}

pub fn process_page(page: &Page, config: &ExtractConfig) -> Option<Record> {
    extract(&page.title, &page.text, config)
}
