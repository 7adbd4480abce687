use crate::parser::clean::{clean_text, strip_refs, unwrap_wrapper};
use crate::parser::sections::Section;
use crate::parser::template::expand_templates;

/// Items from every section headed by one of `headings`, in source order.
/// Each non-empty body line is one item.
pub fn section_list(sections: &[Section], headings: &[String]) -> Vec<String> {
    sections
        .iter()
        .filter(|s| s.is_named(headings))
        .flat_map(section_items)
        .collect()
}

fn section_items(section: &Section) -> Vec<String> {
    // Multi-line templates and refs must go before the body is split into lines.
    let body = expand_templates(&strip_refs(&section.body_text()), unwrap_wrapper);
    body.lines().filter_map(clean_text).collect()
}
