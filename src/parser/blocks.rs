use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(={1,6})\s*(.*?)\s*(={1,6})\s*$").unwrap());
static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([*#]+)\s*(.*)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    ListItem { depth: u8, text: String },
    /// Table scaffolding (`{|`, `|-`, `|}`, `|+`, header rows); carries no content.
    TableMarkup,
    Text(String),
    Empty,
}

pub fn classify_lines(markup: &str) -> Vec<Block> {
    if markup.trim().is_empty() {
        return vec![Block::Empty];
    }

    markup.lines().map(classify_line).collect()
}

fn classify_line(raw: &str) -> Block {
    let line = raw.trim();

    if line.is_empty() {
        return Block::Empty;
    }

    // ── Heading: == text == ──
    if let Some(caps) = HEADING_RE.captures(line) {
        let level = caps[1].len().min(caps[3].len());
        let text = caps[2].to_string();
        if !text.is_empty() {
            return Block::Heading {
                level: level as u8,
                text,
            };
        }
    }

    // ── Bulleted / numbered item ──
    if let Some(caps) = LIST_ITEM_RE.captures(line) {
        return Block::ListItem {
            depth: caps[1].len() as u8,
            text: caps[2].to_string(),
        };
    }

    // ── Table scaffolding ──
    if line.starts_with("{|")
        || line.starts_with("|}")
        || line.starts_with("|-")
        || line.starts_with("|+")
        || line.starts_with('!')
    {
        return Block::TableMarkup;
    }

    Block::Text(line.to_string())
}
