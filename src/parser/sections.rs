use super::blocks::Block;

#[derive(Debug, Clone)]
pub struct Section {
    /// `None` for the lead section before the first heading.
    pub heading: Option<String>,
    pub level: u8,
    pub blocks: Vec<Block>,
}

/// Cluster a flat Vec<Block> into sections, one per heading.
///
/// A section's blocks stop at the next heading of any level, so a
/// subsection's lines never count towards its parent.
pub fn cluster_sections(blocks: &[Block]) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section {
        heading: None,
        level: 0,
        blocks: Vec::new(),
    };

    for block in blocks {
        if let Block::Heading { level, text } = block {
            let next = Section {
                heading: Some(text.clone()),
                level: *level,
                blocks: Vec::new(),
            };
            let done = std::mem::replace(&mut current, next);
            if done.heading.is_some() || !done.blocks.is_empty() {
                sections.push(done);
            }
            continue;
        }
        current.blocks.push(block.clone());
    }

    if current.heading.is_some() || !current.blocks.is_empty() {
        sections.push(current);
    }

    sections
}

impl Section {
    /// Whether the heading is exactly one of `names`.
    pub fn is_named(&self, names: &[String]) -> bool {
        self.heading
            .as_deref()
            .is_some_and(|h| names.iter().any(|n| n == h))
    }

    /// Body text with table scaffolding dropped; list items keep their
    /// bullet so they stay separate lines.
    pub fn body_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Empty => Some(String::new()),
                Block::Text(t) => Some(t.clone()),
                Block::ListItem { depth, text } => Some(format!("{} {}", "*".repeat(*depth as usize), text)),
                Block::Heading { .. } | Block::TableMarkup => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Tests ──
