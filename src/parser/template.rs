use std::ops::Range;

/// Passes of wrapper unwrapping before every remaining template is dropped.
const MAX_EXPAND_PASSES: usize = 8;

/// One `{{name|positional|key=value}}` invocation found in markup.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub key: Option<String>,
    pub value: String,
}

impl Template {
    /// Lower-cased name with underscores read as spaces and whitespace collapsed.
    pub fn normalized_name(&self) -> String {
        self.name
            .replace('_', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.key.is_none())
            .map(|p| p.value.as_str())
    }
}

/// All templates at nesting depth zero, in source order.
///
/// A `{{` without a matching `}}` is plain text; scanning resumes after it.
pub fn top_level_templates(text: &str) -> Vec<Template> {
    let mut templates = Vec::new();
    let mut i = 0;
    while let Some(rel) = text[i..].find("{{") {
        let start = i + rel;
        let Some(end) = find_close(text, start) else {
            i = start + 2;
            continue;
        };
        if let Some(t) = parse_template(text, start..end) {
            templates.push(t);
        }
        i = end;
    }
    templates
}

/// Replace every top-level template with `handler`'s output, or drop it when
/// the handler returns `None`. An unclosed `{{` is kept as text.
pub fn rewrite_templates<F>(text: &str, handler: F) -> String
where
    F: Fn(&Template) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while let Some(rel) = text[i..].find("{{") {
        let start = i + rel;
        out.push_str(&text[i..start]);
        let Some(end) = find_close(text, start) else {
            out.push_str("{{");
            i = start + 2;
            continue;
        };
        if let Some(replacement) = parse_template(text, start..end).and_then(|t| handler(&t)) {
            out.push_str(&replacement);
        }
        i = end;
    }
    out.push_str(&text[i..]);
    out
}

/// Repeatedly rewrite templates so that wrappers nested inside wrappers are
/// unwrapped too, then drop whatever templates survive.
pub fn expand_templates<F>(text: &str, handler: F) -> String
where
    F: Fn(&Template) -> Option<String>,
{
    let mut current = text.to_string();
    for _ in 0..MAX_EXPAND_PASSES {
        let next = rewrite_templates(&current, &handler);
        if next == current {
            return current;
        }
        current = next;
    }
    rewrite_templates(&current, |_| None)
}

/// Byte index just past the `}}` closing the template opened at `open`.
pub fn find_close(text: &str, open: usize) -> Option<usize> {
    let b = text.as_bytes();
    if !b.get(open..)?.starts_with(b"{{") {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i + 1 < b.len() {
        if b[i] == b'{' && b[i + 1] == b'{' {
            depth += 1;
            i += 2;
        } else if b[i] == b'}' && b[i + 1] == b'}' {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return Some(i);
            }
        } else {
            i += 1;
        }
    }
    None
}

fn parse_template(text: &str, span: Range<usize>) -> Option<Template> {
    let inner = text.get(span.start + 2..span.end - 2)?;
    let mut pieces = split_top_level(inner, b'|').into_iter();
    let name = pieces.next()?.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let params = pieces
        .map(|piece| match first_top_level(piece, b'=') {
            Some(eq) if is_param_key(&piece[..eq]) => Param {
                key: Some(piece[..eq].trim().to_string()),
                value: piece[eq + 1..].trim().to_string(),
            },
            _ => Param {
                key: None,
                value: piece.trim().to_string(),
            },
        })
        .collect();

    Some(Template { name, params })
}

fn is_param_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !key.contains(['<', '\n', '[', '{'])
}

/// Split on `sep` where it is outside nested `{{…}}` and `[[…]]`.
pub fn split_top_level(s: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for pos in top_level_positions(s, sep) {
        parts.push(&s[last..pos]);
        last = pos + 1;
    }
    parts.push(&s[last..]);
    parts
}

fn first_top_level(s: &str, sep: u8) -> Option<usize> {
    top_level_positions(s, sep).into_iter().next()
}

fn top_level_positions(s: &str, sep: u8) -> Vec<usize> {
    let b = s.as_bytes();
    let mut positions = Vec::new();
    let (mut braces, mut links) = (0usize, 0usize);
    let mut i = 0;
    while i < b.len() {
        let pair = b.get(i..i + 2);
        match pair {
            Some(b"{{") => {
                braces += 1;
                i += 2;
                continue;
            }
            Some(b"}}") if braces > 0 => {
                braces -= 1;
                i += 2;
                continue;
            }
            Some(b"[[") if link_closes(b, i) => {
                links += 1;
                i += 2;
                continue;
            }
            Some(b"]]") if links > 0 => {
                links -= 1;
                i += 2;
                continue;
            }
            _ => {}
        }
        if b[i] == sep && braces == 0 && links == 0 {
            positions.push(i);
        }
        i += 1;
    }
    positions
}

/// Whether the `[[` at `open` is closed before the next line that starts a
/// new `|` parameter. An unclosed link must not hide later separators.
fn link_closes(b: &[u8], open: usize) -> bool {
    let mut i = open + 2;
    while i < b.len() {
        if b[i..].starts_with(b"]]") {
            return true;
        }
        if b[i] == b'\n' {
            let next = b[i + 1..].iter().find(|c| !matches!(c, b' ' | b'\t'));
            if next == Some(&b'|') {
                return false;
            }
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_positional_params() {
        let t = &top_level_templates("{{marriage|Jane Doe|2001|end=div}}")[0];
        assert_eq!(t.name, "marriage");
        assert_eq!(t.positional().collect::<Vec<_>>(), vec!["Jane Doe", "2001"]);
        assert_eq!(t.params[2].key.as_deref(), Some("end"));
        assert_eq!(t.params[2].value, "div");
    }

    #[test]
    fn nested_templates_do_not_split_params() {
        let md = "{{Infobox person\n| name = A\n| spouse = {{marriage|B|2001|2010}}\n| birth_place = [[Paris|City of Light]]\n}}";
        let t = &top_level_templates(md)[0];
        assert_eq!(t.name, "Infobox person");
        assert_eq!(t.params.len(), 3);
        assert_eq!(t.params[1].value, "{{marriage|B|2001|2010}}");
        assert_eq!(t.params[2].value, "[[Paris|City of Light]]");
    }

    #[test]
    fn only_top_level_templates_returned() {
        let templates = top_level_templates("a {{outer|{{inner}}}} b {{second}}");
        let names: Vec<&str> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "second"]);
    }

    #[test]
    fn unclosed_template_is_ignored() {
        assert!(top_level_templates("{{Infobox person|name=X").is_empty());
        assert_eq!(top_level_templates("{{ok}} {{broken|").len(), 1);
    }

    #[test]
    fn stray_open_before_template() {
        let md = "{{Use dmy dates|date=May 2020\n{{Infobox person\n| name = Ada\n}} tail";
        let names: Vec<String> = top_level_templates(md).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Infobox person"]);

        let out = rewrite_templates("a {{b {{keep|x}} c", |t| t.positional().next().map(str::to_string));
        assert_eq!(out, "a {{b x c");
    }

    #[test]
    fn unclosed_link_does_not_swallow_params() {
        let md = "{{Infobox person\n| birth_place = [[Leeds\n| occupation = [[Singer|singer]]\n| children = 2\n}}";
        let t = &top_level_templates(md)[0];
        let keys: Vec<&str> = t.params.iter().filter_map(|p| p.key.as_deref()).collect();
        assert_eq!(keys, vec!["birth_place", "occupation", "children"]);
        assert_eq!(t.params[0].value, "[[Leeds");
        assert_eq!(t.params[1].value, "[[Singer|singer]]");
    }

    #[test]
    fn rewrite_drops_unhandled() {
        let out = rewrite_templates("born {{circa}} 1920 {{keep|me}}", |t| {
            (t.name == "keep").then(|| t.positional().collect::<String>())
        });
        assert_eq!(out, "born  1920 me");
    }

    #[test]
    fn expand_unwraps_nested_wrappers() {
        let out = expand_templates("{{hlist|{{nowrap|Actor}}|Singer{{efn|note}}}}", |t| {
            match t.name.as_str() {
                "hlist" | "nowrap" => Some(t.positional().collect::<Vec<_>>().join("|")),
                _ => None,
            }
        });
        assert_eq!(out, "Actor|Singer");
    }

    #[test]
    fn normalized_name() {
        let t = &top_level_templates("{{Birth_date  and age|1955|3|9}}")[0];
        assert_eq!(t.normalized_name(), "birth date and age");
    }
}
