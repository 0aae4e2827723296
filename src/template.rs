//! Template variable remapping
//!
//! Analyzer requests may reference template variables (Liquid-style
//! `{{ ... }}` output and `{% ... %}` tag syntax) in their url, headers,
//! and body. The source documents use the IR's own variable names; some
//! backends use a different name for the same binding, so translation
//! rewrites those references. Only whole-token, root-position variable
//! references are rewritten; every other byte of the template passes
//! through unchanged.

/// A variable reference inside a template expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarRef<'a> {
    /// Byte offset of the reference in the template source
    pub start: usize,
    /// The referenced variable name
    pub name: &'a str,
}

/// Words with expression-level meaning that can never be variable
/// references
const KEYWORDS: &[&str] = &[
    "and", "or", "not", "contains", "in", "with", "as", "if", "elsif", "else", "unless", "case",
    "when", "for", "break", "continue", "cycle", "limit", "offset", "reversed", "true", "false",
    "nil", "null", "empty", "blank", "forloop",
];

/// Enumerate every root-position variable reference in the template.
///
/// A word inside an expression is a reference unless it is the tag name,
/// an attribute segment after `.`, a filter name after `|`, an argument
/// name followed by `:`, an assignment target followed by `=`, or a
/// reserved word. String literals, numbers, literal text between
/// expressions, and raw/comment blocks are never references.
pub fn variable_refs(template: &str) -> Vec<VarRef<'_>> {
    let bytes = template.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'{' || (bytes[i + 1] != b'{' && bytes[i + 1] != b'%') {
            i += 1;
            continue;
        }

        let is_tag = bytes[i + 1] == b'%';
        let closer = if is_tag { "%}" } else { "}}" };
        let body_start = i + 2;
        let body_end = template[body_start..]
            .find(closer)
            .map(|offset| body_start + offset)
            .unwrap_or(template.len());

        let tag_name = scan_expression(template, body_start, body_end, is_tag, &mut refs);
        i = (body_end + closer.len()).min(template.len());

        // Raw and comment blocks hold literal text, not expressions
        if is_tag {
            match tag_name {
                Some("raw") => i = find_tag_end(template, i, "endraw"),
                Some("comment") => i = find_tag_end(template, i, "endcomment"),
                _ => {}
            }
        }
    }

    refs
}

/// Rewrite whole-token variable references according to a rename table.
///
/// Replacement runs once, left to right, over the original source
/// offsets, so every unreplaced byte is copied verbatim.
pub fn map_vars(template: &str, varmap: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut cursor = 0;

    for var in variable_refs(template) {
        let Some((_, replacement)) = varmap.iter().find(|(from, _)| *from == var.name) else {
            continue;
        };
        out.push_str(&template[cursor..var.start]);
        out.push_str(replacement);
        cursor = var.start + var.name.len();
    }

    out.push_str(&template[cursor..]);
    out
}

/// Scan one expression region, pushing variable references and returning
/// the leading word (the tag name, for tag regions)
fn scan_expression<'a>(
    template: &'a str,
    start: usize,
    end: usize,
    is_tag: bool,
    refs: &mut Vec<VarRef<'a>>,
) -> Option<&'a str> {
    let bytes = template.as_bytes();
    let mut i = start;
    let mut first_word = None;
    // Last significant byte, with alphanumeric runs collapsed to a marker
    let mut prev = 0u8;

    while i < end {
        let b = bytes[i];

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if b == b'\'' || b == b'"' {
            i += 1;
            while i < end && bytes[i] != b {
                i += 1;
            }
            i = (i + 1).min(end);
            prev = b;
            continue;
        }

        if b.is_ascii_digit() {
            while i < end && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            prev = b'0';
            continue;
        }

        if b.is_ascii_alphabetic() || b == b'_' {
            let word_start = i;
            while i < end && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let word = &template[word_start..i];

            let is_first = first_word.is_none();
            if is_first {
                first_word = Some(word);
            }

            let next = next_significant(bytes, i, end);
            let named_argument = next == Some(b':');
            let assignment_target =
                next == Some(b'=') && next_significant_at(bytes, i, end) != Some(b"==".as_ref());

            let reference = !(is_tag && is_first)
                && prev != b'.'
                && prev != b'|'
                && !named_argument
                && !assignment_target
                && !KEYWORDS.contains(&word);
            if reference {
                refs.push(VarRef {
                    start: word_start,
                    name: word,
                });
            }

            prev = b'w';
            continue;
        }

        prev = b;
        i += 1;
    }

    first_word
}

/// The next non-whitespace byte in the region
fn next_significant(bytes: &[u8], mut i: usize, end: usize) -> Option<u8> {
    while i < end {
        if !bytes[i].is_ascii_whitespace() {
            return Some(bytes[i]);
        }
        i += 1;
    }
    None
}

/// The next two non-whitespace-led bytes, to tell `=` from `==`
fn next_significant_at(bytes: &[u8], mut i: usize, end: usize) -> Option<&[u8]> {
    while i < end {
        if !bytes[i].is_ascii_whitespace() {
            return Some(&bytes[i..(i + 2).min(end)]);
        }
        i += 1;
    }
    None
}

/// Skip forward to just past the named end tag
fn find_tag_end(template: &str, mut i: usize, end_name: &str) -> usize {
    let bytes = template.as_bytes();

    while i + 1 < bytes.len() {
        if bytes[i] != b'{' || bytes[i + 1] != b'%' {
            i += 1;
            continue;
        }

        let body_start = i + 2;
        let body_end = template[body_start..]
            .find("%}")
            .map(|offset| body_start + offset)
            .unwrap_or(template.len());
        let after = (body_end + 2).min(template.len());

        if first_word(template, body_start, body_end) == Some(end_name) {
            return after;
        }
        i = after;
    }

    template.len()
}

/// The leading word of a tag body, past whitespace and trim markers
fn first_word(template: &str, start: usize, end: usize) -> Option<&str> {
    let bytes = template.as_bytes();
    let mut i = start;
    while i < end && (bytes[i].is_ascii_whitespace() || bytes[i] == b'-') {
        i += 1;
    }
    let word_start = i;
    while i < end && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    (i > word_start).then(|| &template[word_start..i])
}
