//! Selector helpers that treat class names as tokens rather than substrings,
//! so `.p-4` never matches inside `.p-4\.5` and escapes survive rewriting.

pub fn escape_class_name(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len() * 2);

    for (idx, ch) in class.chars().enumerate() {
        if ch.is_ascii_digit() && (idx == 0 || (idx == 1 && class.starts_with('-'))) {
            escaped.push_str(&format!("\\{:x} ", ch as u32));
            continue;
        }
        if is_ident_char(ch) {
            escaped.push(ch);
            continue;
        }
        if ch.is_whitespace() {
            escaped.push_str(&format!("\\{:x} ", ch as u32));
            continue;
        }
        escaped.push('\\');
        escaped.push(ch);
    }

    escaped
}

pub fn unescape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut chars = ident.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(next) if next.is_ascii_hexdigit() => {
                    hex.push(*next);
                    let _ = chars.next();
                }
                _ => break,
            }
        }
        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }
        if matches!(chars.peek(), Some(' ')) {
            let _ = chars.next();
        }
        if let Some(decoded) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
            out.push(decoded);
        }
    }

    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassSpan {
    start: usize,
    end: usize,
    name: String,
}

/// Class tokens of a selector. `start` points at the `.`; classes inside
/// attribute selectors and strings are not tokens.
fn class_spans(selector: &str) -> Vec<ClassSpan> {
    let bytes = selector.as_bytes();
    let mut spans = Vec::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut idx = 0usize;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if let Some(open) = quote {
            if byte == b'\\' {
                idx += 2;
                continue;
            }
            if byte == open {
                quote = None;
            }
            idx += 1;
            continue;
        }
        match byte {
            b'\\' => {
                idx += 2;
                continue;
            }
            b'"' | b'\'' => quote = Some(byte),
            b'[' => bracket_depth += 1,
            b']' => bracket_depth = bracket_depth.saturating_sub(1),
            b'.' if bracket_depth == 0 => {
                let end = ident_end(selector, idx + 1);
                if end > idx + 1 {
                    spans.push(ClassSpan {
                        start: idx,
                        end,
                        name: unescape(&selector[idx + 1..end]),
                    });
                    idx = end;
                    continue;
                }
            }
            _ => {}
        }
        idx += 1;
    }

    spans
}

fn ident_end(selector: &str, start: usize) -> usize {
    let mut chars = selector[start..].char_indices().peekable();
    let mut end = start;

    while let Some((rel, ch)) = chars.next() {
        if ch == '\\' {
            let Some((_, next)) = chars.next() else {
                break;
            };
            let mut last = start + rel + 1 + next.len_utf8();
            if next.is_ascii_hexdigit() {
                let mut digits = 1;
                while digits < 6 {
                    match chars.peek() {
                        Some((next_rel, hex)) if hex.is_ascii_hexdigit() => {
                            last = start + next_rel + 1;
                            digits += 1;
                            let _ = chars.next();
                        }
                        _ => break,
                    }
                }
                if let Some((space_rel, ' ')) = chars.peek().copied() {
                    last = start + space_rel + 1;
                    let _ = chars.next();
                }
            }
            end = last;
            continue;
        }
        if is_ident_char(ch) {
            end = start + rel + ch.len_utf8();
            continue;
        }
        break;
    }

    end
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

pub fn extract_classes(selector: &str) -> Vec<String> {
    class_spans(selector)
        .into_iter()
        .map(|span| span.name)
        .collect()
}

pub fn has_class(selector: &str, class: &str) -> bool {
    class_spans(selector).iter().any(|span| span.name == class)
}

/// Replaces every `.from` class token with `.to`.
pub fn rename_class(selector: &str, from: &str, to: &str) -> String {
    rewrite_spans(selector, |span| {
        if span.name == from {
            Some(format!(".{}", escape_class_name(to)))
        } else {
            None
        }
    })
}

/// Inserts `suffix` right after every `.class` token, ahead of any
/// pseudo-element that follows it.
pub fn append_to_class(selector: &str, class: &str, suffix: &str) -> String {
    rewrite_spans(selector, |span| {
        if span.name == class {
            Some(format!(".{}{}", escape_class_name(class), suffix))
        } else {
            None
        }
    })
}

pub fn prefix_classes(selector: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return selector.to_string();
    }
    rewrite_spans(selector, |span| {
        Some(format!(".{}", escape_class_name(&format!("{}{}", prefix, span.name))))
    })
}

/// Prepends `prefix` to every top-level branch of the selector list.
pub fn prefix_branches(selector: &str, prefix: &str) -> String {
    split_top_level_commas(selector)
        .into_iter()
        .map(|branch| format!("{}{}", prefix, branch))
        .collect::<Vec<_>>()
        .join(", ")
}

fn rewrite_spans(selector: &str, mut replace: impl FnMut(&ClassSpan) -> Option<String>) -> String {
    let mut out = String::with_capacity(selector.len() + 16);
    let mut cursor = 0usize;
    for span in class_spans(selector) {
        if let Some(replacement) = replace(&span) {
            out.push_str(&selector[cursor..span.start]);
            out.push_str(&replacement);
            cursor = span.end;
        }
    }
    out.push_str(&selector[cursor..]);
    out
}

/// Substitutes the first `.class` token of `utility` with `target`. When the
/// target ends in a pseudo-element, that pseudo-element is moved behind the
/// pseudo-classes the utility attaches to its class, so `.a::after` with
/// `.hover\:x:hover` becomes `.a:hover::after`. Returns `None` when the
/// utility selector does not contain the class.
pub fn replace_class(utility: &str, class: &str, target: &str) -> Option<String> {
    let span = class_spans(utility)
        .into_iter()
        .find(|span| span.name == class)?;
    let (base, pseudo_element) = split_trailing_pseudo_element(target);

    let mut out = String::with_capacity(utility.len() + target.len());
    out.push_str(&utility[..span.start]);
    out.push_str(base);
    let Some(pseudo_element) = pseudo_element else {
        out.push_str(&utility[span.end..]);
        return Some(out);
    };

    let rest = &utility[span.end..];
    let pseudo_end = pseudo_class_chain_end(rest);
    out.push_str(&rest[..pseudo_end]);
    if !rest[pseudo_end..].starts_with("::") {
        out.push_str(pseudo_element);
    }
    out.push_str(&rest[pseudo_end..]);
    Some(out)
}

fn split_trailing_pseudo_element(selector: &str) -> (&str, Option<&str>) {
    let Some(idx) = selector.rfind("::") else {
        return (selector, None);
    };
    let suffix = &selector[idx..];
    if suffix
        .chars()
        .any(|ch| ch.is_whitespace() || matches!(ch, '>' | '+' | '~' | ',' | ')'))
    {
        return (selector, None);
    }
    (&selector[..idx], Some(suffix))
}

fn pseudo_class_chain_end(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut idx = 0usize;
    while idx < bytes.len() && bytes[idx] == b':' && bytes.get(idx + 1) != Some(&b':') {
        idx = ident_end(rest, idx + 1);
        if bytes.get(idx) == Some(&b'(') {
            let mut depth = 0usize;
            while idx < bytes.len() {
                match bytes[idx] {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            idx += 1;
                            break;
                        }
                    }
                    _ => {}
                }
                idx += 1;
            }
        }
    }
    idx
}

/// Splits on commas that are not nested in parentheses, brackets or strings,
/// so `:is(.a, .b)` stays one branch.
pub fn split_top_level_commas(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0usize;
    for (idx, ch) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(value[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < value.len() {
        parts.push(value[start..].trim());
    }
    parts.retain(|part| !part.is_empty());
    parts
}
