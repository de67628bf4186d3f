use super::node::{AtRule, Decl, Node, Rule};
use crate::error::{Error, Result};

pub fn parse(css: &str) -> Result<Vec<Node>> {
    let mut parser = Parser { src: css, pos: 0 };
    parser.parse_nodes(false)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_nodes(&mut self, nested: bool) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else {
                if nested {
                    return Err(self.error("Unclosed block"));
                }
                return Ok(nodes);
            };

            if ch == '}' {
                if !nested {
                    return Err(self.error("Unexpected }"));
                }
                self.pos += 1;
                return Ok(nodes);
            }

            if self.src[self.pos..].starts_with("/*") {
                nodes.push(self.parse_comment()?);
                continue;
            }

            if ch == ';' {
                self.pos += 1;
                continue;
            }

            if ch == '@' {
                nodes.push(self.parse_at_rule()?);
                continue;
            }

            nodes.push(self.parse_rule_or_decl()?);
        }
    }

    fn parse_comment(&mut self) -> Result<Node> {
        let start = self.pos + 2;
        let Some(rel_end) = self.src[start..].find("*/") else {
            return Err(self.error("Unclosed comment"));
        };
        let text = self.src[start..start + rel_end].to_string();
        self.pos = start + rel_end + 2;
        Ok(Node::Comment(text))
    }

    fn parse_at_rule(&mut self) -> Result<Node> {
        let name_start = self.pos + 1;
        let mut name_end = name_start;
        for (idx, ch) in self.src[name_start..].char_indices() {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                name_end = name_start + idx + ch.len_utf8();
            } else {
                break;
            }
        }
        if name_end == name_start {
            return Err(self.error("At-rule without name"));
        }
        let name = self.src[name_start..name_end].to_string();
        self.pos = name_end;

        let (terminator, end) = self.scan_until_terminator();
        let params = self.src[self.pos..end].trim().to_string();
        match terminator {
            Some('{') => {
                self.pos = end + 1;
                let nodes = self.parse_nodes(true)?;
                Ok(Node::AtRule(AtRule {
                    name,
                    params,
                    nodes: Some(nodes),
                }))
            }
            Some(';') => {
                self.pos = end + 1;
                Ok(Node::AtRule(AtRule {
                    name,
                    params,
                    nodes: None,
                }))
            }
            _ => {
                self.pos = end;
                Ok(Node::AtRule(AtRule {
                    name,
                    params,
                    nodes: None,
                }))
            }
        }
    }

    fn parse_rule_or_decl(&mut self) -> Result<Node> {
        let start = self.pos;
        let (terminator, end) = self.scan_until_terminator();
        if terminator == Some('{') {
            let selector = self.src[start..end].trim().to_string();
            self.pos = end + 1;
            let nodes = self.parse_nodes(true)?;
            return Ok(Node::Rule(Rule { selector, nodes }));
        }

        let text = &self.src[start..end];
        let Some(colon) = text.find(':') else {
            return Err(self.error(&format!("Unknown word {}", text.trim())));
        };
        self.pos = if terminator == Some(';') { end + 1 } else { end };
        Ok(Node::Decl(parse_decl(&text[..colon], &text[colon + 1..])))
    }

    /// Finds the next `;`, `{` or `}` outside strings, comments, brackets and
    /// parentheses.
    fn scan_until_terminator(&self) -> (Option<char>, usize) {
        let mut paren_depth = 0usize;
        let mut bracket_depth = 0usize;
        let mut quote: Option<char> = None;
        let mut chars = self.src[self.pos..].char_indices().peekable();

        while let Some((rel, ch)) = chars.next() {
            let idx = self.pos + rel;
            if let Some(open) = quote {
                if ch == '\\' {
                    let _ = chars.next();
                } else if ch == open {
                    quote = None;
                }
                continue;
            }
            match ch {
                '\\' => {
                    let _ = chars.next();
                }
                '"' | '\'' => quote = Some(ch),
                '/' => {
                    if matches!(chars.peek(), Some((_, '*'))) {
                        let _ = chars.next();
                        while let Some((_, inner)) = chars.next() {
                            if inner == '*' && matches!(chars.peek(), Some((_, '/'))) {
                                let _ = chars.next();
                                break;
                            }
                        }
                    }
                }
                '(' => paren_depth += 1,
                ')' => paren_depth = paren_depth.saturating_sub(1),
                '[' => bracket_depth += 1,
                ']' => bracket_depth = bracket_depth.saturating_sub(1),
                ';' | '{' | '}' if paren_depth == 0 && bracket_depth == 0 => {
                    return (Some(ch), idx);
                }
                _ => {}
            }
        }

        (None, self.src.len())
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn error(&self, message: &str) -> Error {
        let consumed = &self.src[..self.pos.min(self.src.len())];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rfind('\n')
            .map(|idx| consumed[idx + 1..].chars().count() + 1)
            .unwrap_or_else(|| consumed.chars().count() + 1);
        Error::Parse {
            line,
            column,
            message: message.to_string(),
        }
    }
}

fn parse_decl(prop: &str, value: &str) -> Decl {
    let mut value = value.trim();
    let mut important = false;
    if let Some(bang) = value.rfind('!') {
        let flag = value[bang + 1..].trim();
        if flag.eq_ignore_ascii_case("important") {
            important = true;
            value = value[..bang].trim_end();
        }
    }
    Decl {
        prop: prop.trim().to_string(),
        value: value.to_string(),
        important,
    }
}
