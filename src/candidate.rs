//! Splitting raw class candidates into variants, a registry root and a
//! modifier.

use crate::registry::Registry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedCandidate {
    /// Variant names as written, outermost first.
    pub variants: Vec<String>,
    pub important: bool,
    /// The class part of the candidate without the `!` marker.
    pub class: String,
    pub root: String,
    pub modifier: String,
    pub negative: bool,
}

/// Splits on `separator` outside `[..]` and `(..)`. The last segment is the
/// class, earlier segments are variants in written order.
pub fn split_variants<'a>(candidate: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return vec![candidate];
    }

    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut idx = 0usize;
    let bytes = candidate.as_bytes();
    while idx < bytes.len() {
        match bytes[idx] {
            b'[' | b'(' => depth += 1,
            b']' | b')' => depth -= 1,
            _ if depth == 0 && bytes[idx..].starts_with(separator.as_bytes()) => {
                parts.push(&candidate[start..idx]);
                idx += separator.len();
                start = idx;
                continue;
            }
            _ => {}
        }
        idx += 1;
    }
    parts.push(&candidate[start..]);
    parts
}

/// `(root, modifier)` splits from the rightmost dash leftward. A candidate
/// ending in `]` first splits in front of its arbitrary value, and only when
/// that value is introduced by `-` or `/`.
pub fn candidate_permutations(candidate: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut end = candidate.len();

    if candidate.ends_with(']') {
        let Some(bracket) = candidate.find('[') else {
            return out;
        };
        if bracket == 0 || !matches!(candidate.as_bytes()[bracket - 1], b'-' | b'/') {
            return out;
        }
        let split = bracket - 1;
        out.push((&candidate[..split], &candidate[split + 1..]));
        end = split;
    }

    while let Some(dash) = candidate[..end].rfind('-') {
        out.push((&candidate[..dash], &candidate[dash + 1..]));
        end = dash;
    }
    out
}

/// Resolves the registry root of a candidate. Returns `None` when no root
/// matches, which means the candidate is not a utility.
pub fn tokenize(
    candidate: &str,
    separator: &str,
    prefix: &str,
    registry: &Registry,
) -> Option<TokenizedCandidate> {
    let mut parts = split_variants(candidate, separator);
    let class_part = parts.pop()?;
    let (important, class) = match class_part.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, class_part),
    };
    if class.is_empty() || parts.iter().any(|variant| variant.is_empty()) {
        return None;
    }
    let variants = parts.iter().map(|variant| variant.to_string()).collect();

    let (root, modifier, negative) = resolve_root(class, prefix, registry)?;
    Some(TokenizedCandidate {
        variants,
        important,
        class: class.to_string(),
        root,
        modifier,
        negative,
    })
}

fn resolve_root(class: &str, prefix: &str, registry: &Registry) -> Option<(String, String, bool)> {
    if registry.has_root(class) {
        return Some((class.to_string(), "DEFAULT".to_string(), false));
    }

    let negative = class.starts_with(prefix) && class[prefix.len()..].starts_with('-');
    let unsigned = if negative {
        format!("{}{}", prefix, &class[prefix.len() + 1..])
    } else {
        class.to_string()
    };

    for (root, modifier) in candidate_permutations(&unsigned) {
        if registry.has_root(root) {
            let modifier = if negative {
                format!("-{}", modifier)
            } else {
                modifier.to_string()
            };
            return Some((root.to_string(), modifier, negative));
        }
    }

    if negative && registry.has_root(&unsigned) {
        return Some((unsigned, "-".to_string(), true));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{candidate_permutations, split_variants, tokenize};
    use crate::config::Config;
    use crate::registry::{CssObject, PluginApi, Registry, RuleOptions};
    use crate::theme::Theme;

    fn registry(prefix: &str, roots: &[&str]) -> Registry {
        let config = Config {
            prefix: prefix.to_string(),
            ..Config::default()
        };
        let theme = Theme::resolve(None).expect("theme should resolve");
        let mut registry = Registry::default();
        let mut api = PluginApi::new(&mut registry, &theme, &config);
        for root in roots {
            api.add_utilities(
                CssObject::rule(format!(".{}", root), CssObject::new().decl("color", "red")),
                RuleOptions::default(),
            );
        }
        registry
    }

    #[test]
    fn splits_variants_outside_brackets() {
        assert_eq!(
            split_variants("hover:lg:bg-[url(a:b)]", ":"),
            vec!["hover", "lg", "bg-[url(a:b)]"]
        );
        assert_eq!(split_variants("md__p-4", "__"), vec!["md", "p-4"]);
    }

    #[test]
    fn permutations_walk_dashes_right_to_left() {
        assert_eq!(
            candidate_permutations("ring-offset-2"),
            vec![("ring-offset", "2"), ("ring", "offset-2")]
        );
        assert_eq!(
            candidate_permutations("bg-red-500/[.35]"),
            vec![
                ("bg-red-500", "[.35]"),
                ("bg-red", "500/[.35]"),
                ("bg", "red-500/[.35]"),
            ]
        );
    }

    #[test]
    fn brackets_without_dash_are_not_dynamic() {
        assert!(candidate_permutations("string[]").is_empty());
        assert_eq!(
            candidate_permutations("top-[13px]"),
            vec![("top", "[13px]")]
        );
    }

    #[test]
    fn tokenizes_negative_and_important() {
        let registry = registry("", &["mt"]);
        let token = tokenize("hover:!-mt-4", ":", "", &registry).expect("mt should match");
        assert_eq!(token.variants, vec!["hover"]);
        assert!(token.important);
        assert!(token.negative);
        assert_eq!(token.class, "-mt-4");
        assert_eq!(token.root, "mt");
        assert_eq!(token.modifier, "-4");
    }

    #[test]
    fn direct_match_wins_and_negative_default() {
        let registry = registry("tw-", &["border", "border-t"]);
        let token = tokenize("tw-border-t", ":", "tw-", &registry).expect("direct match");
        assert_eq!((token.root.as_str(), token.modifier.as_str()), ("tw-border-t", "DEFAULT"));

        let token = tokenize("tw--border", ":", "tw-", &registry).expect("negative default");
        assert_eq!((token.root.as_str(), token.modifier.as_str()), ("tw-border", "-"));

        assert!(tokenize("border", ":", "tw-", &registry).is_none());
    }

    #[test]
    fn unknown_roots_do_not_tokenize() {
        let registry = registry("", &["mt"]);
        assert!(tokenize("hover:unknown-4", ":", "", &registry).is_none());
        assert!(tokenize(":mt-4", ":", "", &registry).is_none());
    }
}
