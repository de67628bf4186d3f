//! Built-in variants. Pseudo variants are registered ahead of plugin
//! variants; direction, motion, dark mode and screens come after them, with
//! screens last so every breakpoint owns a higher bit than any other variant.

use crate::config::DarkMode;
use crate::css::{Decl, Node, Rule};
use crate::error::Result;
use crate::registry::{PluginApi, VariantFn, VariantInput};
use crate::selector::{append_to_class, escape_class_name, has_class, prefix_branches, split_top_level_commas};
use crate::theme::Theme;
use std::rc::Rc;

const PSEUDO_ELEMENTS: &[(&str, &str)] = &[
    ("first-letter", "::first-letter"),
    ("first-line", "::first-line"),
    ("placeholder", "::placeholder"),
    ("before", "::before"),
    ("after", "::after"),
];

const PSEUDO_CLASSES: &[(&str, &str)] = &[
    ("first", ":first-child"),
    ("last", ":last-child"),
    ("odd", ":nth-child(odd)"),
    ("even", ":nth-child(even)"),
    ("visited", ":visited"),
    ("checked", ":checked"),
    ("focus-within", ":focus-within"),
    ("hover", ":hover"),
    ("focus", ":focus"),
    ("focus-visible", ":focus-visible"),
    ("active", ":active"),
    ("disabled", ":disabled"),
];

const GROUP_STATES: &[&str] = &["hover", "focus", "focus-within", "active", "disabled"];

const PEER_STATES: &[&str] = &["hover", "focus", "checked", "disabled"];

pub fn register_pseudo_variants(api: &mut PluginApi<'_>) -> Result<()> {
    for (name, pseudo) in PSEUDO_ELEMENTS {
        let with_content = matches!(*name, "before" | "after");
        api.add_variant(name, pseudo_element(pseudo, with_content))?;
    }
    api.add_variant("selection", selection())?;

    for (name, pseudo) in PSEUDO_CLASSES {
        api.add_variant(name, pseudo_class(pseudo))?;
    }

    let group = format!(".{}", escape_class_name(&format!("{}group", api.prefix())));
    for state in GROUP_STATES {
        let pseudo = pseudo_for(state);
        api.add_variant(
            &format!("group-{}", state),
            ancestor(format!("{}{} ", group, pseudo)),
        )?;
    }

    let peer = format!(".{}", escape_class_name(&format!("{}peer", api.prefix())));
    for state in PEER_STATES {
        let pseudo = pseudo_for(state);
        api.add_variant(
            &format!("peer-{}", state),
            ancestor(format!("{}{} ~ ", peer, pseudo)),
        )?;
    }
    Ok(())
}

pub fn register_trailing_variants(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_variant("ltr", ancestor("[dir=\"ltr\"] ".to_string()))?;
    api.add_variant("rtl", ancestor("[dir=\"rtl\"] ".to_string()))?;
    api.add_variant(
        "motion-safe",
        media("(prefers-reduced-motion: no-preference)".to_string()),
    )?;
    api.add_variant(
        "motion-reduce",
        media("(prefers-reduced-motion: reduce)".to_string()),
    )?;

    let dark_mode = api.config().dark_mode;
    match dark_mode {
        DarkMode::Media => api.add_variant("dark", media("(prefers-color-scheme: dark)".to_string()))?,
        DarkMode::Class => {
            let dark = format!(".{} ", escape_class_name(&format!("{}dark", api.prefix())));
            api.add_variant("dark", ancestor(dark))?
        }
        DarkMode::Off => {}
    }

    let screens: Vec<(String, String)> = match api.theme().section("screens") {
        Some(screens) => screens
            .keys()
            .filter_map(|name| Some((name.clone(), screen_query(api.theme(), name)?)))
            .collect(),
        None => Vec::new(),
    };
    for (name, query) in screens {
        api.add_screen_variant(&name, media(query))?;
    }
    Ok(())
}

/// The media query of a `theme.screens` entry: a plain width is a
/// `min-width`, a table may give `min`, `max` or a `raw` query.
pub fn screen_query(theme: &Theme, name: &str) -> Option<String> {
    let value = theme.section("screens")?.get(name)?;
    match value {
        toml::Value::String(width) => Some(format!("(min-width: {})", width)),
        toml::Value::Table(table) => {
            if let Some(toml::Value::String(raw)) = table.get("raw") {
                return Some(raw.clone());
            }
            let min = table.get("min").and_then(toml::Value::as_str);
            let max = table.get("max").and_then(toml::Value::as_str);
            match (min, max) {
                (Some(min), Some(max)) => {
                    Some(format!("(min-width: {}) and (max-width: {})", min, max))
                }
                (Some(min), None) => Some(format!("(min-width: {})", min)),
                (None, Some(max)) => Some(format!("(max-width: {})", max)),
                (None, None) => None,
            }
        }
        _ => None,
    }
}

/// The lower bound of a screen, if it has one.
pub(crate) fn screen_min_width(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(width) => Some(width.clone()),
        toml::Value::Table(table) => table.get("min").and_then(toml::Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn pseudo_for(state: &str) -> String {
    PSEUDO_CLASSES
        .iter()
        .find(|(name, _)| *name == state)
        .map(|(_, pseudo)| pseudo.to_string())
        .unwrap_or_else(|| format!(":{}", state))
}

fn pseudo_class(pseudo: &'static str) -> VariantFn {
    Rc::new(move |input: &VariantInput<'_>| {
        Some(input.node.map_rules(&mut |rule| {
            rule.with_selector(append_to_class(&rule.selector, input.class, pseudo))
        }))
    })
}

/// Appends a pseudo-element to every branch holding the class. `::before`
/// and `::after` only render with a `content` declaration, so one is added
/// when the utility has none.
fn pseudo_element(pseudo: &'static str, with_content: bool) -> VariantFn {
    Rc::new(move |input: &VariantInput<'_>| {
        Some(input.node.map_rules(&mut |rule| {
            let selector = map_class_branches(&rule.selector, input.class, |branch| {
                format!("{}{}", branch, pseudo)
            });
            let mut nodes = rule.nodes.clone();
            let has_content = nodes
                .iter()
                .any(|node| matches!(node, Node::Decl(Decl { prop, .. }) if prop == "content"));
            if with_content && !has_content {
                nodes.insert(0, Node::decl("content", "\"\""));
            }
            Rule { selector, nodes }
        }))
    })
}

/// `selection:` styles the selection of the element and its descendants.
fn selection() -> VariantFn {
    Rc::new(|input: &VariantInput<'_>| {
        Some(input.node.map_rules(&mut |rule| {
            rule.with_selector(map_class_branches(&rule.selector, input.class, |branch| {
                format!("{} *::selection, {}::selection", branch, branch)
            }))
        }))
    })
}

/// Prepends an ancestor (or preceding sibling) selector to every branch.
fn ancestor(prefix: String) -> VariantFn {
    Rc::new(move |input: &VariantInput<'_>| {
        Some(input.node.map_rules(&mut |rule| {
            rule.with_selector(prefix_branches(&rule.selector, &prefix))
        }))
    })
}

fn media(query: String) -> VariantFn {
    Rc::new(move |input: &VariantInput<'_>| Some(input.node.clone().wrap("media", &query)))
}

fn map_class_branches(selector: &str, class: &str, f: impl Fn(&str) -> String) -> String {
    split_top_level_commas(selector)
        .into_iter()
        .map(|branch| {
            if has_class(branch, class) {
                f(branch)
            } else {
                branch.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
