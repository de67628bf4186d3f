//! Stylesheet assembly: directives in, finished CSS out.

use crate::apply::expand_apply;
use crate::config::{Config, Important};
use crate::context::{Context, ContextStore, LayerBlock};
use crate::css::{self, AtRule, Decl, Node};
use crate::error::{Error, Result};
use crate::plugins::variants::screen_query;
use crate::registry::Plugin;
use crate::resolve::ResolvedRule;
use crate::selector::prefix_branches;
use crate::sort::{Layer, SortKey};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Bucket {
    Base,
    Components,
    Utilities,
    Screens,
}

impl Bucket {
    fn from_directive(params: &str) -> Option<Bucket> {
        match params.trim() {
            "base" => Some(Bucket::Base),
            "components" => Some(Bucket::Components),
            "utilities" => Some(Bucket::Utilities),
            "screens" | "variants" => Some(Bucket::Screens),
            _ => None,
        }
    }
}

/// Builds the stylesheet `css` for the given candidates.
pub fn build_css<S: AsRef<str>>(
    css: &str,
    candidates: impl IntoIterator<Item = S>,
    store: &mut ContextStore,
    source_key: &str,
    config: &Config,
    minify: bool,
) -> Result<String> {
    build_css_with(css, candidates, store, source_key, config, &[], minify)
}

/// Like [`build_css`], with extra plugins registered after the core ones.
/// Plugins are not part of the configuration hash; a store should only
/// ever see one plugin set per configuration.
pub fn build_css_with<S: AsRef<str>>(
    css: &str,
    candidates: impl IntoIterator<Item = S>,
    store: &mut ContextStore,
    source_key: &str,
    config: &Config,
    plugins: &[Plugin],
    minify: bool,
) -> Result<String> {
    let root = css::parse(css)?;
    let (root, layers) = extract_layers(root)?;
    let layer_source: String = layers
        .iter()
        .map(|(layer, nodes)| format!("{}:{}", layer.name(), css::to_css(nodes, true)))
        .collect();

    let context = store.get_or_create(source_key, config.hash_with(&layer_source), || {
        Context::with_plugins(config.clone(), &layers, plugins)
    })?;
    let mut context = context.borrow_mut();

    let mut seen = HashSet::new();
    let mut ordered: Vec<String> = vec!["*".to_string()];
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate != "*" && seen.insert(candidate.to_string()) {
            ordered.push(candidate.to_string());
        }
    }
    let rules = context.generate_rules(ordered.iter().map(String::as_str));
    tracing::debug!(
        candidates = ordered.len(),
        rules = rules.len(),
        cached = context.class_cache_len(),
        "generated rules"
    );

    let root = insert_buckets(root, rules, &context);
    let root = expand_apply(root, &mut context)?;
    let root = substitute_screens(root, &context);
    let root = collapse_adjacent_rules(root);
    Ok(css::to_css(&root, minify))
}

/// Pulls `@layer`, `@responsive` and `@variants` blocks out of the root.
/// Their contents become layer plugins of the context.
fn extract_layers(root: Vec<Node>) -> Result<(Vec<Node>, Vec<LayerBlock>)> {
    let directives: HashSet<Bucket> = root
        .iter()
        .filter_map(|node| match node {
            Node::AtRule(at) if at.name == "tailwind" => Bucket::from_directive(&at.params),
            _ => None,
        })
        .collect();

    let mut kept = Vec::with_capacity(root.len());
    let mut layers: Vec<LayerBlock> = Vec::new();
    for node in root {
        let Node::AtRule(at) = node else {
            kept.push(node);
            continue;
        };
        let layer = match at.name.as_str() {
            "layer" => Layer::parse(at.params.trim()),
            "responsive" | "variants" => Some(Layer::Utilities),
            _ => None,
        };
        let (Some(layer), Some(children)) = (layer, at.nodes.clone()) else {
            kept.push(Node::AtRule(at));
            continue;
        };

        let bucket = match layer {
            Layer::Base => Bucket::Base,
            Layer::Components => Bucket::Components,
            Layer::Utilities | Layer::User => Bucket::Utilities,
        };
        if !directives.contains(&bucket) {
            return Err(Error::MissingTailwindDirective {
                directive: at.name.clone(),
                layer: layer.name().to_string(),
            });
        }
        layers.push((layer, unwrap_legacy_variants(children)));
    }
    Ok((kept, layers))
}

fn unwrap_legacy_variants(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::AtRule(AtRule {
                name,
                nodes: Some(children),
                ..
            }) if name == "responsive" || name == "variants" => {
                out.extend(unwrap_legacy_variants(children))
            }
            other => out.push(other),
        }
    }
    out
}

fn insert_buckets(root: Vec<Node>, rules: Vec<ResolvedRule>, context: &Context) -> Vec<Node> {
    let mut base = Vec::new();
    let mut components = Vec::new();
    let mut utilities = Vec::new();
    let mut screens = Vec::new();
    for rule in rules {
        let sort = rule.meta.sort;
        let node = with_important_config(rule, &context.config().important);
        let bucket = if context.registry().is_screen_mask(sort.variants) {
            &mut screens
        } else {
            match sort.layer {
                Layer::Base => &mut base,
                Layer::Components => &mut components,
                Layer::Utilities | Layer::User => &mut utilities,
            }
        };
        bucket.push((sort, node));
    }

    let mut buckets = [
        (Bucket::Base, sorted(base)),
        (Bucket::Components, sorted(components)),
        (Bucket::Utilities, sorted(utilities)),
        (Bucket::Screens, sorted(screens)),
    ];

    let mut out = Vec::with_capacity(root.len());
    let mut screens_placed = false;
    for node in root {
        let directive = match &node {
            Node::AtRule(at) if at.name == "tailwind" => Bucket::from_directive(&at.params),
            _ => None,
        };
        let Some(directive) = directive else {
            out.push(node);
            continue;
        };
        if directive == Bucket::Screens {
            screens_placed = true;
        }
        if let Some((_, nodes)) = buckets.iter_mut().find(|(bucket, _)| *bucket == directive) {
            out.append(nodes);
        }
    }
    if !screens_placed {
        out.append(&mut buckets[3].1);
    }
    out
}

fn sorted(mut rules: Vec<(SortKey, Node)>) -> Vec<Node> {
    rules.sort_by(|(a, _), (b, _)| a.cmp(b));
    rules.into_iter().map(|(_, node)| node).collect()
}

/// The configured `important` mode, applied to rules that respect it.
fn with_important_config(rule: ResolvedRule, important: &Important) -> Node {
    if !rule.meta.options.respect_important {
        return rule.node;
    }
    match important {
        Important::Flag(true) => rule.node.map_decls(&mut |decl| Decl {
            important: true,
            ..decl.clone()
        }),
        Important::Selector(scope) if !scope.is_empty() => rule.node.map_rules(&mut |rule| {
            rule.with_selector(prefix_branches(&rule.selector, &format!("{} ", scope)))
        }),
        _ => rule.node,
    }
}

/// `@screen md { .. }` becomes the media query of the `md` screen.
fn substitute_screens(nodes: Vec<Node>, context: &Context) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::AtRule(AtRule {
                name,
                params,
                nodes: Some(children),
            }) => {
                let children = substitute_screens(children, context);
                if name == "screen" {
                    if let Some(query) = screen_query(context.theme(), params.trim()) {
                        return Node::at_rule("media", query, children);
                    }
                }
                Node::AtRule(AtRule {
                    name,
                    params,
                    nodes: Some(children),
                })
            }
            other => other,
        })
        .collect()
}

/// Merges adjacent top-level rules with the same selector, and adjacent
/// at-rules with the same name and parameters. `@font-face` blocks are
/// never merged.
pub fn collapse_adjacent_rules(root: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(root.len());
    for node in root {
        let merged = match (out.last_mut(), &node) {
            (Some(Node::Rule(current)), Node::Rule(next))
                if normalize(&current.selector) == normalize(&next.selector) =>
            {
                current.nodes.extend(next.nodes.iter().cloned());
                true
            }
            (
                Some(Node::AtRule(AtRule {
                    name,
                    params,
                    nodes: Some(children),
                })),
                Node::AtRule(AtRule {
                    name: next_name,
                    params: next_params,
                    nodes: Some(next_children),
                }),
            ) if name.as_str() != "font-face"
                && name.as_str() == next_name.as_str()
                && normalize(params) == normalize(next_params) =>
            {
                children.extend(next_children.iter().cloned());
                true
            }
            _ => false,
        };
        if !merged {
            out.push(node);
        }
    }
    out
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
