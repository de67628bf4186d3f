//! `@apply` expansion: inlines resolved utility rules under custom selectors.

use crate::context::Context;
use crate::css::{AtRule, Decl, Node, Rule};
use crate::error::{Error, Result};
use crate::resolve::ResolvedRule;
use crate::selector::{extract_classes, replace_class, split_top_level_commas};
use crate::sort::SortKey;

const MAX_PASSES: usize = 100;

/// Expands every `@apply` in `root` until none is left.
pub fn expand_apply(root: Vec<Node>, context: &mut Context) -> Result<Vec<Node>> {
    let mut root = partition_apply_parents(root);
    let mut previous: Option<Vec<String>> = None;

    for pass in 0..MAX_PASSES {
        let mut applies = Vec::new();
        collect_applies(&root, None, &mut applies);
        if applies.is_empty() {
            return Ok(root);
        }
        if previous.as_ref() == Some(&applies) {
            return Err(Error::ApplyDidNotConverge { passes: pass });
        }
        tracing::debug!(pass, applies = applies.len(), "expanding @apply");

        root = expand_pass(root, context)?;
        previous = Some(applies);
    }

    Err(Error::ApplyDidNotConverge { passes: MAX_PASSES })
}

/// A rule mixing `@apply` with other nodes is split into sibling rules, one
/// per `@apply` and one per run of other nodes, in source order.
pub fn partition_apply_parents(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Rule(rule) if rule.nodes.iter().any(is_apply) => {
                let mut groups: Vec<Vec<Node>> = Vec::new();
                let mut run: Vec<Node> = Vec::new();
                for child in rule.nodes {
                    if is_apply(&child) {
                        if !run.is_empty() {
                            groups.push(std::mem::take(&mut run));
                        }
                        groups.push(vec![child]);
                    } else {
                        run.push(child);
                    }
                }
                if !run.is_empty() {
                    groups.push(run);
                }
                out.extend(groups.into_iter().map(|nodes| {
                    Node::Rule(Rule {
                        selector: rule.selector.clone(),
                        nodes,
                    })
                }));
            }
            Node::AtRule(AtRule {
                name,
                params,
                nodes: Some(children),
            }) => out.push(Node::AtRule(AtRule {
                name,
                params,
                nodes: Some(partition_apply_parents(children)),
            })),
            other => out.push(other),
        }
    }
    out
}

/// `@apply a b !important` -> (["a", "b"], true)
pub fn extract_apply_candidates(params: &str) -> (Vec<&str>, bool) {
    let mut candidates: Vec<&str> = params.split_whitespace().collect();
    if candidates.last() == Some(&"!important") {
        candidates.pop();
        return (candidates, true);
    }
    (candidates, false)
}

fn is_apply(node: &Node) -> bool {
    node.is_at_rule("apply")
}

fn collect_applies(nodes: &[Node], parent: Option<&str>, out: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::AtRule(at) if at.name == "apply" => {
                out.push(format!("{}|{}", parent.unwrap_or(""), at.params));
            }
            Node::Rule(rule) => collect_applies(&rule.nodes, Some(&rule.selector), out),
            Node::AtRule(at) => {
                let label = format!("@{} {}", at.name, at.params);
                collect_applies(node.children(), Some(&label), out);
            }
            _ => {}
        }
    }
}

fn expand_pass(nodes: Vec<Node>, context: &mut Context) -> Result<Vec<Node>> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Rule(rule) if rule.nodes.iter().any(is_apply) => {
                let siblings = expand_rule(&rule, context)?;
                let remaining: Vec<Node> = rule
                    .nodes
                    .into_iter()
                    .filter(|child| !is_apply(child))
                    .collect();
                if !remaining.is_empty() {
                    out.push(Node::Rule(Rule {
                        selector: rule.selector,
                        nodes: remaining,
                    }));
                }
                out.extend(siblings);
            }
            Node::AtRule(AtRule {
                name,
                params,
                nodes: Some(children),
            }) => {
                if let Some(apply) = children.iter().find(|child| is_apply(child)) {
                    return Err(nested_apply_error(&name, &params, apply, context));
                }
                out.push(Node::AtRule(AtRule {
                    name,
                    params,
                    nodes: Some(expand_pass(children, context)?),
                }));
            }
            Node::AtRule(at) if at.name == "apply" => {
                let (candidates, _) = extract_apply_candidates(&at.params);
                for candidate in candidates {
                    if context.resolve_for_apply(candidate).is_none() {
                        return Err(Error::UnknownApplyCandidate {
                            candidate: candidate.to_string(),
                        });
                    }
                }
                return Err(Error::ApplyOutsideRule {
                    params: at.params.trim().to_string(),
                });
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn nested_apply_error(name: &str, params: &str, apply: &Node, context: &Context) -> Error {
    if name != "screen" {
        return Error::ApplyInAtRule {
            name: name.to_string(),
        };
    }
    let Node::AtRule(apply) = apply else {
        return Error::ApplyInAtRule {
            name: name.to_string(),
        };
    };
    let (candidates, _) = extract_apply_candidates(&apply.params);
    let suggestion = candidates
        .iter()
        .map(|candidate| format!("{}{}{}", params.trim(), context.config().separator, candidate))
        .collect::<Vec<_>>()
        .join(" ");
    Error::ApplyInScreen { suggestion }
}

/// The sibling rules produced by the `@apply` children of `parent`, sorted.
fn expand_rule(parent: &Rule, context: &mut Context) -> Result<Vec<Node>> {
    let parent_classes = extract_classes(&parent.selector);
    let separator = context.config().separator.clone();
    let group = format!("{}group", context.config().prefix);
    let mut siblings: Vec<(SortKey, Node)> = Vec::new();

    for child in &parent.nodes {
        let Node::AtRule(apply) = child else {
            continue;
        };
        if apply.name != "apply" {
            continue;
        }
        let (candidates, important) = extract_apply_candidates(&apply.params);
        for candidate in candidates {
            let Some(rules) = context.resolve_for_apply(candidate) else {
                if candidate == group {
                    return Err(Error::ApplyGroupUtility {
                        candidate: candidate.to_string(),
                    });
                }
                return Err(Error::UnknownApplyCandidate {
                    candidate: candidate.to_string(),
                });
            };

            for resolved in rules.iter() {
                check_circular(&parent_classes, resolved, candidate, &separator)?;
                let node = rewrite(&resolved.node, &parent.selector, candidate, |decl| Decl {
                    important: resolved.meta.important || important,
                    ..decl.clone()
                });
                siblings.push((resolved.meta.sort, node));
            }
        }
    }

    siblings.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(siblings.into_iter().map(|(_, node)| node).collect())
}

fn check_circular(
    parent_classes: &[String],
    resolved: &ResolvedRule,
    candidate: &str,
    separator: &str,
) -> Result<()> {
    let mut node_classes: Vec<String> = Vec::new();
    for selector in resolved.node.selectors() {
        node_classes.extend(extract_classes(selector));
    }
    let bases: Vec<String> = node_classes
        .iter()
        .filter_map(|class| class.rsplit(separator).next())
        .map(str::to_string)
        .collect();
    node_classes.extend(bases);

    if parent_classes
        .iter()
        .any(|class| node_classes.contains(class))
    {
        return Err(Error::CircularApply {
            candidate: candidate.to_string(),
        });
    }
    Ok(())
}

fn rewrite(
    node: &Node,
    parent_selector: &str,
    candidate: &str,
    mut mark: impl FnMut(&Decl) -> Decl,
) -> Node {
    node.map_rules(&mut |rule| Rule {
        selector: replace_selector(parent_selector, &rule.selector, candidate),
        nodes: rule
            .nodes
            .iter()
            .map(|child| match child {
                Node::Decl(decl) => Node::Decl(mark(decl)),
                other => other.clone(),
            })
            .collect(),
    })
}

/// Substitutes every parent branch for the candidate's class in every
/// utility branch that contains it.
fn replace_selector(parent_selector: &str, utility_selector: &str, candidate: &str) -> String {
    let utility_branches = split_top_level_commas(utility_selector);
    let mut replaced = Vec::new();
    for parent_branch in split_top_level_commas(parent_selector) {
        for utility_branch in &utility_branches {
            if let Some(branch) = replace_class(utility_branch, candidate, parent_branch) {
                replaced.push(branch);
            }
        }
    }
    if replaced.is_empty() {
        return utility_selector.to_string();
    }
    replaced.join(", ")
}

#[cfg(test)]
mod tests {
    use super::{expand_apply, extract_apply_candidates, partition_apply_parents};
    use crate::config::Config;
    use crate::context::Context;
    use crate::css::{parse, to_css};
    use crate::error::Error;

    fn expand(css: &str) -> crate::error::Result<String> {
        let mut context = Context::new(Config::default(), &[]).expect("context should build");
        let root = parse(css).expect("css should parse");
        expand_apply(root, &mut context).map(|nodes| to_css(&nodes, true))
    }

    #[test]
    fn splits_mixed_parents_in_order() {
        let root = parse(".a { color: red; @apply p-4; margin: 0; padding: 0 }")
            .expect("css should parse");
        let css = to_css(&partition_apply_parents(root), true);
        assert_eq!(css, ".a{color:red}.a{@apply p-4;}.a{margin:0;padding:0}");
    }

    #[test]
    fn reads_trailing_important() {
        assert_eq!(
            extract_apply_candidates("font-bold  p-4 !important"),
            (vec!["font-bold", "p-4"], true)
        );
        assert_eq!(extract_apply_candidates("font-bold"), (vec!["font-bold"], false));
    }

    #[test]
    fn inlines_utilities_under_parent_selector() {
        assert_eq!(
            expand(".btn { @apply font-bold hover:font-bold; }").expect("apply should expand"),
            ".btn{font-weight:700}.btn:hover{font-weight:700}"
        );
    }

    #[test]
    fn important_suffix_marks_declarations() {
        assert_eq!(
            expand(".btn { @apply font-bold !important }").expect("apply should expand"),
            ".btn{font-weight:700!important}"
        );
    }

    #[test]
    fn pseudo_elements_follow_applied_pseudo_classes() {
        assert_eq!(
            expand(".a::after { @apply hover:font-bold }").expect("apply should expand"),
            ".a:hover::after{font-weight:700}"
        );
    }

    #[test]
    fn keeps_other_declarations_before_siblings() {
        assert_eq!(
            expand(".a { color: red; @apply font-bold; }").expect("apply should expand"),
            ".a{color:red}.a{font-weight:700}"
        );
    }

    #[test]
    fn unknown_candidates_fail() {
        assert_eq!(
            expand(".a { @apply nope }"),
            Err(Error::UnknownApplyCandidate {
                candidate: "nope".to_string()
            })
        );
        assert_eq!(
            expand(".a { @apply group }"),
            Err(Error::ApplyGroupUtility {
                candidate: "group".to_string()
            })
        );
    }

    #[test]
    fn nested_at_rules_are_rejected() {
        assert_eq!(
            expand("@screen md { @apply font-bold p-4 }"),
            Err(Error::ApplyInScreen {
                suggestion: "md:font-bold md:p-4".to_string()
            })
        );
        assert_eq!(
            expand("@media print { @apply font-bold }"),
            Err(Error::ApplyInAtRule {
                name: "media".to_string()
            })
        );
    }

    #[test]
    fn apply_at_the_root_fails() {
        assert_eq!(
            expand("@apply font-bold;"),
            Err(Error::ApplyOutsideRule {
                params: "font-bold".to_string()
            })
        );
        assert_eq!(
            expand("@apply does-not-exist;"),
            Err(Error::UnknownApplyCandidate {
                candidate: "does-not-exist".to_string()
            })
        );
    }

    #[test]
    fn rules_inside_media_may_apply() {
        assert_eq!(
            expand("@media print { .a { @apply font-bold } }").expect("apply should expand"),
            "@media print{.a{font-weight:700}}"
        );
    }

    #[test]
    fn self_application_is_circular() {
        let mut context = Context::new(Config::default(), &[]).expect("context should build");
        let root = parse(".font-bold { @apply font-bold }").expect("css should parse");
        assert_eq!(
            expand_apply(root, &mut context),
            Err(Error::CircularApply {
                candidate: "font-bold".to_string()
            })
        );
    }
}
