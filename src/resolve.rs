use crate::candidate::tokenize;
use crate::context::Context;
use crate::css::Node;
use crate::registry::{MatchContext, RuleOptions, UtilityRule, VariantInput};
use crate::selector::{prefix_classes, rename_class};
use crate::sort::SortKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMeta {
    pub sort: SortKey,
    pub options: RuleOptions,
    pub important: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    pub meta: RuleMeta,
    pub node: Node,
}

/// Every rule a candidate produces, in registration order. An empty result
/// means the candidate is not a utility.
pub fn resolve_matches(candidate: &str, context: &mut Context) -> Vec<ResolvedRule> {
    let Some(token) = tokenize(
        candidate,
        &context.config.separator,
        &context.config.prefix,
        &context.registry,
    ) else {
        return Vec::new();
    };

    let entries = context.registry.entries(&token.root).to_vec();
    let mut rules = Vec::new();
    {
        let match_context = MatchContext {
            theme: &context.theme,
            config: &context.config,
        };
        for entry in entries {
            match &entry.rule {
                UtilityRule::Static(nodes) => {
                    if token.modifier != "DEFAULT" {
                        continue;
                    }
                    for node in nodes.iter() {
                        rules.push((entry.sort, entry.options, node.clone()));
                    }
                }
                UtilityRule::Dynamic(rule) => {
                    let result = rule(&token.modifier, &match_context);
                    for (object, options) in result.into_objects(entry.options) {
                        for node in context.node_cache.nodes(object).iter() {
                            rules.push((entry.sort, options, node.clone()));
                        }
                    }
                }
            }
        }
    }
    if rules.is_empty() {
        return Vec::new();
    }

    let prefix = context.config.prefix.as_str();
    let separator = context.config.separator.as_str();
    let mut variant_steps = Vec::with_capacity(token.variants.len());
    let mut class = if token.important {
        format!("!{}", token.class)
    } else {
        token.class.clone()
    };
    for name in token.variants.iter().rev() {
        let Some(variant) = context.registry.variant(name) else {
            tracing::trace!(candidate, variant = %name, "unknown variant");
            return Vec::new();
        };
        let renamed = format!("{}{}{}", name, separator, class);
        variant_steps.push((class, renamed.clone(), variant.clone()));
        class = renamed;
    }

    let mut resolved = Vec::with_capacity(rules.len());
    'rules: for (sort, options, mut node) in rules {
        if options.respect_prefix && !prefix.is_empty() {
            node = node.map_rules(&mut |rule| {
                rule.with_selector(prefix_classes(&rule.selector, prefix))
            });
        }

        let mut meta = RuleMeta {
            sort,
            options,
            important: false,
        };
        if token.important {
            node = node.map_rules(&mut |rule| {
                rule.with_selector(rename_class(
                    &rule.selector,
                    &token.class,
                    &format!("!{}", token.class),
                ))
            });
            if options.respect_important {
                node = node.with_important(true);
                meta.important = true;
            }
        }

        if options.respect_variants {
            for (from, to, variant) in &variant_steps {
                let renamed = node.map_rules(&mut |rule| {
                    rule.with_selector(rename_class(&rule.selector, from, to))
                });
                let input = VariantInput {
                    node: &renamed,
                    class: to,
                    separator,
                };
                let Some(next) = (variant.apply)(&input) else {
                    continue 'rules;
                };
                node = next;
                meta.sort = meta.sort.with_variant(variant.bit);
            }
        }

        resolved.push(ResolvedRule { meta, node });
    }
    resolved
}
