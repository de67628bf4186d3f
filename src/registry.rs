//! Utility and variant registries, and the plugin API that fills them.

use crate::config::Config;
use crate::css::{self, Node};
use crate::error::{Error, Result};
use crate::selector::{escape_class_name, extract_classes};
use crate::sort::{Layer, MAX_VARIANTS, Offsets, SortKey};
use crate::theme::{Theme, ValueMap};
use crate::values::{ValueType, as_color, coerce_value, name_class, negate_value};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A style object as plugins write it: ordered keys mapping to either a
/// declaration value or a nested block. Keys starting with `@` are
/// at-rules, keys containing `&` are nested selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CssObject(pub Vec<(String, CssValue)>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CssValue {
    Value(String),
    Object(CssObject),
}

impl CssObject {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn decl(mut self, prop: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((prop.into(), CssValue::Value(value.into())));
        self
    }

    pub fn nest(mut self, key: impl Into<String>, body: CssObject) -> Self {
        self.0.push((key.into(), CssValue::Object(body)));
        self
    }

    /// `{ selector: body }`
    pub fn rule(selector: impl Into<String>, body: CssObject) -> Self {
        Self::new().nest(selector, body)
    }

    pub fn from_decls<K: Into<String>, V: Into<String>>(
        decls: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        decls
            .into_iter()
            .fold(Self::new(), |obj, (prop, value)| obj.decl(prop, value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds stylesheet nodes, flattening `&` selectors into sibling rules
    /// and moving nested at-rules outside their rule.
    pub fn to_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        for (key, value) in &self.0 {
            match value {
                CssValue::Value(value) => nodes.push(Node::decl(key, value)),
                CssValue::Object(body) => match at_rule_parts(key) {
                    Some((name, params)) => {
                        nodes.push(Node::at_rule(name, params, body.to_nodes()))
                    }
                    None => nodes.extend(rule_nodes(key, body)),
                },
            }
        }
        nodes
    }
}

fn at_rule_parts(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix('@')?;
    Some(match rest.split_once(char::is_whitespace) {
        Some((name, params)) => (name, params.trim()),
        None => (rest, ""),
    })
}

fn rule_nodes(selector: &str, body: &CssObject) -> Vec<Node> {
    let mut decls = Vec::new();
    let mut trailing = Vec::new();
    for (key, value) in &body.0 {
        match value {
            CssValue::Value(value) => decls.push(Node::decl(key, value)),
            CssValue::Object(inner) => {
                if let Some((name, params)) = at_rule_parts(key) {
                    trailing.push(Node::at_rule(name, params, rule_nodes(selector, inner)));
                } else if key.contains('&') {
                    trailing.extend(rule_nodes(&key.replace('&', selector), inner));
                } else {
                    trailing.extend(rule_nodes(&format!("{} {}", selector, key), inner));
                }
            }
        }
    }
    let mut nodes = Vec::with_capacity(trailing.len() + 1);
    if !decls.is_empty() || trailing.is_empty() {
        nodes.push(Node::rule(selector, decls));
    }
    nodes.extend(trailing);
    nodes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleOptions {
    pub respect_prefix: bool,
    pub respect_important: bool,
    pub respect_variants: bool,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            respect_prefix: true,
            respect_important: true,
            respect_variants: true,
        }
    }
}

/// What a dynamic utility hands back for one modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtilityResult {
    Empty,
    Single(CssObject),
    Many(Vec<CssObject>),
    WithOptions(CssObject, RuleOptions),
}

impl UtilityResult {
    /// The style objects of the result, each with the options that apply to
    /// it.
    pub fn into_objects(self, defaults: RuleOptions) -> Vec<(CssObject, RuleOptions)> {
        match self {
            UtilityResult::Empty => Vec::new(),
            UtilityResult::Single(obj) => vec![(obj, defaults)],
            UtilityResult::Many(objs) => objs.into_iter().map(|obj| (obj, defaults)).collect(),
            UtilityResult::WithOptions(obj, options) => vec![(obj, options)],
        }
    }
}

impl From<Vec<CssObject>> for UtilityResult {
    fn from(objs: Vec<CssObject>) -> Self {
        let mut objs: Vec<CssObject> = objs.into_iter().filter(|obj| !obj.is_empty()).collect();
        match objs.len() {
            0 => UtilityResult::Empty,
            1 => UtilityResult::Single(objs.remove(0)),
            _ => UtilityResult::Many(objs),
        }
    }
}

/// Read-only state a dynamic utility may consult while matching.
pub struct MatchContext<'a> {
    pub theme: &'a Theme,
    pub config: &'a Config,
}

pub type DynamicRule = Rc<dyn Fn(&str, &MatchContext<'_>) -> UtilityResult>;

/// Declarations for an already coerced value.
pub type MatchFn = Rc<dyn Fn(&str, &MatchContext<'_>) -> CssObject>;

#[derive(Clone)]
pub enum UtilityRule {
    Static(Rc<[Node]>),
    Dynamic(DynamicRule),
}

impl fmt::Debug for UtilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilityRule::Static(nodes) => f.debug_tuple("Static").field(nodes).finish(),
            UtilityRule::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UtilityEntry {
    pub sort: SortKey,
    pub rule: UtilityRule,
    pub options: RuleOptions,
}

/// Arguments of a variant transform. `class` is the candidate class after
/// the variant has been prepended, already substituted into `node`.
pub struct VariantInput<'a> {
    pub node: &'a Node,
    pub class: &'a str,
    pub separator: &'a str,
}

pub type VariantFn = Rc<dyn Fn(&VariantInput<'_>) -> Option<Node>>;

#[derive(Clone)]
pub struct VariantEntry {
    pub bit: u64,
    pub apply: VariantFn,
}

#[derive(Default)]
pub struct Registry {
    utilities: HashMap<String, Vec<UtilityEntry>>,
    variants: HashMap<String, VariantEntry>,
    variant_names: Vec<String>,
    screen_mask: u64,
    offsets: Offsets,
}

impl Registry {
    pub fn has_root(&self, root: &str) -> bool {
        self.utilities.contains_key(root)
    }

    pub fn entries(&self, root: &str) -> &[UtilityEntry] {
        self.utilities.get(root).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn variant(&self, name: &str) -> Option<&VariantEntry> {
        self.variants.get(name)
    }

    pub fn variant_names(&self) -> &[String] {
        &self.variant_names
    }

    /// Whether a variant mask contains a screen variant.
    pub fn is_screen_mask(&self, mask: u64) -> bool {
        mask & self.screen_mask != 0
    }

    fn push_utility(&mut self, key: String, entry: UtilityEntry) {
        self.utilities.entry(key).or_default().push(entry);
    }

    fn push_variant(&mut self, name: &str, apply: VariantFn) -> Result<u64> {
        if let Some(existing) = self.variants.get_mut(name) {
            existing.apply = apply;
            return Ok(existing.bit);
        }
        if self.variant_names.len() >= MAX_VARIANTS {
            return Err(Error::TooManyVariants {
                limit: MAX_VARIANTS,
            });
        }
        let bit = 1u64 << self.variant_names.len();
        self.variants
            .insert(name.to_string(), VariantEntry { bit, apply });
        self.variant_names.push(name.to_string());
        Ok(bit)
    }
}

/// Options for [`PluginApi::match_utilities`].
#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub values: ValueMap,
    pub types: Vec<ValueType>,
    pub supports_negative_values: bool,
    pub rule: RuleOptions,
}

impl MatchOptions {
    pub fn new(values: ValueMap) -> Self {
        Self {
            values,
            types: vec![ValueType::Any],
            supports_negative_values: false,
            rule: RuleOptions::default(),
        }
    }

    pub fn types(mut self, types: &[ValueType]) -> Self {
        self.types = types.to_vec();
        self
    }

    pub fn negative(mut self) -> Self {
        self.supports_negative_values = true;
        self
    }
}

pub type Plugin = Rc<dyn Fn(&mut PluginApi<'_>) -> Result<()>>;

/// Registration surface handed to plugins while a context is set up.
pub struct PluginApi<'a> {
    registry: &'a mut Registry,
    theme: &'a Theme,
    config: &'a Config,
}

impl<'a> PluginApi<'a> {
    pub fn new(registry: &'a mut Registry, theme: &'a Theme, config: &'a Config) -> Self {
        Self {
            registry,
            theme,
            config,
        }
    }

    pub fn theme(&self) -> &Theme {
        self.theme
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    pub fn separator(&self) -> &str {
        &self.config.separator
    }

    pub fn add_base(&mut self, styles: CssObject) {
        self.add_base_nodes(styles.to_nodes());
    }

    pub fn add_base_nodes(&mut self, nodes: Vec<Node>) {
        let options = RuleOptions {
            respect_prefix: false,
            respect_important: false,
            respect_variants: false,
        };
        for node in nodes {
            let sort = self.registry.offsets.next(Layer::Base);
            self.registry.push_utility(
                "*".to_string(),
                UtilityEntry {
                    sort,
                    rule: UtilityRule::Static(Rc::from(vec![node])),
                    options,
                },
            );
        }
    }

    pub fn add_components(&mut self, styles: CssObject, options: RuleOptions) {
        self.add_static(Layer::Components, styles.to_nodes(), options);
    }

    pub fn add_utilities(&mut self, styles: CssObject, options: RuleOptions) {
        self.add_static(Layer::Utilities, styles.to_nodes(), options);
    }

    /// Registers utilities written as CSS text.
    pub fn add_utilities_css(&mut self, css: &str, options: RuleOptions) -> Result<()> {
        let nodes = css::parse(css)?;
        self.add_static(Layer::Utilities, nodes, options);
        Ok(())
    }

    /// Registers already built nodes, keyed by every class they mention.
    pub fn add_static(&mut self, layer: Layer, nodes: Vec<Node>, options: RuleOptions) {
        for node in nodes {
            let node: Rc<[Node]> = Rc::from(vec![node]);
            let mut classes: Vec<String> = Vec::new();
            for selector in node[0].selectors() {
                for class in extract_classes(selector) {
                    if !classes.contains(&class) {
                        classes.push(class);
                    }
                }
            }
            for class in classes {
                let key = self.key(&class, options);
                let sort = self.registry.offsets.next(layer);
                self.registry.push_utility(
                    key,
                    UtilityEntry {
                        sort,
                        rule: UtilityRule::Static(Rc::clone(&node)),
                        options,
                    },
                );
            }
        }
    }

    /// Registers a root whose rules are computed from the modifier.
    pub fn add_dynamic(&mut self, layer: Layer, id: &str, rule: DynamicRule, options: RuleOptions) {
        let key = self.key(id, options);
        let sort = self.registry.offsets.next(layer);
        self.registry.push_utility(
            key,
            UtilityEntry {
                sort,
                rule: UtilityRule::Dynamic(rule),
                options,
            },
        );
    }

    /// Registers value-driven utilities. Each modifier is coerced through the
    /// theme values or as an arbitrary value before `f` builds declarations
    /// for it; the rule selector is derived from the utility id and modifier.
    pub fn match_utilities(&mut self, utilities: Vec<(&str, MatchFn)>, options: MatchOptions) {
        let opacities = self.theme.flat("opacity");
        let shared = Rc::new(options);
        for (id, build) in utilities {
            let id_owned = id.to_string();
            let options = Rc::clone(&shared);
            let opacities = opacities.clone();
            let rule: DynamicRule = Rc::new(move |modifier: &str, ctx: &MatchContext<'_>| {
                let Some(value) = coerce_modifier(modifier, &options, &opacities) else {
                    return UtilityResult::Empty;
                };
                let decls = build(&value, ctx);
                if decls.is_empty() {
                    return UtilityResult::Empty;
                }
                let selector = format!(".{}", escape_class_name(&name_class(&id_owned, modifier)));
                UtilityResult::Single(CssObject::rule(selector, decls))
            });
            self.add_dynamic(Layer::Utilities, id, rule, shared.rule);
        }
    }

    pub fn add_variant(&mut self, name: &str, apply: VariantFn) -> Result<()> {
        self.registry.push_variant(name, apply).map(|_| ())
    }

    /// Registers a breakpoint variant. Rules carrying its bit are emitted
    /// with the screens.
    pub fn add_screen_variant(&mut self, name: &str, apply: VariantFn) -> Result<()> {
        let bit = self.registry.push_variant(name, apply)?;
        self.registry.screen_mask |= bit;
        Ok(())
    }

    fn key(&self, id: &str, options: RuleOptions) -> String {
        if options.respect_prefix {
            format!("{}{}", self.config.prefix, id)
        } else {
            id.to_string()
        }
    }
}

fn coerce_modifier(modifier: &str, options: &MatchOptions, opacities: &ValueMap) -> Option<String> {
    let (modifier, negative) = match modifier.strip_prefix('-') {
        Some(rest) if options.supports_negative_values => {
            (if rest.is_empty() { "DEFAULT" } else { rest }, true)
        }
        Some(_) => return None,
        None => (modifier, false),
    };

    let value = if options.types.contains(&ValueType::Color) {
        as_color(modifier, &options.values, opacities)
            .or_else(|| coerce_value(modifier, &options.values, &options.types))
    } else {
        coerce_value(modifier, &options.values, &options.types)
    }?;

    if negative { negate_value(&value) } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::{
        CssObject, MatchContext, MatchFn, MatchOptions, PluginApi, Registry, RuleOptions,
        UtilityResult, UtilityRule, VariantFn, VariantInput,
    };
    use crate::config::Config;
    use crate::css::{Node, to_css};
    use crate::error::Error;
    use crate::theme::{Theme, ValueMap};
    use crate::values::ValueType;
    use std::rc::Rc;

    fn setup(config: &Config, f: impl FnOnce(&mut PluginApi<'_>)) -> (Registry, Theme) {
        let theme = Theme::resolve(None).expect("theme should resolve");
        let mut registry = Registry::default();
        {
            let mut api = PluginApi::new(&mut registry, &theme, config);
            f(&mut api);
        }
        (registry, theme)
    }

    #[test]
    fn flattens_nested_objects() {
        let obj = CssObject::rule(
            ".space-x-4",
            CssObject::new().nest(
                "& > :not([hidden]) ~ :not([hidden])",
                CssObject::new().decl("margin-left", "1rem"),
            ),
        )
        .nest(
            "@media (min-width: 640px)",
            CssObject::rule(".a", CssObject::new().decl("color", "red")),
        );
        let css = to_css(&obj.to_nodes(), true);
        assert_eq!(
            css,
            ".space-x-4 > :not([hidden]) ~ :not([hidden]){margin-left:1rem}@media (min-width: 640px){.a{color:red}}"
        );
    }

    #[test]
    fn static_rules_are_keyed_by_prefixed_class() {
        let config = Config {
            prefix: "tw-".to_string(),
            ..Config::default()
        };
        let (registry, _) = setup(&config, |api| {
            api.add_utilities(
                CssObject::rule(".block", CssObject::new().decl("display", "block")),
                RuleOptions::default(),
            );
            api.add_utilities(
                CssObject::rule(".raw", CssObject::new().decl("display", "block")),
                RuleOptions {
                    respect_prefix: false,
                    ..RuleOptions::default()
                },
            );
        });
        assert!(registry.has_root("tw-block"));
        assert!(!registry.has_root("block"));
        assert!(registry.has_root("raw"));
    }

    #[test]
    fn match_utilities_coerce_and_negate() {
        let config = Config::default();
        let values: ValueMap = [("4", "1rem")].into_iter().collect();
        let (registry, theme) = setup(&config, |api| {
            let margin_top: MatchFn = Rc::new(|value: &str, _: &MatchContext<'_>| {
                CssObject::new().decl("margin-top", value)
            });
            api.match_utilities(
                vec![("mt", margin_top)],
                MatchOptions::new(values).types(&[ValueType::Length]).negative(),
            );
        });
        let ctx = MatchContext {
            theme: &theme,
            config: &config,
        };
        let UtilityRule::Dynamic(rule) = &registry.entries("mt")[0].rule else {
            panic!("expected dynamic rule");
        };
        let negative = rule("-4", &ctx);
        assert_eq!(
            negative,
            UtilityResult::Single(CssObject::rule(
                ".-mt-4",
                CssObject::new().decl("margin-top", "-1rem")
            ))
        );
        assert_eq!(rule("5", &ctx), UtilityResult::Empty);
        assert_eq!(rule("[red]", &ctx), UtilityResult::Empty);
    }

    #[test]
    fn variant_bits_follow_registration_order() {
        let config = Config::default();
        let (registry, _) = setup(&config, |api| {
            let keep: VariantFn = Rc::new(|input: &VariantInput<'_>| Some(input.node.clone()));
            api.add_variant("hover", Rc::clone(&keep)).expect("room for variant");
            api.add_variant("focus", Rc::clone(&keep)).expect("room for variant");
            api.add_screen_variant("md", keep).expect("room for variant");
        });
        let hover = registry.variant("hover").map(|entry| entry.bit);
        let md = registry.variant("md").map(|entry| entry.bit);
        assert_eq!(hover, Some(1));
        assert_eq!(md, Some(4));
        assert!(registry.is_screen_mask(4 | 1));
        assert!(!registry.is_screen_mask(2));
    }

    #[test]
    fn later_variants_are_not_screens() {
        let config = Config::default();
        let (registry, _) = setup(&config, |api| {
            let keep: VariantFn = Rc::new(|input: &VariantInput<'_>| Some(input.node.clone()));
            api.add_screen_variant("print", Rc::clone(&keep)).expect("room for variant");
            api.add_variant("dark", keep).expect("room for variant");
        });
        let print = registry.variant("print").map(|entry| entry.bit).unwrap_or(0);
        let dark = registry.variant("dark").map(|entry| entry.bit).unwrap_or(0);
        assert!(dark > print);
        assert!(registry.is_screen_mask(print));
        assert!(!registry.is_screen_mask(dark));
    }

    #[test]
    fn rejects_the_sixty_fifth_variant() {
        let config = Config::default();
        let theme = Theme::resolve(None).expect("theme should resolve");
        let mut registry = Registry::default();
        let mut api = PluginApi::new(&mut registry, &theme, &config);
        let keep: VariantFn = Rc::new(|input: &VariantInput<'_>| Some(input.node.clone()));
        for idx in 0..64 {
            api.add_variant(&format!("v{}", idx), Rc::clone(&keep))
                .expect("64 variants fit");
        }
        let err = api.add_variant("v64", keep).unwrap_err();
        assert_eq!(err, Error::TooManyVariants { limit: 64 });
    }

    #[test]
    fn results_normalize_from_lists() {
        assert_eq!(UtilityResult::from(Vec::new()), UtilityResult::Empty);
        let one = CssObject::rule(".a", CssObject::new().decl("color", "red"));
        assert_eq!(
            UtilityResult::from(vec![one.clone(), CssObject::new()]),
            UtilityResult::Single(one)
        );
    }

    #[test]
    fn base_rules_live_under_star() {
        let config = Config::default();
        let (registry, _) = setup(&config, |api| {
            api.add_base_nodes(vec![Node::rule("*, ::before", vec![])]);
        });
        assert_eq!(registry.entries("*").len(), 1);
        assert!(!registry.entries("*")[0].options.respect_prefix);
    }
}
