//! Build contexts: the registries and memo tables for one configuration,
//! plus the store that shares them between sources.

use crate::config::Config;
use crate::css::Node;
use crate::error::{Error, Result};
use crate::plugins;
use crate::registry::{CssObject, Plugin, PluginApi, Registry, RuleOptions};
use crate::resolve::{ResolvedRule, resolve_matches};
use crate::sort::Layer;
use crate::theme::Theme;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Nodes built from plugin style objects, keyed by the object itself.
#[derive(Debug, Default)]
pub struct NodeCache {
    nodes: HashMap<CssObject, Rc<[Node]>>,
}

impl NodeCache {
    pub fn nodes(&mut self, object: CssObject) -> Rc<[Node]> {
        if let Some(hit) = self.nodes.get(&object) {
            return Rc::clone(hit);
        }
        let built: Rc<[Node]> = Rc::from(object.to_nodes());
        self.nodes.insert(object, Rc::clone(&built));
        built
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Style blocks taken from the stylesheet's `@layer` directives.
pub type LayerBlock = (Layer, Vec<Node>);

pub struct Context {
    pub(crate) config: Config,
    pub(crate) theme: Theme,
    pub(crate) registry: Registry,
    pub(crate) node_cache: NodeCache,
    class_cache: HashMap<String, Rc<[ResolvedRule]>>,
    not_class_cache: HashSet<String>,
    apply_class_cache: HashMap<String, Rc<[ResolvedRule]>>,
}

impl Context {
    pub fn new(config: Config, layers: &[LayerBlock]) -> Result<Self> {
        Self::with_plugins(config, layers, &[])
    }

    /// Sets up a context: core utilities, then the pseudo variants, then
    /// `plugins`, then the remaining variants with screens last, and finally
    /// the stylesheet's own layers.
    pub fn with_plugins(config: Config, layers: &[LayerBlock], plugins: &[Plugin]) -> Result<Self> {
        if config.separator.is_empty() || config.separator == "-" {
            return Err(Error::InvalidSeparator {
                separator: config.separator.clone(),
            });
        }

        let theme = Theme::resolve(config.theme.as_ref())?;
        let mut registry = Registry::default();
        {
            let mut api = PluginApi::new(&mut registry, &theme, &config);
            plugins::register_utilities(&mut api)?;
            plugins::variants::register_pseudo_variants(&mut api)?;
            for plugin in plugins {
                plugin(&mut api)?;
            }
            plugins::variants::register_trailing_variants(&mut api)?;
            register_layers(&mut api, layers);
        }

        tracing::debug!(
            variants = registry.variant_names().len(),
            "context ready"
        );

        Ok(Self {
            config,
            theme,
            registry,
            node_cache: NodeCache::default(),
            class_cache: HashMap::new(),
            not_class_cache: HashSet::new(),
            apply_class_cache: HashMap::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Cached resolution of one candidate. `None` means the candidate is
    /// not a utility; that answer is cached too.
    pub fn resolve(&mut self, candidate: &str) -> Option<Rc<[ResolvedRule]>> {
        if let Some(hit) = self.class_cache.get(candidate) {
            return Some(Rc::clone(hit));
        }
        if self.not_class_cache.contains(candidate) {
            return None;
        }

        let rules = resolve_matches(candidate, self);
        if rules.is_empty() {
            tracing::trace!(candidate, "not a utility");
            self.not_class_cache.insert(candidate.to_string());
            return None;
        }
        let rules: Rc<[ResolvedRule]> = Rc::from(rules);
        self.class_cache
            .insert(candidate.to_string(), Rc::clone(&rules));
        Some(rules)
    }

    /// Resolved rules of every candidate, in candidate order.
    pub fn generate_rules<'c>(
        &mut self,
        candidates: impl IntoIterator<Item = &'c str>,
    ) -> Vec<ResolvedRule> {
        let mut out = Vec::new();
        for candidate in candidates {
            if let Some(rules) = self.resolve(candidate) {
                out.extend(rules.iter().cloned());
            }
        }
        out
    }

    /// Resolution for `@apply`, seeded from the class cache when the
    /// candidate was already generated.
    pub fn resolve_for_apply(&mut self, candidate: &str) -> Option<Rc<[ResolvedRule]>> {
        if let Some(hit) = self.apply_class_cache.get(candidate) {
            return Some(Rc::clone(hit));
        }
        if let Some(hit) = self.class_cache.get(candidate) {
            let hit = Rc::clone(hit);
            self.apply_class_cache
                .insert(candidate.to_string(), Rc::clone(&hit));
            return Some(hit);
        }
        if self.not_class_cache.contains(candidate) {
            return None;
        }

        let rules = resolve_matches(candidate, self);
        if rules.is_empty() {
            self.not_class_cache.insert(candidate.to_string());
            return None;
        }
        let rules: Rc<[ResolvedRule]> = Rc::from(rules);
        self.apply_class_cache
            .insert(candidate.to_string(), Rc::clone(&rules));
        Some(rules)
    }

    pub fn is_cached(&self, candidate: &str) -> bool {
        self.class_cache.contains_key(candidate)
    }

    pub fn is_known_non_class(&self, candidate: &str) -> bool {
        self.not_class_cache.contains(candidate)
    }

    pub fn class_cache_len(&self) -> usize {
        self.class_cache.len()
    }
}

fn register_layers(api: &mut PluginApi<'_>, layers: &[LayerBlock]) {
    let options = RuleOptions {
        respect_prefix: false,
        ..RuleOptions::default()
    };
    for (layer, nodes) in layers {
        match layer {
            Layer::Base => api.add_base_nodes(nodes.clone()),
            Layer::Components => api.add_static(
                Layer::Components,
                nodes.clone(),
                RuleOptions {
                    respect_important: false,
                    ..options
                },
            ),
            Layer::Utilities | Layer::User => api.add_static(Layer::User, nodes.clone(), options),
        }
    }
}

/// Contexts shared between sources with identical configuration. A context
/// lives as long as at least one source refers to it.
#[derive(Default)]
pub struct ContextStore {
    contexts: HashMap<u64, Rc<RefCell<Context>>>,
    sources: HashMap<String, u64>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context for `config_hash`, built with `build` when no source uses
    /// that configuration yet. A source that switches configuration releases
    /// its previous context.
    pub fn get_or_create(
        &mut self,
        source_key: &str,
        config_hash: u64,
        build: impl FnOnce() -> Result<Context>,
    ) -> Result<Rc<RefCell<Context>>> {
        if let Some(existing) = self.contexts.get(&config_hash) {
            let existing = Rc::clone(existing);
            tracing::debug!(source_key, config_hash, "reusing context");
            self.attach(source_key, config_hash);
            return Ok(existing);
        }

        tracing::debug!(source_key, config_hash, "creating context");
        let context = Rc::new(RefCell::new(build()?));
        self.contexts.insert(config_hash, Rc::clone(&context));
        self.attach(source_key, config_hash);
        Ok(context)
    }

    /// Detaches a source; its context is dropped when no source is left.
    pub fn evict(&mut self, source_key: &str) -> bool {
        let Some(hash) = self.sources.remove(source_key) else {
            return false;
        };
        self.release(hash);
        true
    }

    pub fn refcount(&self, config_hash: u64) -> usize {
        self.sources
            .values()
            .filter(|hash| **hash == config_hash)
            .count()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    fn attach(&mut self, source_key: &str, config_hash: u64) {
        if let Some(previous) = self
            .sources
            .insert(source_key.to_string(), config_hash)
        {
            if previous != config_hash {
                self.release(previous);
            }
        }
    }

    fn release(&mut self, config_hash: u64) {
        if self.refcount(config_hash) == 0 {
            tracing::debug!(config_hash, "dropping context");
            self.contexts.remove(&config_hash);
        }
    }
}
