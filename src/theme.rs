use std::collections::HashMap;
use toml::{Table, Value};

const DEFAULT_THEME_TOML: &str = include_str!("default_theme.toml");

/// Read-only view of the resolved design tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    root: Table,
}

/// An ordered, flattened `key -> value` view of one theme section, e.g.
/// `colors` becomes `red-500 -> #ef4444`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ValueMap {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of `self` followed by those of `other`, later keys winning.
    pub fn merged(&self, other: &ValueMap) -> ValueMap {
        let mut out = self.clone();
        for (key, value) in other.iter() {
            out.insert(key, value);
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::default();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Theme {
    pub fn new(root: Table) -> Self {
        Self { root }
    }

    /// The built-in theme with `overrides` applied: top-level keys replace
    /// the default section, keys under `extend` are merged into it.
    pub fn resolve(overrides: Option<&Table>) -> crate::error::Result<Self> {
        let mut root: Table =
            toml::from_str(DEFAULT_THEME_TOML).map_err(|err| crate::error::Error::Config {
                message: format!("failed to parse built-in theme: {}", err),
            })?;

        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                if key == "extend" {
                    continue;
                }
                root.insert(key.clone(), value.clone());
            }
            if let Some(Value::Table(extend)) = overrides.get("extend") {
                for (key, value) in extend {
                    match root.get_mut(key) {
                        Some(existing) => deep_merge(existing, value),
                        None => {
                            root.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }

        Ok(Self { root })
    }

    /// Looks up a dotted path. Keys may themselves contain dots
    /// (`spacing.0.5`), so the longest matching key wins at every level.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        lookup(&self.root, &parts)
    }

    pub fn value(&self, path: &str, default: &str) -> String {
        self.get(path)
            .and_then(scalar_to_string)
            .unwrap_or_else(|| default.to_string())
    }

    /// Flattens a theme section. Nested tables join their keys with `-`
    /// and a nested `DEFAULT` collapses onto its parent key.
    pub fn flat(&self, path: &str) -> ValueMap {
        let mut map = ValueMap::default();
        if let Some(Value::Table(table)) = self.get(path) {
            flatten_into(&mut map, "", table);
        }
        map
    }

    /// Like [`Theme::flat`] but keeps array values (font sizes with line
    /// heights, font stacks) as lists.
    pub fn list(&self, path: &str) -> Vec<(String, Vec<String>)> {
        let Some(Value::Table(table)) = self.get(path) else {
            return Vec::new();
        };
        table
            .iter()
            .map(|(key, value)| {
                let items = match value {
                    Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
                    other => scalar_to_string(other).into_iter().collect(),
                };
                (key.clone(), items)
            })
            .collect()
    }

    pub fn section(&self, path: &str) -> Option<&Table> {
        match self.get(path) {
            Some(Value::Table(table)) => Some(table),
            _ => None,
        }
    }
}

fn lookup<'a>(table: &'a Table, parts: &[&str]) -> Option<&'a Value> {
    if parts.is_empty() {
        return None;
    }
    for end in (1..=parts.len()).rev() {
        let key = parts[..end].join(".");
        let Some(value) = table.get(&key) else {
            continue;
        };
        if end == parts.len() {
            return Some(value);
        }
        if let Value::Table(inner) = value {
            if let Some(found) = lookup(inner, &parts[end..]) {
                return Some(found);
            }
        }
    }
    None
}

fn flatten_into(map: &mut ValueMap, prefix: &str, table: &Table) {
    for (key, value) in table {
        let name = if key == "DEFAULT" {
            prefix.to_string()
        } else if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}-{}", prefix, key)
        };
        match value {
            Value::Table(inner) => flatten_into(map, &name, inner),
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                map.insert(if name.is_empty() { "DEFAULT".to_string() } else { name }, joined);
            }
            other => {
                if let Some(text) = scalar_to_string(other) {
                    map.insert(if name.is_empty() { "DEFAULT".to_string() } else { name }, text);
                }
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Integer(number) => Some(number.to_string()),
        Value::Float(number) => Some(number.to_string()),
        Value::Boolean(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Table(target), Value::Table(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::Theme;

    fn theme(overrides: &str) -> Theme {
        let table: toml::Table = toml::from_str(overrides).expect("overrides should parse");
        Theme::resolve(Some(&table)).expect("theme should resolve")
    }

    #[test]
    fn resolves_default_values() {
        let theme = Theme::resolve(None).expect("theme should resolve");
        assert_eq!(theme.value("colors.red.500", ""), "#ef4444");
        assert_eq!(theme.value("spacing.0.5", ""), "0.125rem");
        assert_eq!(theme.value("screens.md", ""), "768px");
        assert_eq!(theme.value("missing.key", "fallback"), "fallback");
    }

    #[test]
    fn flattens_nested_palettes() {
        let theme = theme("[colors.brand]\nDEFAULT = \"#111111\"\nlight = \"#eeeeee\"\n");
        let colors = theme.flat("colors");
        assert_eq!(colors.get("brand"), Some("#111111"));
        assert_eq!(colors.get("brand-light"), Some("#eeeeee"));
        assert_eq!(colors.get("red-500"), None);
    }

    #[test]
    fn extend_merges_into_defaults() {
        let theme = theme("[extend.colors.brand]\n500 = \"#123456\"\n");
        let colors = theme.flat("colors");
        assert_eq!(colors.get("brand-500"), Some("#123456"));
        assert_eq!(colors.get("red-500"), Some("#ef4444"));
    }

    #[test]
    fn screens_keep_declaration_order() {
        let theme = theme("[screens]\ntablet = \"640px\"\nlaptop = \"1024px\"\ndesktop = \"1280px\"\n");
        let screens = theme.flat("screens");
        let keys: Vec<&str> = screens.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["tablet", "laptop", "desktop"]);
    }
}
