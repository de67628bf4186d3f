use std::cmp::Ordering;

/// Maximum number of variants a context can register; each one owns a bit
/// of [`SortKey::variants`].
pub const MAX_VARIANTS: usize = u64::BITS as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Base,
    Components,
    Utilities,
    User,
}

impl Layer {
    pub fn parse(name: &str) -> Option<Layer> {
        match name {
            "base" => Some(Layer::Base),
            "components" => Some(Layer::Components),
            "utilities" => Some(Layer::Utilities),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Layer::Base => "base",
            Layer::Components => "components",
            Layer::Utilities => "utilities",
            Layer::User => "user",
        }
    }
}

/// Total order of generated rules: variant bits first, then layer, then the
/// registration index inside the layer. Equivalent to one big integer with
/// the variant bits above the layer bits above the index bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub layer: Layer,
    pub index: u32,
    pub variants: u64,
}

impl SortKey {
    pub fn new(layer: Layer, index: u32) -> Self {
        Self {
            layer,
            index,
            variants: 0,
        }
    }

    pub fn with_variant(self, bit: u64) -> Self {
        Self {
            variants: self.variants | bit,
            ..self
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.variants
            .cmp(&other.variants)
            .then_with(|| self.layer.cmp(&other.layer))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Hands out registration indices per layer.
#[derive(Debug, Clone, Default)]
pub struct Offsets {
    base: u32,
    components: u32,
    utilities: u32,
    user: u32,
}

impl Offsets {
    pub fn next(&mut self, layer: Layer) -> SortKey {
        let slot = match layer {
            Layer::Base => &mut self.base,
            Layer::Components => &mut self.components,
            Layer::Utilities => &mut self.utilities,
            Layer::User => &mut self.user,
        };
        let key = SortKey::new(layer, *slot);
        *slot += 1;
        key
    }
}

#[cfg(test)]
mod tests {
    use super::{Layer, Offsets, SortKey};

    #[test]
    fn layers_order_before_indices() {
        let mut offsets = Offsets::default();
        let _ = offsets.next(Layer::Base);
        let late_base = offsets.next(Layer::Base);
        let first_utility = offsets.next(Layer::Utilities);
        assert!(late_base < first_utility);
    }

    #[test]
    fn variant_bits_dominate_layers() {
        let base = SortKey::new(Layer::Utilities, 900);
        let hover = SortKey::new(Layer::Base, 0).with_variant(1 << 3);
        let screen = SortKey::new(Layer::Base, 0).with_variant(1 << 40);
        assert!(base < hover);
        assert!(hover < screen);
    }

    #[test]
    fn variant_composition_is_order_independent() {
        let key = SortKey::new(Layer::Utilities, 4);
        assert_eq!(
            key.with_variant(1).with_variant(8),
            key.with_variant(8).with_variant(1)
        );
    }
}
