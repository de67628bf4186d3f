//! Built-in plugins. Registration order is sort order within a layer.

mod base;
mod decoration;
mod layout;
mod spacing;
mod typography;
pub mod variants;

use crate::error::Result;
use crate::registry::{CssObject, MatchContext, MatchFn, MatchOptions, PluginApi};
use crate::theme::ValueMap;
use crate::values::{ValueType, with_alpha_variable};
use std::rc::Rc;

type CorePlugin = fn(&mut PluginApi<'_>) -> Result<()>;

const CORE_PLUGINS: &[(&str, CorePlugin)] = &[
    ("preflight", base::preflight),
    ("container", layout::container),
    ("accessibility", layout::accessibility),
    ("pointerEvents", layout::pointer_events),
    ("visibility", layout::visibility),
    ("position", layout::position),
    ("inset", layout::inset),
    ("zIndex", layout::z_index),
    ("margin", spacing::margin),
    ("padding", spacing::padding),
    ("display", layout::display),
    ("height", spacing::height),
    ("width", spacing::width),
    ("flexDirection", layout::flex_direction),
    ("alignItems", layout::align_items),
    ("justifyContent", layout::justify_content),
    ("gap", spacing::gap),
    ("space", spacing::space),
    ("cursor", decoration::cursor),
    ("borderRadius", decoration::border_radius),
    ("borderWidth", decoration::border_width),
    ("borderColor", decoration::border_color),
    ("backgroundColor", decoration::background_color),
    ("fontFamily", typography::font_family),
    ("fontSize", typography::font_size),
    ("fontWeight", typography::font_weight),
    ("textAlign", typography::text_align),
    ("textColor", typography::text_color),
    ("opacity", decoration::opacity),
    ("ringWidth", decoration::ring_width),
    ("ringColor", decoration::ring_color),
    ("ringOffsetWidth", decoration::ring_offset_width),
    ("ringOffsetColor", decoration::ring_offset_color),
    ("content", typography::content),
];

/// Registers every core utility the configuration leaves enabled.
pub fn register_utilities(api: &mut PluginApi<'_>) -> Result<()> {
    for (name, plugin) in CORE_PLUGINS {
        if !api.config().plugin_enabled(name) {
            tracing::trace!(plugin = name, "core plugin disabled");
            continue;
        }
        plugin(api)?;
    }
    Ok(())
}

/// Utilities that write the same value to one or more properties.
fn match_properties(
    api: &mut PluginApi<'_>,
    utilities: &[(&'static str, &'static [&'static str])],
    options: MatchOptions,
) {
    let entries = utilities
        .iter()
        .map(|(id, properties)| {
            let properties: &'static [&'static str] = properties;
            let build: MatchFn = Rc::new(move |value: &str, _: &MatchContext<'_>| {
                CssObject::from_decls(properties.iter().map(|property| (*property, value)))
            });
            (*id, build)
        })
        .collect();
    api.match_utilities(entries, options);
}

/// A color utility. With `variable`, opaque colors get an adjustable alpha
/// channel through that CSS variable.
fn match_color(
    api: &mut PluginApi<'_>,
    id: &'static str,
    property: &'static str,
    variable: Option<&'static str>,
) {
    let colors = api.theme().flat("colors");
    let build: MatchFn = Rc::new(move |value: &str, _: &MatchContext<'_>| match variable {
        Some(variable) => CssObject::from_decls(with_alpha_variable(value, property, variable)),
        None => CssObject::new().decl(property, value),
    });
    api.match_utilities(
        vec![(id, build)],
        MatchOptions::new(colors).types(&[ValueType::Color]),
    );
}

fn spacing_with(api: &PluginApi<'_>, section: &str) -> ValueMap {
    api.theme().flat("spacing").merged(&api.theme().flat(section))
}
