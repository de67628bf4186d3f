use super::{match_color, match_properties};
use crate::error::Result;
use crate::registry::{CssObject, MatchContext, MatchFn, MatchOptions, PluginApi, RuleOptions};
use crate::values::{ValueType, with_alpha_value};
use std::rc::Rc;

pub(super) fn cursor(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("cursor");
    match_properties(api, &[("cursor", &["cursor"])], MatchOptions::new(values));
    Ok(())
}

pub(super) fn border_radius(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("borderRadius");
    match_properties(
        api,
        &[
            ("rounded", &["border-radius"]),
            ("rounded-t", &["border-top-left-radius", "border-top-right-radius"]),
            ("rounded-r", &["border-top-right-radius", "border-bottom-right-radius"]),
            ("rounded-b", &["border-bottom-right-radius", "border-bottom-left-radius"]),
            ("rounded-l", &["border-top-left-radius", "border-bottom-left-radius"]),
        ],
        MatchOptions::new(values).types(&[ValueType::Length, ValueType::Percentage]),
    );
    Ok(())
}

pub(super) fn border_width(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("borderWidth");
    match_properties(
        api,
        &[
            ("border", &["border-width"]),
            ("border-t", &["border-top-width"]),
            ("border-r", &["border-right-width"]),
            ("border-b", &["border-bottom-width"]),
            ("border-l", &["border-left-width"]),
        ],
        MatchOptions::new(values).types(&[ValueType::Length]),
    );
    Ok(())
}

pub(super) fn border_color(api: &mut PluginApi<'_>) -> Result<()> {
    match_color(api, "border", "border-color", Some("--tw-border-opacity"));
    Ok(())
}

pub(super) fn background_color(api: &mut PluginApi<'_>) -> Result<()> {
    match_color(api, "bg", "background-color", Some("--tw-bg-opacity"));
    Ok(())
}

pub(super) fn opacity(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("opacity");
    match_properties(
        api,
        &[("opacity", &["opacity"])],
        MatchOptions::new(values).types(&[ValueType::Number]),
    );
    Ok(())
}

/// `ring-*` draws a box-shadow ring built from the `--tw-ring-*` variables
/// the base layer initializes.
pub(super) fn ring_width(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("ringWidth");
    let ring: MatchFn = Rc::new(|value: &str, _: &MatchContext<'_>| {
        CssObject::new()
            .decl(
                "--tw-ring-offset-shadow",
                "var(--tw-ring-inset) 0 0 0 var(--tw-ring-offset-width) var(--tw-ring-offset-color)",
            )
            .decl(
                "--tw-ring-shadow",
                format!(
                    "var(--tw-ring-inset) 0 0 0 calc({} + var(--tw-ring-offset-width)) var(--tw-ring-color)",
                    value
                ),
            )
            .decl(
                "box-shadow",
                "var(--tw-ring-offset-shadow), var(--tw-ring-shadow), var(--tw-shadow, 0 0 #0000)",
            )
    });
    api.match_utilities(
        vec![("ring", ring)],
        MatchOptions::new(values).types(&[ValueType::Length]),
    );
    api.add_utilities(
        CssObject::rule(".ring-inset", CssObject::new().decl("--tw-ring-inset", "inset")),
        RuleOptions::default(),
    );
    Ok(())
}

pub(super) fn ring_color(api: &mut PluginApi<'_>) -> Result<()> {
    match_color(api, "ring", "--tw-ring-color", Some("--tw-ring-opacity"));
    Ok(())
}

pub(super) fn ring_offset_width(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("ringOffsetWidth");
    match_properties(
        api,
        &[("ring-offset", &["--tw-ring-offset-width"])],
        MatchOptions::new(values).types(&[ValueType::Length]),
    );
    Ok(())
}

pub(super) fn ring_offset_color(api: &mut PluginApi<'_>) -> Result<()> {
    match_color(api, "ring-offset", "--tw-ring-offset-color", None);
    Ok(())
}

/// The ring color the base layer starts from: blue-500 at half opacity.
pub(super) fn default_ring_color(api: &PluginApi<'_>) -> String {
    let blue = api.theme().value("colors.blue.500", "#3b82f6");
    with_alpha_value(&blue, "0.5")
}
