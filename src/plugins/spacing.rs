use super::{match_properties, spacing_with};
use crate::error::Result;
use crate::registry::{CssObject, MatchContext, MatchFn, MatchOptions, PluginApi, RuleOptions};
use crate::theme::ValueMap;
use crate::values::ValueType;
use std::rc::Rc;

const SIZES: &[ValueType] = &[ValueType::Length, ValueType::Percentage];

pub(super) fn margin(api: &mut PluginApi<'_>) -> Result<()> {
    let auto: ValueMap = [("auto", "auto")].into_iter().collect();
    let values = api.theme().flat("spacing").merged(&auto);
    match_properties(
        api,
        &[
            ("m", &["margin"]),
            ("mx", &["margin-left", "margin-right"]),
            ("my", &["margin-top", "margin-bottom"]),
            ("mt", &["margin-top"]),
            ("mr", &["margin-right"]),
            ("mb", &["margin-bottom"]),
            ("ml", &["margin-left"]),
        ],
        MatchOptions::new(values).types(SIZES).negative(),
    );
    Ok(())
}

pub(super) fn padding(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("spacing");
    match_properties(
        api,
        &[
            ("p", &["padding"]),
            ("px", &["padding-left", "padding-right"]),
            ("py", &["padding-top", "padding-bottom"]),
            ("pt", &["padding-top"]),
            ("pr", &["padding-right"]),
            ("pb", &["padding-bottom"]),
            ("pl", &["padding-left"]),
        ],
        MatchOptions::new(values).types(SIZES),
    );
    Ok(())
}

pub(super) fn height(api: &mut PluginApi<'_>) -> Result<()> {
    let values = spacing_with(api, "height");
    match_properties(api, &[("h", &["height"])], MatchOptions::new(values).types(SIZES));
    Ok(())
}

pub(super) fn width(api: &mut PluginApi<'_>) -> Result<()> {
    let values = spacing_with(api, "width");
    match_properties(api, &[("w", &["width"])], MatchOptions::new(values).types(SIZES));
    Ok(())
}

pub(super) fn gap(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("spacing");
    match_properties(
        api,
        &[
            ("gap", &["gap"]),
            ("gap-x", &["column-gap"]),
            ("gap-y", &["row-gap"]),
        ],
        MatchOptions::new(values).types(SIZES),
    );
    Ok(())
}

const BETWEEN_CHILDREN: &str = "& > :not([hidden]) ~ :not([hidden])";

/// `space-x-*` and `space-y-*` put margins between children, flipped by the
/// `*-reverse` utilities.
pub(super) fn space(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("spacing");
    let space_x: MatchFn = Rc::new(|value: &str, _: &MatchContext<'_>| {
        CssObject::new().nest(
            BETWEEN_CHILDREN,
            CssObject::new()
                .decl("--tw-space-x-reverse", "0")
                .decl(
                    "margin-right",
                    format!("calc({} * var(--tw-space-x-reverse))", value),
                )
                .decl(
                    "margin-left",
                    format!("calc({} * calc(1 - var(--tw-space-x-reverse)))", value),
                ),
        )
    });
    let space_y: MatchFn = Rc::new(|value: &str, _: &MatchContext<'_>| {
        CssObject::new().nest(
            BETWEEN_CHILDREN,
            CssObject::new()
                .decl("--tw-space-y-reverse", "0")
                .decl(
                    "margin-top",
                    format!("calc({} * calc(1 - var(--tw-space-y-reverse)))", value),
                )
                .decl(
                    "margin-bottom",
                    format!("calc({} * var(--tw-space-y-reverse))", value),
                ),
        )
    });
    api.match_utilities(
        vec![("space-x", space_x), ("space-y", space_y)],
        MatchOptions::new(values).types(SIZES).negative(),
    );

    for axis in ["x", "y"] {
        api.add_utilities(
            CssObject::rule(
                format!(".space-{}-reverse", axis),
                CssObject::new().nest(
                    BETWEEN_CHILDREN,
                    CssObject::new().decl(format!("--tw-space-{}-reverse", axis), "1"),
                ),
            ),
            RuleOptions::default(),
        );
    }
    Ok(())
}
