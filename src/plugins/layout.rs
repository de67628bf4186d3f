use super::{match_properties, spacing_with};
use crate::error::Result;
use crate::registry::{CssObject, DynamicRule, MatchContext, MatchOptions, PluginApi, RuleOptions, UtilityResult};
use crate::sort::Layer;
use crate::values::ValueType;
use std::rc::Rc;

use super::variants::screen_min_width;

/// `.container`: full width, capped at every breakpoint.
pub(super) fn container(api: &mut PluginApi<'_>) -> Result<()> {
    let theme = api.theme();
    let breakpoints: Vec<String> = theme
        .section("screens")
        .map(|screens| screens.values().filter_map(screen_min_width).collect())
        .unwrap_or_default();
    let center = matches!(
        theme.get("container.center"),
        Some(toml::Value::Boolean(true))
    );
    let padding = match theme.get("container.padding") {
        Some(toml::Value::String(padding)) => Some(padding.clone()),
        _ => None,
    };

    let rule: DynamicRule = Rc::new(move |modifier: &str, _: &MatchContext<'_>| {
        if modifier != "DEFAULT" {
            return UtilityResult::Empty;
        }
        let mut body = CssObject::new().decl("width", "100%");
        if center {
            body = body.decl("margin-right", "auto").decl("margin-left", "auto");
        }
        if let Some(padding) = &padding {
            body = body
                .decl("padding-right", padding.as_str())
                .decl("padding-left", padding.as_str());
        }
        let mut objects = vec![CssObject::rule(".container", body)];
        for width in &breakpoints {
            objects.push(CssObject::rule(
                format!("@media (min-width: {})", width),
                CssObject::rule(".container", CssObject::new().decl("max-width", width.as_str())),
            ));
        }
        UtilityResult::from(objects)
    });
    api.add_dynamic(
        Layer::Components,
        "container",
        rule,
        RuleOptions {
            respect_important: false,
            ..RuleOptions::default()
        },
    );
    Ok(())
}

pub(super) fn accessibility(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_utilities_css(
        ".sr-only {
            position: absolute;
            width: 1px;
            height: 1px;
            padding: 0;
            margin: -1px;
            overflow: hidden;
            clip: rect(0, 0, 0, 0);
            white-space: nowrap;
            border-width: 0;
        }
        .not-sr-only {
            position: static;
            width: auto;
            height: auto;
            padding: 0;
            margin: 0;
            overflow: visible;
            clip: auto;
            white-space: normal;
        }",
        RuleOptions::default(),
    )
}

pub(super) fn pointer_events(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_utilities_css(
        ".pointer-events-none { pointer-events: none }
        .pointer-events-auto { pointer-events: auto }",
        RuleOptions::default(),
    )
}

pub(super) fn visibility(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_utilities_css(
        ".visible { visibility: visible }
        .invisible { visibility: hidden }",
        RuleOptions::default(),
    )
}

pub(super) fn position(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_utilities_css(
        ".static { position: static }
        .fixed { position: fixed }
        .absolute { position: absolute }
        .relative { position: relative }
        .sticky { position: sticky }",
        RuleOptions::default(),
    )
}

pub(super) fn inset(api: &mut PluginApi<'_>) -> Result<()> {
    let values = spacing_with(api, "inset");
    match_properties(
        api,
        &[
            ("inset", &["top", "right", "bottom", "left"]),
            ("inset-x", &["left", "right"]),
            ("inset-y", &["top", "bottom"]),
            ("top", &["top"]),
            ("right", &["right"]),
            ("bottom", &["bottom"]),
            ("left", &["left"]),
        ],
        MatchOptions::new(values)
            .types(&[ValueType::Length, ValueType::Percentage])
            .negative(),
    );
    Ok(())
}

pub(super) fn z_index(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("zIndex");
    match_properties(
        api,
        &[("z", &["z-index"])],
        MatchOptions::new(values).types(&[ValueType::Number]).negative(),
    );
    Ok(())
}

pub(super) fn display(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_utilities_css(
        ".block { display: block }
        .inline-block { display: inline-block }
        .inline { display: inline }
        .flex { display: flex }
        .inline-flex { display: inline-flex }
        .table { display: table }
        .grid { display: grid }
        .inline-grid { display: inline-grid }
        .contents { display: contents }
        .hidden { display: none }",
        RuleOptions::default(),
    )
}

pub(super) fn flex_direction(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_utilities_css(
        ".flex-row { flex-direction: row }
        .flex-row-reverse { flex-direction: row-reverse }
        .flex-col { flex-direction: column }
        .flex-col-reverse { flex-direction: column-reverse }",
        RuleOptions::default(),
    )
}

pub(super) fn align_items(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_utilities_css(
        ".items-start { align-items: flex-start }
        .items-end { align-items: flex-end }
        .items-center { align-items: center }
        .items-baseline { align-items: baseline }
        .items-stretch { align-items: stretch }",
        RuleOptions::default(),
    )
}

pub(super) fn justify_content(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_utilities_css(
        ".justify-start { justify-content: flex-start }
        .justify-end { justify-content: flex-end }
        .justify-center { justify-content: center }
        .justify-between { justify-content: space-between }
        .justify-around { justify-content: space-around }
        .justify-evenly { justify-content: space-evenly }",
        RuleOptions::default(),
    )
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::context::Context;
    use crate::css::to_css;

    fn css(config: Config, candidate: &str) -> String {
        let mut context = Context::new(config, &[]).expect("context should build");
        let nodes: Vec<_> = context
            .resolve(candidate)
            .map(|rules| rules.iter().map(|rule| rule.node.clone()).collect())
            .unwrap_or_default();
        to_css(&nodes, true)
    }

    #[test]
    fn container_caps_width_per_screen() {
        let css = css(Config::default(), "container");
        assert!(css.starts_with(".container{width:100%}@media (min-width: 640px){.container{max-width:640px}}"));
        assert!(css.ends_with("@media (min-width: 1536px){.container{max-width:1536px}}"));
    }

    #[test]
    fn container_reads_center_and_padding() {
        let config = crate::config::parse(
            "[theme.extend.container]\ncenter = true\npadding = \"2rem\"\n",
        )
        .expect("config should parse");
        assert!(css(config, "container").starts_with(
            ".container{width:100%;margin-right:auto;margin-left:auto;padding-right:2rem;padding-left:2rem}"
        ));
    }

    #[test]
    fn inset_accepts_fractions_and_negatives() {
        assert_eq!(
            css(Config::default(), "inset-x-1/2"),
            ".inset-x-1\\/2{left:50%;right:50%}"
        );
        assert_eq!(css(Config::default(), "-top-2"), ".-top-2{top:-0.5rem}");
        assert_eq!(css(Config::default(), "-inset-auto"), "");
    }

    #[test]
    fn statics_ignore_modifiers() {
        assert_eq!(css(Config::default(), "hidden"), ".hidden{display:none}");
        assert_eq!(css(Config::default(), "fixed"), ".fixed{position:fixed}");
        assert_eq!(css(Config::default(), "fixed-4"), "");
    }
}
