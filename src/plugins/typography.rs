use super::{match_color, match_properties};
use crate::error::Result;
use crate::registry::{CssObject, MatchContext, MatchFn, MatchOptions, PluginApi};
use crate::theme::ValueMap;
use crate::values::ValueType;
use std::collections::HashMap;
use std::rc::Rc;

pub(super) fn font_family(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("fontFamily");
    match_properties(
        api,
        &[("font", &["font-family"])],
        MatchOptions::new(values).types(&[ValueType::Lookup]),
    );
    Ok(())
}

/// `text-{size}` sets the font size and, when the theme pairs one with it,
/// the line height.
pub(super) fn font_size(api: &mut PluginApi<'_>) -> Result<()> {
    let mut sizes = ValueMap::default();
    let mut line_heights: HashMap<String, String> = HashMap::new();
    for (key, items) in api.theme().list("fontSize") {
        let Some(size) = items.first() else {
            continue;
        };
        if let Some(line_height) = items.get(1) {
            line_heights.insert(size.clone(), line_height.clone());
        }
        sizes.insert(key, size.clone());
    }

    let text: MatchFn = Rc::new(move |value: &str, _: &MatchContext<'_>| {
        let object = CssObject::new().decl("font-size", value);
        match line_heights.get(value) {
            Some(line_height) => object.decl("line-height", line_height.as_str()),
            None => object,
        }
    });
    api.match_utilities(
        vec![("text", text)],
        MatchOptions::new(sizes).types(&[ValueType::Length, ValueType::Percentage]),
    );
    Ok(())
}

pub(super) fn font_weight(api: &mut PluginApi<'_>) -> Result<()> {
    let values = api.theme().flat("fontWeight");
    match_properties(
        api,
        &[("font", &["font-weight"])],
        MatchOptions::new(values).types(&[ValueType::Number]),
    );
    Ok(())
}

pub(super) fn text_align(api: &mut PluginApi<'_>) -> Result<()> {
    api.add_utilities_css(
        ".text-left { text-align: left }
        .text-center { text-align: center }
        .text-right { text-align: right }
        .text-justify { text-align: justify }",
        Default::default(),
    )
}

pub(super) fn text_color(api: &mut PluginApi<'_>) -> Result<()> {
    match_color(api, "text", "color", Some("--tw-text-opacity"));
    Ok(())
}

/// `content-[..]` for `before:` and `after:` pseudo-elements.
pub(super) fn content(api: &mut PluginApi<'_>) -> Result<()> {
    let values: ValueMap = [("none", "none")].into_iter().collect();
    match_properties(api, &[("content", &["content"])], MatchOptions::new(values));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::context::Context;
    use crate::css::to_css;

    fn css(candidate: &str) -> String {
        let mut context = Context::new(Config::default(), &[]).expect("context should build");
        let nodes: Vec<_> = context
            .resolve(candidate)
            .map(|rules| rules.iter().map(|rule| rule.node.clone()).collect())
            .unwrap_or_default();
        to_css(&nodes, true)
    }

    #[test]
    fn font_root_picks_family_or_weight() {
        assert_eq!(css("font-bold"), ".font-bold{font-weight:700}");
        assert!(css("font-mono").starts_with(".font-mono{font-family:ui-monospace, SFMono-Regular"));
        assert_eq!(css("font-[550]"), ".font-\\[550\\]{font-weight:550}");
    }

    #[test]
    fn text_root_picks_size_or_color() {
        assert_eq!(css("text-sm"), ".text-sm{font-size:0.875rem;line-height:1.25rem}");
        assert_eq!(css("text-[22px]"), ".text-\\[22px\\]{font-size:22px}");
        assert_eq!(
            css("text-white"),
            ".text-white{--tw-text-opacity:1;color:rgba(255, 255, 255, var(--tw-text-opacity))}"
        );
        assert_eq!(css("text-center"), ".text-center{text-align:center}");
    }

    #[test]
    fn content_takes_arbitrary_strings() {
        assert_eq!(css("content-['hi']"), ".content-\\[\\'hi\\'\\]{content:'hi'}");
    }
}
