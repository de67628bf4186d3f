use ironwind::config::Important;
use ironwind::context::Context;
use ironwind::registry::{
    CssObject, DynamicRule, MatchContext, Plugin, PluginApi, RuleOptions, UtilityResult,
    VariantFn, VariantInput,
};
use ironwind::sort::Layer;
use ironwind::{Config, ContextStore, Error, build_css, build_css_with};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;

const UTILITIES: &str = "@tailwind utilities;";

fn build(css: &str, candidates: &[&str]) -> ironwind::Result<String> {
    build_with_config(css, candidates, &Config::default())
}

fn build_with_config(css: &str, candidates: &[&str], config: &Config) -> ironwind::Result<String> {
    let mut store = ContextStore::new();
    build_css(css, candidates, &mut store, "app.css", config, true)
}

#[test]
fn plain_hover_and_responsive_rules_in_order() {
    let css = build(UTILITIES, &["md:font-bold", "hover:font-bold", "font-bold"])
        .expect("build should succeed");
    assert_eq!(
        css,
        ".font-bold{font-weight:700}\
         .hover\\:font-bold:hover{font-weight:700}\
         @media (min-width: 768px){.md\\:font-bold{font-weight:700}}"
    );
}

#[test]
fn pretty_output_separates_rules() {
    let mut store = ContextStore::new();
    let css = build_css(
        UTILITIES,
        ["font-bold", "md:font-bold"],
        &mut store,
        "app.css",
        &Config::default(),
        false,
    )
    .expect("build should succeed");
    assert_eq!(
        css,
        ".font-bold {\n  font-weight: 700;\n}\n\n\
         @media (min-width: 768px) {\n  .md\\:font-bold {\n    font-weight: 700;\n  }\n}\n"
    );
}

#[test]
fn negative_arbitrary_and_opacity_values() {
    assert_eq!(
        build(UTILITIES, &["-mt-4"]).expect("build"),
        ".-mt-4{margin-top:-1rem}"
    );
    assert_eq!(
        build(UTILITIES, &["top-[13px]"]).expect("build"),
        ".top-\\[13px\\]{top:13px}"
    );
    assert_eq!(
        build(UTILITIES, &["bg-red-500"]).expect("build"),
        ".bg-red-500{--tw-bg-opacity:1;background-color:rgba(239, 68, 68, var(--tw-bg-opacity))}"
    );
    assert_eq!(
        build(UTILITIES, &["bg-red-500/50"]).expect("build"),
        ".bg-red-500\\/50{background-color:rgba(239, 68, 68, 0.5)}"
    );
}

#[test]
fn alpha_value_colors_take_the_opacity_in_place() {
    let config = ironwind::config::parse(
        "[theme.extend.colors]\nbrand = \"rgb(10 20 30 / <alpha-value>)\"\n",
    )
    .expect("config should parse");
    assert_eq!(
        build_with_config(UTILITIES, &["bg-brand"], &config).expect("build"),
        ".bg-brand{--tw-bg-opacity:1;background-color:rgb(10 20 30 / var(--tw-bg-opacity))}"
    );
    assert_eq!(
        build_with_config(UTILITIES, &["bg-brand/50"], &config).expect("build"),
        ".bg-brand\\/50{background-color:rgb(10 20 30 / 0.5)}"
    );
}

#[test]
fn apply_merges_utilities_into_the_rule() {
    let css = build(
        "@tailwind utilities;\n.btn { @apply bg-blue-500 px-4; }",
        &[],
    )
    .expect("build should succeed");
    assert_eq!(
        css,
        ".btn{padding-left:1rem;padding-right:1rem;\
         --tw-bg-opacity:1;background-color:rgba(59, 130, 246, var(--tw-bg-opacity))}"
    );
    assert!(!css.contains("@apply"));
}

#[test]
fn layer_components_can_be_applied_and_generated() {
    let css = build(
        "@tailwind components;\n@tailwind utilities;\n\
         @layer components { .card { padding: 2rem } }\n\
         .panel { @apply card font-bold; }",
        &["card"],
    )
    .expect("build should succeed");
    assert_eq!(
        css,
        ".card{padding:2rem}.panel{padding:2rem;font-weight:700}"
    );
}

#[test]
fn circular_apply_is_an_error() {
    let err = build(
        "@tailwind components;\n@layer components { .a { @apply b; } .b { @apply a; } }",
        &["a", "b"],
    )
    .unwrap_err();
    assert!(matches!(err, Error::CircularApply { .. }), "got {:?}", err);
}

#[test]
fn apply_inside_screen_or_media_is_an_error() {
    assert_eq!(
        build("@tailwind utilities;\n@screen md { @apply font-bold; }", &[]),
        Err(Error::ApplyInScreen {
            suggestion: "md:font-bold".to_string()
        })
    );
    assert_eq!(
        build("@tailwind utilities;\n@media print { @apply font-bold; }", &[]),
        Err(Error::ApplyInAtRule {
            name: "media".to_string()
        })
    );
}

#[test]
fn apply_outside_a_rule_is_an_error() {
    assert_eq!(
        build("@tailwind utilities;\n@apply font-bold;", &[]),
        Err(Error::ApplyOutsideRule {
            params: "font-bold".to_string()
        })
    );
    assert_eq!(
        build("@tailwind utilities;\n@apply does-not-exist;", &[]),
        Err(Error::UnknownApplyCandidate {
            candidate: "does-not-exist".to_string()
        })
    );
}

#[test]
fn font_faces_are_kept_apart() {
    let css = build(
        "@font-face { font-family: a }\n@font-face { font-family: b }\n@tailwind utilities;",
        &["font-bold"],
    )
    .expect("build should succeed");
    assert_eq!(
        css,
        "@font-face{font-family:a}@font-face{font-family:b}.font-bold{font-weight:700}"
    );
}

#[test]
fn registration_order_decides_output_order() {
    let css = build(UTILITIES, &["bg-red-500", "sr-only"]).expect("build should succeed");
    let sr_only = css.find(".sr-only{").expect("sr-only is generated");
    let bg = css.find(".bg-red-500{").expect("bg-red-500 is generated");
    assert!(sr_only < bg);
}

#[test]
fn hover_inside_a_breakpoint() {
    assert_eq!(
        build(UTILITIES, &["lg:hover:bg-red-500", "hover:bg-red-500"]).expect("build"),
        ".hover\\:bg-red-500:hover{--tw-bg-opacity:1;background-color:rgba(239, 68, 68, var(--tw-bg-opacity))}\
         @media (min-width: 1024px){.lg\\:hover\\:bg-red-500:hover{--tw-bg-opacity:1;background-color:rgba(239, 68, 68, var(--tw-bg-opacity))}}"
    );
}

// Variants sort by registration, not by the order they are written in.
#[test]
fn written_variant_order_does_not_change_nesting() {
    assert_eq!(
        build(UTILITIES, &["hover:md:font-bold"]).expect("build"),
        "@media (min-width: 768px){.hover\\:md\\:font-bold:hover{font-weight:700}}"
    );
    assert_eq!(
        build(UTILITIES, &["md:hover:font-bold", "hover:md:font-bold"]).expect("build"),
        "@media (min-width: 768px){\
         .md\\:hover\\:font-bold:hover{font-weight:700}\
         .hover\\:md\\:font-bold:hover{font-weight:700}}"
    );
}

#[test]
fn important_modes() {
    let scoped = Config {
        important: Important::Selector("#app".to_string()),
        ..Config::default()
    };
    assert_eq!(
        build_with_config(UTILITIES, &["hover:font-bold"], &scoped).expect("build"),
        "#app .hover\\:font-bold:hover{font-weight:700}"
    );
    assert_eq!(
        build(UTILITIES, &["!font-bold"]).expect("build"),
        ".\\!font-bold{font-weight:700!important}"
    );
}

#[test]
fn prefix_and_separator_from_config() {
    let config = ironwind::config::parse("prefix = \"tw-\"\nseparator = \"_\"\n")
        .expect("config should parse");
    assert_eq!(
        build_with_config(UTILITIES, &["hover_tw-font-bold", "font-bold"], &config)
            .expect("build"),
        ".hover_tw-font-bold:hover{font-weight:700}"
    );
}

#[test]
fn dash_separator_is_rejected() {
    let config = Config {
        separator: "-".to_string(),
        ..Config::default()
    };
    assert_eq!(
        build_with_config(UTILITIES, &["font-bold"], &config),
        Err(Error::InvalidSeparator {
            separator: "-".to_string()
        })
    );
}

#[test]
fn layer_needs_its_tailwind_directive() {
    assert_eq!(
        build("@layer utilities { .x { color: red } }", &["x"]),
        Err(Error::MissingTailwindDirective {
            directive: "layer".to_string(),
            layer: "utilities".to_string()
        })
    );
}

#[test]
fn base_rules_only_with_base_directive() {
    let with_base = build("@tailwind base;", &[]).expect("build should succeed");
    assert!(with_base.contains("box-sizing:border-box"));
    let without = build(UTILITIES, &[]).expect("build should succeed");
    assert_eq!(without, "");
}

fn counting_plugin(calls: Rc<Cell<usize>>) -> Plugin {
    Rc::new(move |api: &mut PluginApi<'_>| {
        let calls = Rc::clone(&calls);
        let rule: DynamicRule = Rc::new(move |modifier: &str, _: &MatchContext<'_>| {
            calls.set(calls.get() + 1);
            UtilityResult::Single(CssObject::rule(
                format!(".tick-{}", modifier),
                CssObject::new().decl("order", modifier),
            ))
        });
        api.add_dynamic(Layer::Utilities, "tick", rule, RuleOptions::default());
        Ok(())
    })
}

#[test]
fn repeated_builds_reuse_cached_rules() {
    let calls = Rc::new(Cell::new(0));
    let plugins = [counting_plugin(Rc::clone(&calls))];
    let config = Config::default();
    let mut store = ContextStore::new();

    let first = build_css_with(UTILITIES, ["tick-1"], &mut store, "a.css", &config, &plugins, true)
        .expect("build should succeed");
    let second = build_css_with(UTILITIES, ["tick-1"], &mut store, "a.css", &config, &plugins, true)
        .expect("build should succeed");

    assert_eq!(first, ".tick-1{order:1}");
    assert_eq!(first, second);
    assert_eq!(calls.get(), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn sources_with_the_same_config_share_a_context() {
    let config = Config::default();
    let mut store = ContextStore::new();
    build_css(UTILITIES, ["font-bold"], &mut store, "a.css", &config, true).expect("build");
    build_css(UTILITIES, ["nope-nope"], &mut store, "b.css", &config, true).expect("build");

    let hash = config.hash_with("");
    assert_eq!(store.len(), 1);
    assert_eq!(store.refcount(hash), 2);

    let context = store
        .get_or_create("b.css", hash, || -> ironwind::Result<Context> {
            panic!("context should already exist")
        })
        .expect("context exists");
    let context = context.borrow();
    assert!(context.is_cached("font-bold"));
    assert!(context.is_known_non_class("nope-nope"));
    drop(context);

    assert!(store.evict("a.css"));
    assert!(store.evict("b.css"));
    assert!(store.is_empty());
}

fn noop_variant() -> VariantFn {
    Rc::new(|input: &VariantInput<'_>| Some(input.node.clone()))
}

#[test]
fn variant_count_is_bounded() {
    let plugin: Plugin = Rc::new(|api: &mut PluginApi<'_>| {
        for idx in 0..64 {
            api.add_variant(&format!("v{}", idx), noop_variant())?;
        }
        Ok(())
    });
    let mut store = ContextStore::new();
    let err = build_css_with(
        UTILITIES,
        ["font-bold"],
        &mut store,
        "a.css",
        &Config::default(),
        &[plugin],
        true,
    )
    .unwrap_err();
    assert_eq!(err, Error::TooManyVariants { limit: 64 });
}

#[test]
fn plugin_variants_apply_to_core_utilities() {
    let plugin: Plugin = Rc::new(|api: &mut PluginApi<'_>| {
        let apply: VariantFn = Rc::new(|input: &VariantInput<'_>| {
            Some(input.node.clone().wrap("supports", "(display: grid)"))
        });
        api.add_variant("supports-grid", apply)
    });
    let mut store = ContextStore::new();
    let css = build_css_with(
        UTILITIES,
        ["supports-grid:hidden"],
        &mut store,
        "a.css",
        &Config::default(),
        &[plugin],
        true,
    )
    .expect("build should succeed");
    assert_eq!(
        css,
        "@supports (display: grid){.supports-grid\\:hidden{display:none}}"
    );
}
