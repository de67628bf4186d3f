//! Turning utility modifiers into CSS values: theme lookups, arbitrary
//! `[..]` values, negation, and color/opacity handling.

use crate::theme::ValueMap;

/// What kind of arbitrary value a utility accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Any,
    Color,
    Length,
    Number,
    Percentage,
    /// Theme keys only; arbitrary values are rejected.
    Lookup,
}

impl ValueType {
    pub fn accepts(self, value: &str) -> bool {
        match self {
            ValueType::Any => true,
            ValueType::Color => is_color(value),
            ValueType::Length => is_length(value),
            ValueType::Number => is_number(value),
            ValueType::Percentage => is_percentage(value),
            ValueType::Lookup => false,
        }
    }
}

/// Inner text of an arbitrary `[..]` modifier.
pub fn arbitrary(modifier: &str) -> Option<&str> {
    let inner = modifier.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() { None } else { Some(inner) }
}

/// Underscores stand for spaces in arbitrary values; `\_` keeps a literal
/// underscore.
pub fn normalize_arbitrary(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'_') => {
                out.push('_');
                let _ = chars.next();
            }
            '_' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

/// Theme lookup, or an arbitrary value that one of `types` accepts.
pub fn coerce_value(modifier: &str, values: &ValueMap, types: &[ValueType]) -> Option<String> {
    if let Some(inner) = arbitrary(modifier) {
        let value = normalize_arbitrary(inner);
        return types
            .iter()
            .any(|kind| kind.accepts(&value))
            .then_some(value);
    }
    values.get(modifier).map(str::to_string)
}

/// Resolves a color modifier. An exact key wins, so a palette key that
/// contains a slash is never read as an opacity suffix.
pub fn as_color(modifier: &str, colors: &ValueMap, opacities: &ValueMap) -> Option<String> {
    if let Some(color) = colors.get(modifier) {
        return Some(color.to_string());
    }

    if let Some(slash) = last_top_level_slash(modifier) {
        let (color_key, alpha_key) = (&modifier[..slash], &modifier[slash + 1..]);
        let color = match arbitrary(color_key) {
            Some(inner) => {
                let value = normalize_arbitrary(inner);
                is_color(&value).then_some(value)?
            }
            None => colors.get(color_key)?.to_string(),
        };
        let alpha = match arbitrary(alpha_key) {
            Some(inner) => normalize_arbitrary(inner),
            None => opacities.get(alpha_key)?.to_string(),
        };
        return Some(with_alpha_value(&color, &alpha));
    }

    let inner = arbitrary(modifier)?;
    let value = normalize_arbitrary(inner);
    is_color(&value).then_some(value)
}

fn last_top_level_slash(modifier: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut found = None;
    for (idx, ch) in modifier.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            '/' if depth == 0 => found = Some(idx),
            _ => {}
        }
    }
    found
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: Option<String>,
}

pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    match value {
        "black" => return Some(Rgb { r: 0, g: 0, b: 0, alpha: None }),
        "white" => return Some(Rgb { r: 255, g: 255, b: 255, alpha: None }),
        _ => {}
    }

    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let (channels, slash_alpha) = match inner.split_once('/') {
        Some((channels, alpha)) => (channels, Some(alpha.trim().to_string())),
        None => (inner, None),
    };
    let parts: Vec<&str> = channels
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    let channel = |part: &str| part.parse::<u8>().ok();
    match parts.as_slice() {
        [r, g, b] => Some(Rgb {
            r: channel(r)?,
            g: channel(g)?,
            b: channel(b)?,
            alpha: slash_alpha,
        }),
        [r, g, b, a] if slash_alpha.is_none() => Some(Rgb {
            r: channel(r)?,
            g: channel(g)?,
            b: channel(b)?,
            alpha: Some((*a).to_string()),
        }),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|ch| [ch, ch]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };
    let byte = |idx: usize| u8::from_str_radix(&expanded[idx..idx + 2], 16).ok();
    let alpha = if expanded.len() == 8 {
        let raw = byte(6)?;
        Some(format_alpha(f64::from(raw) / 255.0))
    } else {
        None
    };
    Some(Rgb {
        r: byte(0)?,
        g: byte(2)?,
        b: byte(4)?,
        alpha,
    })
}

fn format_alpha(alpha: f64) -> String {
    format!("{}", (alpha * 100.0).round() / 100.0)
}

/// Applies a fixed alpha to a color. Colors written as templates with
/// `<alpha-value>` receive the alpha in place; plain colors become `rgba()`.
pub fn with_alpha_value(color: &str, alpha: &str) -> String {
    if color.contains("<alpha-value>") {
        return color.replace("<alpha-value>", alpha);
    }
    match parse_color(color) {
        Some(rgb) if rgb.alpha.is_none() => {
            format!("rgba({}, {}, {}, {})", rgb.r, rgb.g, rgb.b, alpha)
        }
        _ => color.to_string(),
    }
}

/// Declarations for a color utility whose opacity can be adjusted through a
/// CSS variable (`--tw-bg-opacity`).
pub fn with_alpha_variable(color: &str, property: &str, variable: &str) -> Vec<(String, String)> {
    if color.contains("<alpha-value>") {
        return vec![
            (variable.to_string(), "1".to_string()),
            (
                property.to_string(),
                color.replace("<alpha-value>", &format!("var({})", variable)),
            ),
        ];
    }
    match parse_color(color) {
        Some(rgb) if rgb.alpha.is_none() => vec![
            (variable.to_string(), "1".to_string()),
            (
                property.to_string(),
                format!("rgba({}, {}, {}, var({}))", rgb.r, rgb.g, rgb.b, variable),
            ),
        ],
        _ => vec![(property.to_string(), color.to_string())],
    }
}

/// Flips the sign of a value. Zero stays as is; values that cannot carry a
/// sign directly are wrapped in `calc()`. Keywords such as `auto` cannot be
/// negated.
pub fn negate_value(value: &str) -> Option<String> {
    let value = value.trim();
    if let Some(positive) = value.strip_prefix('-') {
        return Some(positive.to_string());
    }
    if is_zero(value) {
        return Some(value.to_string());
    }
    let first = value.chars().next()?;
    if first.is_ascii_digit() || first == '.' {
        return Some(format!("-{}", value));
    }
    if ["calc(", "var(", "min(", "max(", "clamp("]
        .iter()
        .any(|func| value.starts_with(func))
    {
        return Some(format!("calc({} * -1)", value));
    }
    None
}

fn is_zero(value: &str) -> bool {
    let digits = value.trim_end_matches(|ch: char| ch.is_ascii_alphabetic() || ch == '%');
    !digits.is_empty() && digits.parse::<f64>().map(|n| n == 0.0).unwrap_or(false)
}

/// Class name for a utility id and modifier: `DEFAULT` is the bare id,
/// negative modifiers move the sign in front of the id.
pub fn name_class(id: &str, modifier: &str) -> String {
    if modifier == "DEFAULT" {
        return id.to_string();
    }
    if modifier == "-" {
        return format!("-{}", id);
    }
    if let Some(rest) = modifier.strip_prefix('-') {
        return format!("-{}-{}", id, rest);
    }
    format!("{}-{}", id, modifier)
}

const LENGTH_UNITS: &[&str] = &[
    "px", "rem", "em", "%", "vh", "vw", "vmin", "vmax", "ch", "ex", "cm", "mm", "in", "pt", "pc",
];

const CSS_FUNCTIONS: &[&str] = &["calc(", "var(", "min(", "max(", "clamp("];

pub fn is_length(value: &str) -> bool {
    if value == "0" || CSS_FUNCTIONS.iter().any(|func| value.starts_with(func)) {
        return true;
    }
    value.split_whitespace().all(|part| {
        LENGTH_UNITS.iter().any(|unit| {
            part.strip_suffix(unit)
                .map(|number| number.parse::<f64>().is_ok())
                .unwrap_or(false)
        })
    }) && !value.trim().is_empty()
}

pub fn is_number(value: &str) -> bool {
    value.parse::<f64>().is_ok() || value.starts_with("calc(") || value.starts_with("var(")
}

pub fn is_percentage(value: &str) -> bool {
    value
        .strip_suffix('%')
        .map(|number| number.parse::<f64>().is_ok())
        .unwrap_or(false)
}

const NAMED_COLORS: &[&str] = &[
    "transparent",
    "currentColor",
    "currentcolor",
    "black",
    "white",
    "red",
    "green",
    "blue",
    "yellow",
    "orange",
    "purple",
    "pink",
    "gray",
    "grey",
    "inherit",
];

pub fn is_color(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|ch| ch.is_ascii_hexdigit());
    }
    ["rgb(", "rgba(", "hsl(", "hsla(", "var("]
        .iter()
        .any(|func| value.starts_with(func) && value.ends_with(')'))
        || NAMED_COLORS.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::{
        ValueType, as_color, coerce_value, name_class, negate_value, normalize_arbitrary,
        parse_color, with_alpha_value, with_alpha_variable,
    };
    use crate::theme::ValueMap;

    fn colors() -> ValueMap {
        [
            ("red-500", "#ef4444"),
            ("brand", "rgb(10 20 30 / <alpha-value>)"),
            ("half/white", "#ffffff80"),
        ]
        .into_iter()
        .collect()
    }

    fn opacities() -> ValueMap {
        [("50", "0.5"), ("75", "0.75")].into_iter().collect()
    }

    #[test]
    fn arbitrary_values_are_validated_per_type() {
        let values = ValueMap::default();
        assert_eq!(
            coerce_value("[13px]", &values, &[ValueType::Length]),
            Some("13px".to_string())
        );
        assert_eq!(coerce_value("[red]", &values, &[ValueType::Length]), None);
        assert_eq!(coerce_value("[13px]", &values, &[ValueType::Lookup]), None);
        assert_eq!(
            coerce_value("[calc(100%_-_1rem)]", &values, &[ValueType::Length]),
            Some("calc(100% - 1rem)".to_string())
        );
    }

    #[test]
    fn underscores_become_spaces_unless_escaped() {
        assert_eq!(normalize_arbitrary("a_b\\_c"), "a b_c");
    }

    #[test]
    fn plain_colors_get_rgba_alpha() {
        assert_eq!(
            as_color("red-500/50", &colors(), &opacities()),
            Some("rgba(239, 68, 68, 0.5)".to_string())
        );
        assert_eq!(
            as_color("red-500/[.35]", &colors(), &opacities()),
            Some("rgba(239, 68, 68, .35)".to_string())
        );
        assert_eq!(as_color("red-500/33", &colors(), &opacities()), None);
    }

    #[test]
    fn template_colors_receive_alpha_in_place() {
        assert_eq!(
            as_color("brand/75", &colors(), &opacities()),
            Some("rgb(10 20 30 / 0.75)".to_string())
        );
    }

    #[test]
    fn exact_keys_win_over_opacity_suffix() {
        assert_eq!(
            as_color("half/white", &colors(), &opacities()),
            Some("#ffffff80".to_string())
        );
    }

    #[test]
    fn alpha_variable_declarations() {
        assert_eq!(
            with_alpha_variable("#ef4444", "background-color", "--tw-bg-opacity"),
            vec![
                ("--tw-bg-opacity".to_string(), "1".to_string()),
                (
                    "background-color".to_string(),
                    "rgba(239, 68, 68, var(--tw-bg-opacity))".to_string()
                ),
            ]
        );
        assert_eq!(
            with_alpha_variable("currentColor", "color", "--tw-text-opacity"),
            vec![("color".to_string(), "currentColor".to_string())]
        );
        assert_eq!(with_alpha_value("#ffffff80", "0.5"), "#ffffff80");
    }

    #[test]
    fn parses_short_and_functional_colors() {
        let rgb = parse_color("#fff").expect("hex should parse");
        assert_eq!((rgb.r, rgb.g, rgb.b), (255, 255, 255));
        let rgb = parse_color("rgb(1, 2, 3)").expect("rgb should parse");
        assert_eq!((rgb.r, rgb.g, rgb.b), (1, 2, 3));
        assert!(parse_color("hsl(0 0% 0%)").is_none());
    }

    #[test]
    fn negation_rules() {
        assert_eq!(negate_value("1rem"), Some("-1rem".to_string()));
        assert_eq!(negate_value("-1rem"), Some("1rem".to_string()));
        assert_eq!(negate_value("0px"), Some("0px".to_string()));
        assert_eq!(
            negate_value("var(--gap)"),
            Some("calc(var(--gap) * -1)".to_string())
        );
        assert_eq!(negate_value("auto"), None);
    }

    #[test]
    fn class_names_place_the_sign_first() {
        assert_eq!(name_class("mt", "DEFAULT"), "mt");
        assert_eq!(name_class("mt", "4"), "mt-4");
        assert_eq!(name_class("mt", "-4"), "-mt-4");
        assert_eq!(name_class("border", "-"), "-border");
    }
}
