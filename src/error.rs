use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(
        "The `{candidate}` class does not exist. If `{candidate}` is a custom class, make sure it is defined within a `@layer` directive."
    )]
    UnknownApplyCandidate { candidate: String },

    #[error("@apply should not be used with the '{candidate}' utility")]
    ApplyGroupUtility { candidate: String },

    #[error(
        "@apply is not supported within nested at-rules like @screen. We suggest you write this as @apply {suggestion} instead."
    )]
    ApplyInScreen { suggestion: String },

    #[error(
        "@apply is not supported within nested at-rules like @{name}. You can fix this by un-nesting @{name}."
    )]
    ApplyInAtRule { name: String },

    #[error("@apply must be used inside a rule, found `@apply {params}` at the root")]
    ApplyOutsideRule { params: String },

    #[error("You cannot `@apply` the `{candidate}` utility here because it creates a circular dependency.")]
    CircularApply { candidate: String },

    #[error("@apply did not settle after {passes} passes")]
    ApplyDidNotConverge { passes: usize },

    #[error("`@{directive}` is used but no matching `@tailwind {layer}` directive is present.")]
    MissingTailwindDirective { directive: String, layer: String },

    #[error(
        "The '{separator}' character cannot be used as a custom separator due to parsing ambiguity. Please use another character like '_' instead."
    )]
    InvalidSeparator { separator: String },

    #[error("Too many variants: at most {limit} variants can be registered")]
    TooManyVariants { limit: usize },

    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("failed to access {path}: {message}")]
    Io { path: String, message: String },

    #[error("{message}")]
    Scan { message: String },
}
