//! Template scanning: walks content globs and pulls every token that could
//! be a class candidate. Extraction is deliberately broad; tokens that are
//! not utilities are dropped later by the resolver and its negative cache.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Whole tokens, including arbitrary values with quotes (`content-['x']`)
/// and brackets (`bg-[url(/a.png)]`).
static BROAD_MATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"[^<>"'`\s]*\['[^"'`\s]*'\]"#,
        r#"|[^<>"'`\s]*\["[^"'`\s]*"\]"#,
        r#"|[^<>"'`\s]*\[[^<>"'`\s]*:'[^"'`\s]*'\]"#,
        r#"|[^<>"'`\s]*\[[^"'`\s]+\][^<>"'`\s]*"#,
        r#"|[^<>"'`\s]*[^<>"'`\s:]"#,
    ))
    .expect("broad extractor pattern is valid")
});

/// Tokens nested in punctuation, such as `p-4` in `{p-4}` or `(p-4)`.
static INNER_MATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^<>"'`\s.(){}\[\]#=%]*[^<>"'`\s.(){}\[\]#=%:]"#)
        .expect("inner extractor pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Candidates in first-seen order.
    pub candidates: Vec<String>,
    pub files_scanned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub base_path: PathBuf,
    pub respect_gitignore: bool,
    pub include_node_modules: bool,
    pub include_binary_files: bool,
    pub include_css_files: bool,
    pub include_lock_files: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            respect_gitignore: true,
            include_node_modules: false,
            include_binary_files: false,
            include_css_files: false,
            include_lock_files: false,
        }
    }
}

/// Every candidate in `text`, deduplicated, in order of appearance.
pub fn extract_candidates(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in BROAD_MATCH
        .find_iter(text)
        .chain(INNER_MATCH.find_iter(text))
        .map(|found| found.as_str())
    {
        if is_plausible(token) && seen.insert(token) {
            out.push(token.to_string());
        }
    }
    out
}

fn is_plausible(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 256
        && token.chars().any(|ch| ch.is_ascii_alphabetic())
        && !token.contains("//")
}

/// Scans files and directories given directly.
pub fn scan(paths: &[PathBuf]) -> Result<ScanResult> {
    let mut result = ScanResult {
        candidates: Vec::new(),
        files_scanned: 0,
    };
    let mut seen = HashSet::new();
    for path in paths {
        scan_path(path, &mut result, &mut seen)?;
    }
    tracing::debug!(
        files = result.files_scanned,
        candidates = result.candidates.len(),
        "scan finished"
    );
    Ok(result)
}

/// Scans every file under `options.base_path` matching one of `patterns`
/// and none of `ignore_patterns`.
pub fn scan_globs(
    patterns: &[String],
    ignore_patterns: &[String],
    options: &ScanOptions,
) -> Result<ScanResult> {
    if patterns.is_empty() {
        return Err(Error::Scan {
            message: "no content patterns given".to_string(),
        });
    }

    let include = build_globset(patterns)?;
    let exclude = build_globset(ignore_patterns)?;
    let mut paths = Vec::new();

    let walker = WalkBuilder::new(&options.base_path)
        .hidden(false)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .build();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::trace!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(&options.base_path).unwrap_or(path);
        let matches = |set: &GlobSet| set.is_match(relative) || set.is_match(path);
        if !matches(&include) || matches(&exclude) || should_skip(path, options) {
            continue;
        }
        paths.push(path.to_path_buf());
    }

    scan(&paths)
}

/// Scans a mix of plain paths and glob patterns, as given on the command
/// line. Plain paths are read directly, globs are walked from
/// `options.base_path`.
pub fn scan_inputs(
    inputs: &[String],
    ignore_patterns: &[String],
    options: &ScanOptions,
) -> Result<ScanResult> {
    let (globs, paths): (Vec<String>, Vec<String>) =
        inputs.iter().cloned().partition(|input| is_glob(input));

    let mut result = scan(&paths.iter().map(PathBuf::from).collect::<Vec<_>>())?;
    if globs.is_empty() {
        return Ok(result);
    }
    let walked = scan_globs(&globs, ignore_patterns, options)?;
    let mut seen: HashSet<String> = result.candidates.iter().cloned().collect();
    result.files_scanned += walked.files_scanned;
    for candidate in walked.candidates {
        if seen.insert(candidate.clone()) {
            result.candidates.push(candidate);
        }
    }
    Ok(result)
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '[', '{'])
}

fn scan_path(path: &Path, result: &mut ScanResult, seen: &mut HashSet<String>) -> Result<()> {
    if path.is_dir() {
        let entries = fs::read_dir(path).map_err(|err| Error::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        for entry in entries.flatten() {
            scan_path(&entry.path(), result, seen)?;
        }
        return Ok(());
    }
    if !path.is_file() {
        return Err(Error::Scan {
            message: format!("path not found: {}", path.display()),
        });
    }

    // Binary or non-UTF-8 files carry no candidates.
    let Ok(text) = fs::read_to_string(path) else {
        return Ok(());
    };
    result.files_scanned += 1;
    for candidate in extract_candidates(&text) {
        if seen.insert(candidate.clone()) {
            result.candidates.push(candidate);
        }
    }
    Ok(())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| Error::Scan {
            message: format!("invalid glob `{}`: {}", pattern, err),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| Error::Scan {
        message: err.to_string(),
    })
}

const CSS_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl", "pcss"];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "bmp", "avif", "mp4", "mov", "webm", "mp3", "wav",
    "zip", "gz", "tgz", "pdf", "woff", "woff2", "ttf", "otf", "eot",
];

const LOCK_FILES: &[&str] = &[
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "bun.lockb",
    "Cargo.lock",
    "composer.lock",
    "Gemfile.lock",
    "poetry.lock",
];

fn should_skip(path: &Path, options: &ScanOptions) -> bool {
    if !options.include_node_modules
        && path
            .components()
            .any(|component| component.as_os_str() == "node_modules")
    {
        return true;
    }

    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
    if !options.include_lock_files && LOCK_FILES.contains(&file_name) {
        return true;
    }

    let Some(ext) = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
    else {
        return false;
    };
    (!options.include_css_files && CSS_EXTENSIONS.contains(&ext.as_str()))
        || (!options.include_binary_files && BINARY_EXTENSIONS.contains(&ext.as_str()))
}
