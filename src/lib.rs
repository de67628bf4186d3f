pub mod apply;
pub mod candidate;
pub mod config;
pub mod context;
pub mod css;
pub mod error;
pub mod plugins;
pub mod registry;
pub mod resolve;
pub mod scanner;
pub mod selector;
pub mod sort;
pub mod stylesheet;
pub mod theme;
pub mod values;

pub use config::Config;
pub use context::ContextStore;
pub use error::{Error, Result};
pub use stylesheet::{build_css, build_css_with};

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

const DEFAULT_INPUT_CSS: &str = "@tailwind base;\n@tailwind components;\n@tailwind utilities;\n";
const DEFAULT_CONFIG_FILE: &str = "ironwind.toml";
const DEFAULT_SOURCE_KEY: &str = "<default>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan {
        inputs: Vec<String>,
        ignore: Vec<String>,
    },
    Build(BuildOptions),
    Watch {
        build: BuildOptions,
        poll: bool,
        poll_interval_ms: u64,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub inputs: Vec<String>,
    pub out: Option<String>,
    pub input_css: Option<String>,
    pub minify: bool,
    pub config: Option<String>,
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    pub message: String,
}

impl From<Error> for CliError {
    fn from(err: Error) -> Self {
        CliError {
            message: err.to_string(),
        }
    }
}

pub fn run(command: Command) -> std::result::Result<(), CliError> {
    match command {
        Command::Scan { inputs, ignore } => run_scan(&inputs, &ignore),
        Command::Build(options) => {
            let mut store = ContextStore::new();
            run_build(&options, &mut store).map(|_| ())
        }
        Command::Watch {
            build,
            poll,
            poll_interval_ms,
        } => run_watch(&build, poll, poll_interval_ms),
        Command::Help => {
            print_help();
            Ok(())
        }
    }
}

pub fn run_from_env() -> std::result::Result<(), CliError> {
    let command = parse_args(env::args().skip(1))?;
    run(command)
}

pub fn parse_args<I>(args: I) -> std::result::Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = args.into_iter();
    let Some(cmd) = iter.next() else {
        return Ok(Command::Help);
    };

    match cmd.as_str() {
        "scan" => parse_scan_args(iter.collect()),
        "build" => parse_build_args(iter.collect(), false),
        "watch" => parse_build_args(iter.collect(), true),
        "-h" | "--help" | "help" => Ok(Command::Help),
        _ => Err(CliError {
            message: format!("unknown command: {}", cmd),
        }),
    }
}

fn parse_scan_args(args: Vec<String>) -> std::result::Result<Command, CliError> {
    let mut inputs = Vec::new();
    let mut ignore = Vec::new();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ignore" | "-I" => ignore.push(flag_value(&mut iter, "scan", "--ignore")?),
            _ => inputs.push(arg),
        }
    }

    if inputs.is_empty() {
        return Err(CliError {
            message: "scan requires at least one path or glob pattern".to_string(),
        });
    }
    Ok(Command::Scan { inputs, ignore })
}

/// `build` and `watch` share their flags; only `watch` accepts the polling
/// ones.
fn parse_build_args(args: Vec<String>, watch: bool) -> std::result::Result<Command, CliError> {
    let command = if watch { "watch" } else { "build" };
    let mut options = BuildOptions {
        inputs: Vec::new(),
        out: None,
        input_css: None,
        minify: false,
        config: None,
        ignore: Vec::new(),
    };
    let mut poll = false;
    let mut poll_interval_ms = 500;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--output" | "--out" | "-o" => {
                options.out = Some(flag_value(&mut iter, command, "--output")?)
            }
            "--input-css" | "-i" => {
                options.input_css = Some(flag_value(&mut iter, command, "--input-css")?)
            }
            "--config" | "-c" => options.config = Some(flag_value(&mut iter, command, "--config")?),
            "--ignore" | "-I" => options.ignore.push(flag_value(&mut iter, command, "--ignore")?),
            "--minify" => options.minify = true,
            "--poll" | "--poll-interval" if !watch => {
                return Err(CliError {
                    message: format!("{} is only supported with watch", arg),
                });
            }
            "--poll" => poll = true,
            "--poll-interval" => {
                let value = flag_value(&mut iter, command, "--poll-interval")?;
                poll = true;
                poll_interval_ms = parse_u64_arg(&value, "--poll-interval")?;
            }
            _ => options.inputs.push(arg),
        }
    }

    if options.inputs.is_empty() {
        return Err(CliError {
            message: format!("{} requires at least one path or glob pattern", command),
        });
    }

    if watch {
        Ok(Command::Watch {
            build: options,
            poll,
            poll_interval_ms,
        })
    } else {
        Ok(Command::Build(options))
    }
}

fn flag_value(
    iter: &mut impl Iterator<Item = String>,
    command: &str,
    flag: &str,
) -> std::result::Result<String, CliError> {
    iter.next().ok_or_else(|| CliError {
        message: format!("{} requires a value for {}", command, flag),
    })
}

fn parse_u64_arg(value: &str, flag: &str) -> std::result::Result<u64, CliError> {
    value.parse::<u64>().map_err(|_| CliError {
        message: format!("{} requires a positive integer, got '{}'", flag, value),
    })
}

fn run_scan(inputs: &[String], ignore: &[String]) -> std::result::Result<(), CliError> {
    let result = scanner::scan_inputs(inputs, ignore, &scanner::ScanOptions::default())?;
    let mut candidates = result.candidates;
    candidates.sort();

    for candidate in &candidates {
        println!("{}", candidate);
    }
    eprintln!(
        "scanned {} files, found {} candidates",
        result.files_scanned,
        candidates.len()
    );
    Ok(())
}

/// One build pass. The store keeps contexts, and with them every cached
/// candidate, alive between passes of a watch session.
fn run_build(
    options: &BuildOptions,
    store: &mut ContextStore,
) -> std::result::Result<String, CliError> {
    let started = Instant::now();
    let config = load_config(options.config.as_deref())?;
    let (source_key, input_css) = match options.input_css.as_deref() {
        Some(path) => {
            let css = fs::read_to_string(path).map_err(|err| CliError {
                message: format!("failed to read input css {}: {}", path, err),
            })?;
            (path.to_string(), css)
        }
        None => (DEFAULT_SOURCE_KEY.to_string(), DEFAULT_INPUT_CSS.to_string()),
    };

    let mut ignore = options.ignore.clone();
    ignore.extend(options.out.iter().cloned());
    let scan = scanner::scan_inputs(&options.inputs, &ignore, &scanner::ScanOptions::default())?;

    let generated = build_css(
        &input_css,
        &scan.candidates,
        store,
        &source_key,
        &config,
        options.minify,
    )?;
    let css = format!("{}\n{}", build_header(), generated);

    match options.out.as_deref() {
        Some(out_path) => {
            if let Some(parent) = Path::new(out_path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|err| CliError {
                        message: format!("failed to create {}: {}", parent.display(), err),
                    })?;
                }
            }
            fs::write(out_path, &css).map_err(|err| CliError {
                message: format!("failed to write output {}: {}", out_path, err),
            })?;
        }
        None => print!("{}", css),
    }

    eprintln!(
        "scanned {} files, {} candidates, built in {}ms",
        scan.files_scanned,
        scan.candidates.len(),
        started.elapsed().as_millis()
    );
    Ok(css)
}

/// An explicit `--config` must exist; otherwise `ironwind.toml` in the
/// working directory is used when present.
fn load_config(path: Option<&str>) -> std::result::Result<Config, CliError> {
    match path {
        Some(path) => Ok(config::load(Path::new(path))?),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            Ok(config::load(Path::new(DEFAULT_CONFIG_FILE))?)
        }
        None => Ok(Config::default()),
    }
}

fn build_header() -> String {
    format!(
        "/*! ironwind v{} | MIT License */",
        env!("CARGO_PKG_VERSION")
    )
}

fn print_help() {
    println!("ironwind");
    println!();
    println!("USAGE:");
    println!("  ironwind scan [--ignore <glob>] <glob...>");
    println!(
        "  ironwind build [--output <path>] [--minify] [--input-css <path>] [--config <path>] [--ignore <glob>] <glob...>"
    );
    println!(
        "  ironwind watch [--output <path>] [--minify] [--input-css <path>] [--config <path>] [--ignore <glob>] [--poll] [--poll-interval <ms>] <glob...>"
    );
    println!();
    println!("EXAMPLES:");
    println!("  ironwind scan \"src/**/*.{{html,tsx}}\"");
    println!("  ironwind build -i src/app.css -o dist/app.css \"src/**/*.{{html,tsx}}\"");
    println!("  ironwind build -c ironwind.toml --minify \"src/**/*.html\"");
    println!("  ironwind watch --poll --poll-interval 250 \"src/**/*.{{html,tsx}}\"");
}

fn run_watch(
    options: &BuildOptions,
    poll: bool,
    poll_interval_ms: u64,
) -> std::result::Result<(), CliError> {
    let mut store = ContextStore::new();
    run_build(options, &mut store)?;

    let (tx, rx) = channel();
    let ignore_set = build_globset(&options.ignore).ok();
    let mut watcher: Box<dyn notify::Watcher> = if poll {
        Box::new(
            notify::PollWatcher::new(
                tx,
                notify::Config::default()
                    .with_poll_interval(Duration::from_millis(poll_interval_ms)),
            )
            .map_err(|err| CliError {
                message: format!("failed to start poll watcher: {}", err),
            })?,
        )
    } else {
        Box::new(notify::recommended_watcher(tx).map_err(|err| CliError {
            message: format!("failed to start watcher: {}", err),
        })?)
    };

    let mut extras: Vec<&str> = Vec::new();
    extras.extend(options.input_css.as_deref());
    extras.extend(options.config.as_deref());
    for root in watch_roots(&options.inputs, &extras) {
        watcher
            .watch(&root, notify::RecursiveMode::Recursive)
            .map_err(|err| CliError {
                message: format!("failed to watch {}: {}", root.display(), err),
            })?;
    }

    if poll {
        eprintln!("watching for changes (polling, press Ctrl+C to stop)...");
    } else {
        eprintln!("watching for changes (press Ctrl+C to stop)...");
    }

    let out_path = options.out.as_deref().map(PathBuf::from);
    let mut last_event = Instant::now();
    loop {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(Ok(event)) => {
                if should_ignore_event(&event, ignore_set.as_ref(), out_path.as_deref()) {
                    continue;
                }
                if last_event.elapsed() < Duration::from_millis(200) {
                    continue;
                }
                last_event = Instant::now();
                eprintln!("change detected, rebuilding...");
                if let Err(err) = run_build(options, &mut store) {
                    eprintln!("build failed: {}", err.message);
                }
                tracing::debug!(contexts = store.len(), "watch pass finished");
            }
            Ok(Err(err)) => eprintln!("watch error: {}", err),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(_) => break,
        }
    }

    Ok(())
}

/// Directories to watch: the static prefix of every glob plus the
/// directories of the input stylesheet and config.
fn watch_roots(patterns: &[String], extras: &[&str]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for pattern in patterns.iter().map(String::as_str).chain(extras.iter().copied()) {
        let root = glob_root(pattern);
        let root = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root
        };
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

fn glob_root(pattern: &str) -> PathBuf {
    let Some(first_meta) = pattern.find(['*', '?', '[', '{']) else {
        let path = Path::new(pattern);
        if path.extension().is_some() {
            return path.parent().unwrap_or(Path::new(".")).to_path_buf();
        }
        return path.to_path_buf();
    };

    let head = &pattern[..first_meta];
    if head.ends_with(['/', '\\']) {
        let dir = head.trim_end_matches(['/', '\\']);
        return if dir.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(dir)
        };
    }
    match head.rfind(['/', '\\']) {
        Some(idx) if idx > 0 => PathBuf::from(&head[..idx]),
        _ => PathBuf::from("."),
    }
}

fn build_globset(patterns: &[String]) -> std::result::Result<GlobSet, CliError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| CliError {
            message: format!("invalid glob pattern '{}': {}", pattern, err),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| CliError {
        message: format!("failed to build ignore glob set: {}", err),
    })
}

/// Events that only touch ignored files or the build output itself do not
/// trigger a rebuild.
fn should_ignore_event(
    event: &notify::Event,
    ignore_set: Option<&GlobSet>,
    out_path: Option<&Path>,
) -> bool {
    if event.paths.is_empty() {
        return false;
    }
    event.paths.iter().all(|path| {
        ignore_set.is_some_and(|set| set.is_match(path))
            || out_path.is_some_and(|out| path.ends_with(out))
    })
}
