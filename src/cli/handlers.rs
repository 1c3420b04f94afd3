// FILE: src/cli/handlers.rs
use crate::variables::variable_key;
use crate::{
    cli::OutputFormat, extract_with_compiler, scrape_variables, AccumulatedVariables,
    ExtractError, ExtractOptions, GrassCompiler, Result, VariableMap,
};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Instant;

const WATCHED_EXTENSIONS: &[&str] = &["scss", "sass", "css"];

// --- EXTRACT ---
pub fn handle_extract_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches
        .get_one::<String>("input")
        .map(PathBuf::from)
        .ok_or_else(|| ExtractError::invalid_format("Missing entry point"))?;

    let options = cli.build_extract_options(matches)?;
    let format = cli.output_format(matches);
    let output_path = cli.output_path(matches);

    if matches.get_flag("watch") {
        watch_and_extract(&input_path, output_path.as_deref(), format, options)
    } else {
        extract_once(&input_path, output_path.as_deref(), format, &options)
    }
}

fn extract_once(
    input_path: &Path,
    output_path: Option<&Path>,
    format: OutputFormat,
    options: &ExtractOptions,
) -> Result<()> {
    let extract_start = Instant::now();
    let variables = extract_with_compiler(&GrassCompiler, input_path, options)?;
    log::info!(
        "Extracted {} variable(s) from {} in {}ms",
        variables.len(),
        input_path.display(),
        extract_start.elapsed().as_millis()
    );

    let rendered = render_variables(&variables, format)?;
    write_output(&rendered, output_path)
}

fn watch_and_extract(
    input_path: &Path,
    output_path: Option<&Path>,
    format: OutputFormat,
    options: ExtractOptions,
) -> Result<()> {
    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                if let Err(e) = tx.send(event) {
                    log::error!("Watch error: {}", e);
                }
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| watch_error("Failed to create file watcher", e))?;

    for directory in watched_directories(input_path, &options.search_roots) {
        log::info!("Watching {}", directory.display());
        watcher
            .watch(&directory, RecursiveMode::Recursive)
            .map_err(|e| watch_error("Failed to watch directory", e))?;
    }

    eprintln!("Watching {} for changes...", input_path.display());
    if let Err(e) = extract_once(input_path, output_path, format, &options) {
        eprintln!("Initial extraction failed: {}", e);
    }

    while let Ok(event) = rx.recv() {
        if !is_stylesheet_change(&event) {
            continue;
        }
        // Editors often emit a burst of events per save.
        while rx.try_recv().is_ok() {}

        log::info!("Change detected in {:?}, re-extracting", event.paths);
        if let Err(e) = extract_once(input_path, output_path, format, &options) {
            eprintln!("Extraction failed: {}", e);
        }
    }

    Ok(())
}

fn watched_directories(input_path: &Path, search_roots: &[PathBuf]) -> Vec<PathBuf> {
    let entry_dir = match input_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut directories = vec![entry_dir];
    for root in search_roots {
        if root.is_dir() && !directories.contains(root) {
            directories.push(root.clone());
        }
    }
    directories
}

fn is_stylesheet_change(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| WATCHED_EXTENSIONS.contains(&ext))
    })
}

fn watch_error(context: &str, e: notify::Error) -> ExtractError {
    ExtractError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{}: {}", context, e),
    ))
}

// --- NAMES ---
pub fn handle_names_command(matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches
        .get_one::<String>("input")
        .ok_or_else(|| ExtractError::invalid_format("Missing input file"))?;

    for name in scan_names(Path::new(input_path))? {
        println!("{}", name);
    }
    Ok(())
}

fn scan_names(input_path: &Path) -> Result<Vec<String>> {
    let source = fs::read_to_string(input_path)?;
    let mut accumulated = AccumulatedVariables::new();
    let found = scrape_variables(&source, &mut accumulated);
    log::info!("Found {} variable name(s) in {}", found, input_path.display());

    Ok(accumulated.iter().map(variable_key).collect())
}

// --- HELPERS ---
fn render_variables(variables: &VariableMap, format: OutputFormat) -> Result<String> {
    let object = Value::Object(variables.clone());
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(&object),
        OutputFormat::Pretty => serde_json::to_string_pretty(&object),
        OutputFormat::Env => return Ok(render_env(variables)),
    };
    rendered.map_err(|e| ExtractError::invalid_format(format!("Failed to serialize output: {}", e)))
}

fn render_env(variables: &VariableMap) -> String {
    variables
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            format!("{}={}", name.to_uppercase().replace('-', "_"), value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_output(rendered: &str, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            fs::write(path, format!("{}\n", rendered))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
