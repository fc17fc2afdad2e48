//! Tablemend CLI - correct machine-extracted HTML tables

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser, Subcommand};
#[cfg(feature = "cli")]
use std::error::Error;
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tablemend::{
    inspect_table, normalize_table_html_with_options, DirStore, EditCommand, EditorError,
    EditorOptions, FileCatalog, LoadState, SaveStatus, TableEditor,
};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "tmend")]
#[command(version)]
#[command(about = "Tablemend - correct machine-extracted HTML tables", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Editor configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Repair, parse and re-serialize a table fragment
    Normalize {
        /// Input file path (reads from stdin if not provided)
        input: Option<String>,

        /// Output file path (writes to stdout if not provided)
        #[arg(short, long)]
        output: Option<String>,

        /// Put every row on its own line
        #[arg(short, long)]
        pretty: bool,
    },

    /// Report the shape of a table fragment (exit code 1 when there is no table)
    Check {
        /// Input file path (reads from stdin if not provided)
        input: Option<String>,
    },

    /// List the table images of a directory
    List {
        /// Image directory
        dir: PathBuf,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Files per page
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply edit commands to the table of one file
    Apply {
        /// Image directory
        dir: PathBuf,

        /// File id (image name without extension)
        id: String,

        /// Table to edit when the artifact holds several
        #[arg(long, default_value_t = 0)]
        table: usize,

        /// File with one edit command per line ('#' starts a comment)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Print the resulting table to stdout
        #[arg(long)]
        print: bool,

        /// Edit commands, e.g. "edit 1 0 42" "merge 0,0 0,1" "undo"
        ops: Vec<String>,
    },

    /// Write the corrected table of one file to <id>_corrected.html
    Export {
        /// Image directory
        dir: PathBuf,

        /// File id (image name without extension)
        id: String,

        /// Table to export when the artifact holds several
        #[arg(long, default_value_t = 0)]
        table: usize,
    },

    /// Collect every correction trail of a directory into one JSON file
    ExportAnnotations {
        /// Image directory
        dir: PathBuf,
    },

    /// Count the images and annotated files of a directory
    Status {
        /// Image directory
        dir: PathBuf,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move an image and its sidecar files into the excluded/ directory
    Exclude {
        /// Image directory
        dir: PathBuf,

        /// File id (image name without extension)
        id: String,
    },

    /// Show version and feature info
    Info,
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[cfg(feature = "cli")]
fn read_input(input: Option<&str>) -> io::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn load_options(config: Option<&PathBuf>) -> Result<EditorOptions, EditorError> {
    match config {
        Some(path) => EditorOptions::load(path),
        None => Ok(EditorOptions::default()),
    }
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let options = load_options(cli.config.as_ref())?;

    match cli.command {
        Commands::Normalize {
            input,
            output,
            pretty,
        } => {
            let content = read_input(input.as_deref())?;
            let mut html_options = options.html.clone();
            html_options.pretty |= pretty;

            let mut result = normalize_table_html_with_options(&content, &html_options)?;
            result.push('\n');

            match output {
                Some(path) => {
                    let mut file = fs::File::create(&path)?;
                    file.write_all(result.as_bytes())?;
                    eprintln!("✓ Output written to: {}", path);
                }
                None => {
                    io::stdout().write_all(result.as_bytes())?;
                }
            }
        }

        Commands::Check { input } => {
            let content = read_input(input.as_deref())?;
            let report = match inspect_table(&content) {
                Ok(report) => report,
                Err(EditorError::Parse { message }) => {
                    eprintln!("✗ {}", message);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };

            println!("rows:           {}", report.rows);
            println!("columns:        {}", report.columns);
            println!("cells:          {}", report.cells);
            println!("spanning cells: {}", report.spanning);
            println!("header cells:   {}", report.header_cells);
            println!("holes:          {}", report.holes);
            if report.repairs.is_clean() {
                println!("repairs:        none");
            } else {
                println!(
                    "repairs:        {} doubled opening(s) collapsed, {} closing tag(s) appended",
                    report.repairs.collapsed_openings, report.repairs.appended_closings
                );
            }
        }

        Commands::List {
            dir,
            page,
            limit,
            json,
        } => {
            let listing = FileCatalog::new(&dir).list_files(page, limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
                return Ok(());
            }

            for file in &listing.files {
                let artifact = if file.has_bundle {
                    "bundle"
                } else if file.has_html {
                    "html"
                } else {
                    "-"
                };
                let annotated = if file.has_annotations { "annotated" } else { "" };
                println!("{:<32} {:<8} {}", file.name, artifact, annotated);
            }
            eprintln!(
                "page {}/{} ({} files)",
                listing.page,
                listing.total_pages.max(1),
                listing.total_files
            );
        }

        Commands::Apply {
            dir,
            id,
            table,
            script,
            print,
            ops,
        } => {
            let mut lines = Vec::new();
            if let Some(path) = script {
                let source = fs::read_to_string(&path)?;
                lines.extend(
                    source
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty() && !line.starts_with('#'))
                        .map(str::to_string),
                );
            }
            lines.extend(ops);

            // Reject the whole batch before touching the file
            let commands = lines
                .iter()
                .map(|line| line.parse::<EditCommand>())
                .collect::<Result<Vec<_>, _>>()?;

            let mut editor = TableEditor::with_options(DirStore::new(&dir), options);
            if editor.open_table(&id, table)? == LoadState::NoTable {
                eprintln!("✗ {} has no editable table", id);
                std::process::exit(1);
            }

            for command in &commands {
                let outcome = editor.apply(command)?;
                let note = match &outcome.save {
                    SaveStatus::Saved => "saved".to_string(),
                    SaveStatus::Skipped => "not saved".to_string(),
                    SaveStatus::Failed(message) => format!("save failed: {}", message),
                    SaveStatus::Reloaded => {
                        "modified externally, reloaded from disk".to_string()
                    }
                };
                let mark = if outcome.changed { "✓" } else { "·" };
                eprintln!("{} {} ({})", mark, command, note);

                if outcome.save == SaveStatus::Reloaded {
                    eprintln!("✗ stopping: remaining commands were written for the discarded state");
                    std::process::exit(1);
                }
            }

            if editor.is_dirty() {
                match editor.save()? {
                    SaveStatus::Saved => eprintln!("✓ saved"),
                    SaveStatus::Failed(message) => {
                        eprintln!("✗ save failed: {}", message);
                        std::process::exit(1);
                    }
                    other => eprintln!("· {:?}", other),
                }
            }

            let corrections = editor.annotations().count();
            if corrections > 0 {
                eprintln!("{} corrected cell(s)", corrections);
            }
            if print {
                if let Some(html) = editor.html() {
                    println!("{}", html);
                }
            }
        }

        Commands::Export { dir, id, table } => {
            let mut editor = TableEditor::with_options(DirStore::new(&dir), options);
            if editor.open_table(&id, table)? == LoadState::NoTable {
                eprintln!("✗ {} has no editable table", id);
                std::process::exit(1);
            }
            let html = editor.html().ok_or(EditorError::NoSession)?;
            let path = FileCatalog::new(&dir).export_corrected(&id, &html)?;
            eprintln!("✓ Output written to: {}", path.display());
        }

        Commands::ExportAnnotations { dir } => {
            let (path, export) = FileCatalog::new(&dir).export_all_annotations()?;
            eprintln!(
                "✓ {} correction(s) from {} file(s) written to: {}",
                export.correction_count(),
                export.files.len(),
                path.display()
            );
        }

        Commands::Status { dir, json } => {
            let status = FileCatalog::new(&dir).status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("directory:  {}", status.images_directory.display());
                println!("images:     {}", status.file_count);
                println!("annotated:  {}", status.annotated_count);
            }
        }

        Commands::Exclude { dir, id } => {
            let moved = FileCatalog::new(&dir).exclude(&id)?;
            for path in moved {
                eprintln!("✓ {}", path.display());
            }
        }

        Commands::Info => {
            println!("Tablemend - correct machine-extracted HTML tables");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Features:");
            println!("  ✓ Repair of doubled and unclosed <table> tags");
            println!("  ✓ rowspan/colspan aware grid parsing");
            println!("  ✓ Row/column insert and delete, cell merge and split");
            println!("  ✓ Linear undo");
            println!("  ✓ Per-cell correction trail (<id>_annotations.json)");
            println!("  ✓ Corrected table and training data export");
            println!();
            println!("Edit commands:");
            println!("  edit R C TEXT | insert-row R above|below | delete-row R");
            println!("  insert-col C left|right | delete-col C");
            println!("  merge R,C R,C... | split R C | undo");
            println!();
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install tablemend --features cli");
    eprintln!("  tmend <COMMAND>");
}
