//! docsheet CLI - Word document to spreadsheet extraction tool

mod prompt;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use walkdir::WalkDir;

use docsheet::detect::has_docx_extension;
use docsheet::mapping::{AcceptTopSuggestion, AssignmentSource, HeaderResolver, LeaveUnmapped};
use docsheet::{
    extract, parse_file_with_options, Batch, BatchReport, Config, JsonFormat, MappingStore,
    ParseOptions,
};

use prompt::ConsoleResolver;

#[derive(Parser)]
#[command(name = "docsheet")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract Word documents into spreadsheet workbooks", long_about = None)]
struct Cli {
    /// Input DOCX file or folder (runs `extract`)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one sheet per document section to <stem>.xlsx
    Extract {
        #[command(flatten)]
        common: CommonArgs,

        /// Section header label matched against any paragraph (repeatable)
        #[arg(long = "custom-header", value_name = "LABEL")]
        custom_headers: Vec<String>,

        /// Only open a heading's section once data follows it
        #[arg(long)]
        only_headings_with_data: bool,

        /// Skip in-text citation columns
        #[arg(long)]
        no_references: bool,

        /// Keep bold and italic as ** and * markers
        #[arg(long)]
        inline_markup: bool,

        /// Add a [Start] column to the first row of each table
        #[arg(long)]
        start_marker: bool,
    },

    /// Map table headers onto the canonical schema and write <stem>_mapped.xlsx
    Map {
        #[command(flatten)]
        common: CommonArgs,

        /// Header mapping store
        #[arg(long, value_name = "FILE", default_value = docsheet::mapping::DEFAULT_STORE_FILE)]
        mapping_store: PathBuf,

        /// Never prompt; unresolved headers stay unmapped
        #[arg(long)]
        non_interactive: bool,

        /// Never prompt; unresolved headers take the best suggestion
        #[arg(long, conflicts_with = "non_interactive")]
        accept_suggestions: bool,

        /// Minimum table score for a table to be mapped (0-1)
        #[arg(long, value_name = "SCORE")]
        min_score: Option<f64>,
    },

    /// Print extracted sections as JSON
    Json {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// JSON configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Show document information
    Info {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct CommonArgs {
    /// Input DOCX file or folder
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory (next to each input if not specified)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Include subfolders when INPUT is a folder
    #[arg(short, long)]
    recursive: bool,

    /// JSON configuration file
    #[arg(long, value_name = "FILE", env = "DOCSHEET_CONFIG")]
    config: Option<PathBuf>,

    /// Skip unreadable optional document parts instead of failing
    #[arg(long)]
    lenient: bool,
}

impl CommonArgs {
    fn parse_options(&self) -> ParseOptions {
        if self.lenient {
            ParseOptions::new().lenient()
        } else {
            ParseOptions::new()
        }
    }

    fn batch(&self) -> Result<Batch, Box<dyn std::error::Error>> {
        let inputs = collect_inputs(&self.input, self.recursive)?;
        let mut batch = Batch::new(inputs).with_parse_options(self.parse_options());
        if let Some(dir) = &self.output {
            fs::create_dir_all(dir)?;
            batch = batch.with_output_dir(dir);
        }
        Ok(batch)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            common,
            custom_headers,
            only_headings_with_data,
            no_references,
            inline_markup,
            start_marker,
        }) => load_config(common.config.as_deref()).and_then(|mut config| {
            let options = &mut config.extract;
            options.custom_headers.extend(custom_headers);
            options.only_headings_with_data |= only_headings_with_data;
            options.get_in_text_references &= !no_references;
            options.inline_markup |= inline_markup;
            options.table_start_marker |= start_marker;
            cmd_extract(&common, &config)
        }),
        Some(Commands::Map {
            common,
            mapping_store,
            non_interactive,
            accept_suggestions,
            min_score,
        }) => load_config(common.config.as_deref()).and_then(|mut config| {
            if let Some(score) = min_score {
                config.mapping.mapping_similarity_threshold = score;
            }
            config.validate()?;
            let mode = if non_interactive {
                ResolveMode::LeaveUnmapped
            } else if accept_suggestions {
                ResolveMode::AcceptSuggestions
            } else {
                ResolveMode::Interactive
            };
            cmd_map(&common, &config, &mapping_store, mode)
        }),
        Some(Commands::Json {
            input,
            output,
            compact,
            config,
        }) => cmd_json(&input, output.as_deref(), compact, config.as_deref()),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(input) = cli.input {
                let common = CommonArgs {
                    input,
                    output: None,
                    recursive: false,
                    config: None,
                    lenient: false,
                };
                cmd_extract(&common, &Config::default())
            } else {
                println!("{}", "Usage: docsheet <INPUT>".yellow());
                println!("       docsheet --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            Ok(Config::from_file(path)?)
        }
        None => Ok(Config::default()),
    }
}

/// DOCX files under `input`, sorted; a single file is taken as is.
fn collect_inputs(input: &Path, recursive: bool) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(format!("input not found: {}", input.display()).into());
    }

    let depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .max_depth(depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_docx_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    debug!("Found {} documents in {}", files.len(), input.display());

    if files.is_empty() {
        return Err(format!("no .docx files found in {}", input.display()).into());
    }
    Ok(files)
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn cmd_extract(common: &CommonArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let batch = common.batch()?;
    let pb = progress_bar(batch.len());

    let report = batch.extract(&config.extract, |path, summary| {
        if let Some(summary) = summary {
            pb.println(format!(
                "{} {} ({} sheets)",
                "Wrote".green(),
                summary.output.display(),
                summary.sections
            ));
        }
        pb.set_message(file_label(path));
        pb.inc(1);
    });
    pb.finish_with_message("Done!");

    print_issues(&report);
    println!(
        "\n{} {} of {} documents extracted",
        "Done!".green().bold(),
        report.completed.len(),
        batch.len()
    );
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ResolveMode {
    Interactive,
    LeaveUnmapped,
    AcceptSuggestions,
}

fn cmd_map(
    common: &CommonArgs,
    config: &Config,
    store_path: &Path,
    mode: ResolveMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = common.batch()?;
    let mut store = MappingStore::open(store_path)?;
    debug!("Using mapping store {}", store_path.display());
    println!(
        "{} {} ({} known headers)",
        "Mapping store".cyan(),
        store_path.display(),
        store.len()
    );

    let pb = progress_bar(batch.len());
    let mut resolver: Box<dyn HeaderResolver> = match mode {
        ResolveMode::Interactive => Box::new(ConsoleResolver::new(pb.clone())),
        ResolveMode::LeaveUnmapped => Box::new(LeaveUnmapped),
        ResolveMode::AcceptSuggestions => Box::new(AcceptTopSuggestion),
    };

    let report = batch.map(
        &config.mapping,
        &mut store,
        resolver.as_mut(),
        |path, summary| {
            if let Some(summary) = summary {
                let manual = summary
                    .report
                    .count(|s| matches!(s, AssignmentSource::Manual));
                pb.println(format!(
                    "{} {} ({} of {} tables mapped, {} new headers, {} asked)",
                    "Wrote".green(),
                    summary.output.display(),
                    summary.mapped,
                    summary.tables,
                    summary.report.assignments.len(),
                    manual
                ));
            }
            pb.set_message(file_label(path));
            pb.inc(1);
        },
    );
    pb.finish_with_message("Done!");

    print_issues(&report);
    println!(
        "\n{} {} of {} documents mapped, {} headers in store",
        "Done!".green().bold(),
        report.completed.len(),
        batch.len(),
        store.len()
    );
    Ok(())
}

fn print_issues<T>(report: &BatchReport<T>) {
    if report.is_clean() {
        return;
    }
    println!("\n{}", "Skipped documents:".yellow().bold());
    for issue in &report.issues {
        println!("  {} {}: {}", "├─".dimmed(), issue.path.display(), issue.message);
    }
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let doc = docsheet::parse_file(input)?;
    let extracted = extract(&doc, &config.extract);

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = docsheet::render::to_json(&extracted, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    // Metadata is still worth showing when styles or numbering are broken
    let options = ParseOptions::new().lenient();
    let format = docsheet::detect_format_from_path(input)?;
    let doc = parse_file_with_options(input, options)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);

    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = doc.metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref subject) = doc.metadata.subject {
        println!("{}: {}", "Subject".bold(), subject);
    }
    if let Some(ref modified_by) = doc.metadata.last_modified_by {
        println!("{}: {}", "Modified by".bold(), modified_by);
    }
    if let Some(ref created) = doc.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = doc.metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let headings = doc.paragraphs().filter(|p| p.is_heading()).count();
    let words = doc.plain_text().split_whitespace().count();

    println!("{}: {}", "Paragraphs".bold(), doc.paragraphs().count());
    println!("{}: {}", "Headings".bold(), headings);
    println!("{}: {}", "Tables".bold(), doc.tables().count());
    println!("{}: {}", "Words".bold(), words);
    println!("{}: {}", "Endnotes".bold(), doc.endnotes.len());
    println!("{}: {}", "Footnotes".bold(), doc.footnotes.len());

    let extracted = extract(&doc, &docsheet::ExtractOptions::default());
    println!("{}: {}", "Sections".bold(), extracted.section_count());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docsheet".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Word document to spreadsheet extraction tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/docsheet".dimmed());
    println!("License: MIT");
}
