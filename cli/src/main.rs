//! redeck CLI - PowerPoint template engine
//!
//! Fills placeholder tokens, removes optional slides and writes the result as
//! PPTX or, through LibreOffice, as PDF.

use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use redeck::{
    token, BuildRequest, ConverterOptions, RenderRequest, Template, TemplateManifest,
    ToggleGroups,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// PowerPoint template filling and slide selection
#[derive(Parser)]
#[command(
    name = "redeck",
    version,
    about = "Build presentations from PowerPoint templates",
    long_about = "redeck - PowerPoint template engine.\n\n\
                  Replaces {{TOKEN}} placeholders (even when split over text runs),\n\
                  removes optional slides and writes a valid PPTX or PDF."
)]
struct Cli {
    /// Log pipeline steps (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a presentation from a template
    Render {
        /// Template file (.pptx)
        #[arg(short, long)]
        template: PathBuf,

        /// Template manifest (JSON) with toggle groups
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Proposal request (JSON): company_name, pricing_overrides, slide_toggles
        #[arg(short, long)]
        request: Option<PathBuf>,

        /// Replacement, as KEY=VALUE (KEY with or without braces)
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        replacements: Vec<(String, String)>,

        /// Toggle group flag, as NAME=true|false
        #[arg(long = "toggle", value_name = "NAME=BOOL", value_parser = parse_toggle)]
        toggles: Vec<(String, bool)>,

        /// Remove the slide at a 0-based position (repeatable)
        #[arg(long = "remove", value_name = "N")]
        removals: Vec<usize>,

        /// Output file path (default: derived from the request or template)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render to PDF with LibreOffice
        #[arg(long)]
        pdf: bool,

        /// LibreOffice executable
        #[arg(long, default_value = redeck::convert::DEFAULT_PROGRAM)]
        program: PathBuf,

        /// PDF conversion timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,
    },

    /// Show slides, placeholders and toggle groups of a template
    Info {
        /// Template file (.pptx)
        template: PathBuf,

        /// Template manifest (JSON)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err("empty key".to_string());
    }
    let key = if key.starts_with(redeck::replacements::TOKEN_OPEN) {
        key.to_string()
    } else {
        token(key)
    };
    Ok((key, value.to_string()))
}

fn parse_toggle(s: &str) -> Result<(String, bool), String> {
    let (name, flag) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=BOOL, got '{}'", s))?;
    let flag = match flag.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => true,
        "false" | "no" | "off" | "0" => false,
        other => return Err(format!("invalid flag '{}' for {}", other, name)),
    };
    Ok((name.to_string(), flag))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load_template(path: &Path, manifest: Option<&PathBuf>) -> Result<Template, Box<dyn std::error::Error>> {
    let template = Template::open(path)?;
    Ok(match manifest {
        Some(m) => template.with_manifest(TemplateManifest::load(m)?),
        None => template,
    })
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Render {
            template,
            manifest,
            request,
            replacements,
            toggles,
            removals,
            output,
            pdf,
            program,
            timeout,
        } => {
            let pb = create_spinner("Loading template...");
            let loaded = load_template(&template, manifest.as_ref())?;

            let render_request = match &request {
                Some(path) => Some(RenderRequest::from_json(&fs::read_to_string(path)?)?),
                None => None,
            };

            // Command-line values override the request file
            let mut build_request = match &render_request {
                Some(r) => r.to_build_request()?,
                None => BuildRequest::new(),
            };
            for (key, value) in replacements {
                build_request = build_request.with_replacement(key, value);
            }
            for (name, flag) in toggles {
                build_request = build_request.with_toggle(name, flag);
            }
            build_request = build_request.remove_slides(removals);

            let extension = if pdf { "pdf" } else { "pptx" };
            let output = output.unwrap_or_else(|| match &render_request {
                Some(r) => PathBuf::from(r.output_filename(extension)),
                None => default_output(&template, extension),
            });

            pb.set_message("Building presentation...");
            let bytes = if pdf {
                pb.set_message("Rendering PDF...");
                let options = ConverterOptions::new()
                    .with_program(program)
                    .with_timeout(Duration::from_secs(timeout));
                redeck::build_pdf(&loaded, &build_request, options)?
            } else {
                loaded.build(&build_request)?
            };

            pb.finish_and_clear();
            fs::write(&output, &bytes)?;

            println!(
                "{} Built {}: {} ({} bytes)",
                "✓".green().bold(),
                extension.to_uppercase(),
                output.display(),
                bytes.len()
            );
        }

        Commands::Info {
            template,
            manifest,
            json,
        } => {
            let pb = create_spinner("Analyzing template...");

            let loaded = load_template(&template, manifest.as_ref())?;
            let format = redeck::detect_format_from_bytes(loaded.bytes())?;
            let deck = loaded.deck()?;
            let slides = deck.slides()?;
            let placeholders = deck.placeholders()?;
            let groups = &loaded.manifest().toggle_groups;

            pb.finish_and_clear();

            if json {
                let value = serde_json::json!({
                    "format": format.name(),
                    "slides": slides,
                    "placeholders": placeholders,
                    "toggle_groups": groups,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            println!("{}", "Template Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                template.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Format".bold(), format);
            println!("{}: {}", "Slides".bold(), slides.len());

            println!("\n{}", "Slides".cyan().bold());
            println!("{}", "─".repeat(40));
            for slide in &slides {
                let title = slide
                    .paragraphs
                    .iter()
                    .find(|p| !p.trim().is_empty())
                    .map(String::as_str)
                    .unwrap_or("");
                let group = groups
                    .group_of(slide.position)
                    .map(|g| format!(" [{}]", g).yellow().to_string())
                    .unwrap_or_default();
                println!(
                    "{:>3}  {}{}  {}",
                    slide.position,
                    slide.part.dimmed(),
                    group,
                    title
                );
            }

            if !groups.is_empty() {
                println!("\n{}", "Toggle Groups".cyan().bold());
                println!("{}", "─".repeat(40));
                for (name, positions) in group_lines(groups) {
                    println!("  {}: slides {}", name.bold(), positions);
                }
            }

            println!("\n{}", "Placeholders".cyan().bold());
            println!("{}", "─".repeat(40));
            if placeholders.is_empty() {
                println!("{} No placeholders found", "!".yellow().bold());
            }
            for placeholder in &placeholders {
                println!("  {}", placeholder);
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

/// Each toggle group with its slide positions, in name order.
fn group_lines(groups: &ToggleGroups) -> Vec<(&str, String)> {
    groups
        .names()
        .map(|name| {
            let positions: Vec<String> = groups
                .get(name)
                .into_iter()
                .flatten()
                .map(|p| p.to_string())
                .collect();
            (name, positions.join(", "))
        })
        .collect()
}

fn default_output(template: &Path, extension: &str) -> PathBuf {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "presentation".to_string());
    PathBuf::from(format!("{}_built.{}", stem, extension))
}

fn print_version() {
    println!("{} {}", "redeck".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("PowerPoint template engine: placeholders, optional slides, PDF export");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
