use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use autocomply_core::bom::{parse_bom, read_bom_table, summarize, verify_components, BomStatus};
use autocomply_core::render::{render_dashboard, render_outcome};
use autocomply_core::{
    read_upload, ComponentCatalog, KnowledgeBase, ParsingConfig, ReportProcessor, SessionContext,
    StepProfiler, VerificationOutcome,
};

#[derive(Parser)]
#[command(name = "autocomply")]
#[command(about = "Verify automotive test reports, look up components and generate test procedures")]
struct Cli {
    /// Path to custom config file (YAML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Component catalog YAML replacing the built-in one
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Knowledge base YAML replacing the built-in one
    #[arg(long, global = true)]
    knowledge_base: Option<String>,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract PASS/FAIL records from one or more test reports
    Verify {
        /// Report files (pdf, docx, xlsx, csv, txt, log)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<String>,

        /// Output format: text or json
        #[arg(short = 'f', long, default_value = "text")]
        output_format: String,

        /// Output file path (single input only; otherwise printed)
        #[arg(short, long)]
        output: Option<String>,

        /// Enable detailed profiling of the decode/parse/bucket steps
        #[arg(long)]
        profile: bool,
    },
    /// Look up a part number in the component catalog
    Lookup { part_number: String },
    /// Render the test procedure matching a keyword
    Generate { keyword: String },
    /// Check every part of a BOM spreadsheet against the catalog
    Bom {
        /// BOM file (xlsx or csv)
        #[arg(short, long)]
        input: String,
    },
    /// Print the effective configuration as YAML
    ShowConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    println!("🦀 AutoComply");

    let config = load_config(cli.config.as_deref());
    let catalog = match &cli.catalog {
        Some(path) => ComponentCatalog::load_from_file(path)?,
        None => ComponentCatalog::builtin()?,
    };
    let mut session = SessionContext::new();

    match cli.command {
        Command::Verify {
            input,
            output_format,
            output,
            profile,
        } => {
            let processor = ReportProcessor::new(config)?;
            run_verify(
                &processor,
                &input,
                &output_format,
                output.as_deref(),
                profile,
                &mut session,
            )?;
            if input.len() > 1 {
                println!("\n📊 Session dashboard:");
                print!("{}", render_dashboard(&session.dashboard(catalog.len())));
            }
        }
        Command::Lookup { part_number } => run_lookup(&catalog, &part_number, &mut session),
        Command::Generate { keyword } => {
            let knowledge_base = match &cli.knowledge_base {
                Some(path) => KnowledgeBase::load_from_file(path)?,
                None => KnowledgeBase::builtin()?,
            };
            run_generate(&knowledge_base, &keyword, &mut session);
        }
        Command::Bom { input } => run_bom(&catalog, &config, &input)?,
        Command::ShowConfig => print!("{}", config.to_yaml()?),
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `--config`, then the per-user config file, then built-in defaults.
fn load_config(explicit: Option<&str>) -> ParsingConfig {
    if let Some(path) = explicit {
        println!("📋 Loaded config from: {path}");
        return ParsingConfig::load_with_fallback(Some(path));
    }
    if let Some(path) = user_config_path().filter(|p| p.exists()) {
        println!("📋 Loaded config from: {}", path.display());
        return ParsingConfig::load_with_fallback(path.to_str());
    }
    println!("📋 Using default config");
    ParsingConfig::default()
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("autocomply").join("config.yaml"))
}

fn run_verify(
    processor: &ReportProcessor,
    inputs: &[String],
    output_format: &str,
    output: Option<&str>,
    profile: bool,
    session: &mut SessionContext,
) -> Result<()> {
    for input in inputs {
        let path = Path::new(input);
        if !path.exists() {
            println!("⚠️  Input not found at: {input}");
            continue;
        }
        println!("\n📄 Processing: {input}");

        let bytes = match read_upload(path, processor.config().limits.max_input_bytes) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("❌ Failed to read {input}: {e}");
                continue;
            }
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.clone());

        let mut profiler = StepProfiler::new(profile);
        let outcome =
            processor.verify_with_options(&file_name, None, &bytes, session, &mut profiler);
        profiler.print_summary();

        match (&outcome, output) {
            (VerificationOutcome::Recognized(summary), Some(out)) if inputs.len() == 1 => {
                summary.save_with_format(out, output_format)?;
                println!("💾 Results saved to: {out}");
            }
            (VerificationOutcome::Recognized(summary), _) if output_format == "json" => {
                println!("{}", serde_json::to_string_pretty(summary)?);
            }
            (VerificationOutcome::Recognized(_), _) => print!("{}", render_outcome(&outcome)),
            (VerificationOutcome::NothingRecognized { .. }, _) => {
                print!("⚠️  {}", render_outcome(&outcome))
            }
            _ => eprint!("❌ {}", render_outcome(&outcome)),
        }
    }
    Ok(())
}

fn run_lookup(catalog: &ComponentCatalog, part_number: &str, session: &mut SessionContext) {
    if part_number.trim().is_empty() {
        println!("⚠️  Please enter a part number to search.");
        return;
    }
    match catalog.lookup(part_number, session) {
        Some(entry) => {
            println!("✅ Found: {}", part_number.trim().to_uppercase());
            for (name, value) in entry.ordered_properties() {
                println!("   {:.<35} {}", name, value);
            }
        }
        None => println!("❌ Part number not found in the database."),
    }
}

fn run_generate(knowledge_base: &KnowledgeBase, keyword: &str, session: &mut SessionContext) {
    if keyword.trim().is_empty() {
        println!("⚠️  Please enter a test keyword.");
        return;
    }
    match knowledge_base.generate(keyword, session) {
        Some(template) => println!("{}", template.to_markdown()),
        None => println!(
            "⚠️  No detailed procedure found for '{}'. Please try one of the following keywords: {}",
            keyword.trim(),
            knowledge_base.keys().join(", ")
        ),
    }
}

fn run_bom(catalog: &ComponentCatalog, config: &ParsingConfig, input: &str) -> Result<()> {
    let bytes = read_upload(Path::new(input), config.limits.max_input_bytes)
        .with_context(|| format!("Failed to read BOM: {input}"))?;
    let table = read_bom_table(input, &bytes, &config.limits)?;
    let parts = parse_bom(&table)?;
    let lines = verify_components(catalog, &parts);

    println!("📄 BOM: {input}");
    for line in &lines {
        let icon = if line.status == BomStatus::Found { "✅" } else { "❌" };
        println!(
            "{icon} {:<20} {:<10} {:<25} {:<25} {}",
            line.part_number,
            line.status.label(),
            line.manufacturer,
            line.category,
            line.aec_q
        );
    }
    let summary = summarize(&lines);
    println!("\n📊 BOM summary:");
    println!("   {:.<35} {}", "Total Components", summary.total);
    println!("   {:.<35} {}", "Found in Database", summary.found);
    println!("   {:.<35} {}", "AEC-Q Qualified", summary.aec_q_qualified);
    Ok(())
}
