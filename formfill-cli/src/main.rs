use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use formfill::{
    list_fields, FillConfig, FillError, FillOutput, FillRequest, FormFiller, PdfSource, ReturnSpec,
};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "formfill",
    about = "Fill PDF form templates with values and images",
    version,
    author
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the form fields of a PDF as JSON
    Fields {
        /// Input PDF file
        input: PathBuf,
    },

    /// Fill a PDF form
    Fill(FillArgs),
}

#[derive(Args)]
struct FillArgs {
    /// Template PDF file
    input: PathBuf,

    /// JSON object of field values
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// JSON object of image entries
    #[arg(short, long)]
    images: Option<PathBuf>,

    /// Full request JSON (`data`, `images`, `form`, `return`); the options
    /// above override its keys
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Mark every field read-only
    #[arg(long)]
    readonly: bool,

    /// Bake field appearances into the page content
    #[arg(long)]
    flatten: bool,

    /// Write the filled PDF here instead of printing an envelope
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for requests that ask to save the file
    #[arg(long)]
    download_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Fields { input } => fields(&input),
        Commands::Fill(args) => fill(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn fields(input: &Path) -> Result<()> {
    let pdf = read_file(input)?;
    let filler = FormFiller::new();
    let backend = filler
        .backend()
        .ok_or_else(|| anyhow!("{}", FillError::MissingDependency))?;

    let fields = list_fields(backend.as_ref(), &pdf)
        .with_context(|| format!("failed to read fields of {}", input.display()))?;
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

fn fill(args: FillArgs) -> Result<()> {
    let pdf = read_file(&args.input)?;
    let mut request = build_request(&args)?;
    request.pdf = Some(PdfSource::Raw(pdf));

    let mut config = FillConfig::default();
    if let Some(dir) = &args.download_dir {
        config = config.with_download_dir(dir);
    }
    let filler = FormFiller::from_config(config);

    if let Some(output) = &args.output {
        let request = request.with_return(ReturnSpec::Bytes);
        let filled = filler.fill_document(&request).map_err(coded)?;
        fs::write(output, &filled.bytes)
            .with_context(|| format!("failed to write {}", output.display()))?;

        let report = &filled.report;
        println!(
            "✓ Filled {} field(s), placed {} image(s): {}",
            report.fields_filled.len(),
            report.images_placed.len(),
            output.display()
        );
        for (name, reason) in &report.images_skipped {
            println!("  skipped image {name}: {reason}");
        }
        return Ok(());
    }

    match filler.fill(&request).map_err(coded)? {
        FillOutput::Bytes(bytes) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
        other => {
            let envelope = other
                .envelope()
                .ok_or_else(|| anyhow!("fill produced no envelope"))?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
    }
    Ok(())
}

/// Assemble the request mapping from the JSON files and flags
fn build_request(args: &FillArgs) -> Result<FillRequest> {
    let mut obj = match &args.request {
        Some(path) => read_json_object(path)?,
        None => Map::new(),
    };
    if let Some(path) = &args.data {
        obj.insert("data".into(), Value::Object(read_json_object(path)?));
    }
    if let Some(path) = &args.images {
        obj.insert("images".into(), Value::Object(read_json_object(path)?));
    }

    if args.readonly || args.flatten {
        let form = obj
            .entry("form")
            .or_insert_with(|| Value::Object(Map::new()));
        if !form.is_object() {
            *form = Value::Object(Map::new());
        }
        if let Some(form) = form.as_object_mut() {
            if args.readonly {
                form.insert("readonly".into(), Value::Bool(true));
            }
            if args.flatten {
                form.insert("flatten".into(), Value::Bool(true));
            }
        }
    }

    debug!(keys = ?obj.keys().collect::<Vec<_>>(), "request assembled");
    Ok(FillRequest::from_value(&Value::Object(obj)))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_str::<Value>(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("{} must contain a JSON object", path.display())),
    }
}

fn coded(err: FillError) -> anyhow::Error {
    anyhow!("[{}] {}", err.code(), err)
}
