#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for GST return and TDS document extraction.
//!
//! `extract` reads a batch of returns with one template, narrows it with
//! the filter flags and writes the filtered workbook (or JSON). `tds` does
//! the same for TDS returns and challans. Without a subcommand the tool
//! asks what to do.
//!
//! Logging goes through [`gstr_extract_cli_utils::init_logger`] so that
//! log lines and the progress bar share the terminal.

mod interactive;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gstr_extract_batch::aggregate::{extract_batch, extract_tds_batch};
use gstr_extract_batch::export::{write_gst_workbook, write_tds_workbook};
use gstr_extract_batch::{
    BatchResult, CombinedView, Document, DocumentError, FilterDimension, Filters, Selection,
};
use gstr_extract_cli_utils::{IndicatifProgress, MultiProgress};
use gstr_extract_parse::TemplateRegistry;
use gstr_extract_pdf::AutoExtractor;
use gstr_extract_tds::TdsForm;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "gstr_extract", about = "GST return and TDS document extraction")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract GST returns into a filtered workbook
    Extract {
        /// Return template (e.g., "`gstr3b_2025`"). Prompted for when omitted.
        #[arg(long)]
        template: Option<String>,
        /// Workbook to write (defaults to the template's export file name)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Print the filtered batch and combined view as JSON instead
        #[arg(long)]
        json: bool,
        /// Choose filter values interactively after extraction
        #[arg(long)]
        pick_filters: bool,
        #[command(flatten)]
        filters: FilterArgs,
        /// PDF or text files, or directories containing them
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Extract TDS returns or challans into a workbook
    Tds {
        /// Document kind (e.g., "`form24q`", "`hdfc_challan`"). Prompted for when omitted.
        #[arg(long, value_parser = parse_form)]
        form: Option<TdsForm>,
        /// Workbook to write (defaults to `extracted_data_<timestamp>.xlsx`)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Print the records as JSON instead
        #[arg(long)]
        json: bool,
        /// PDF or text files, or directories containing them
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the embedded return templates
    Templates,
}

/// Values to keep per filter dimension. Repeat a flag to keep several
/// values; leaving a flag out keeps everything.
#[derive(clap::Args, Default)]
struct FilterArgs {
    #[arg(long)]
    period: Vec<String>,
    #[arg(long)]
    state: Vec<String>,
    #[arg(long)]
    gstin: Vec<String>,
    #[arg(long)]
    legal_name: Vec<String>,
    #[arg(long)]
    financial_year: Vec<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> Filters {
        let mut filters = Filters::default();
        for (dimension, values) in [
            (FilterDimension::Period, &self.period),
            (FilterDimension::State, &self.state),
            (FilterDimension::Gstin, &self.gstin),
            (FilterDimension::LegalName, &self.legal_name),
            (FilterDimension::FinancialYear, &self.financial_year),
        ] {
            filters.set(dimension, Selection::from_values(values.iter().cloned()));
        }
        filters
    }
}

#[derive(Serialize)]
struct GstReport<'a> {
    result: &'a BatchResult,
    combined: &'a CombinedView,
}

/// Options for one GST extraction run.
struct ExtractOptions {
    template: Option<String>,
    output: Option<PathBuf>,
    json: bool,
    pick_filters: bool,
    filters: Filters,
    files: Vec<PathBuf>,
}

/// Options for one TDS extraction run.
struct TdsOptions {
    form: Option<TdsForm>,
    output: Option<PathBuf>,
    json: bool,
    files: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = gstr_extract_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi);
    };

    match command {
        Commands::Extract {
            template,
            output,
            json,
            pick_filters,
            filters,
            files,
        } => run_extract(
            &multi,
            ExtractOptions {
                template,
                output,
                json,
                pick_filters,
                filters: filters.to_filters(),
                files,
            },
        )?,
        Commands::Tds {
            form,
            output,
            json,
            files,
        } => run_tds(
            &multi,
            TdsOptions {
                form,
                output,
                json,
                files,
            },
        )?,
        Commands::Templates => list_templates()?,
    }

    Ok(())
}

/// Extracts, filters and exports a batch of GST returns.
///
/// # Errors
///
/// Returns an error if the template is unknown, a prompt fails or the
/// output cannot be written. Unreadable or unparsable documents are
/// reported in the result instead.
fn run_extract(
    multi: &MultiProgress,
    options: ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = TemplateRegistry::load()?;
    let template = match &options.template {
        Some(id) => registry.get(id)?,
        None => interactive::pick_template(&registry)?,
    };

    let (documents, read_errors) = load_documents(&options.files);

    let progress = IndicatifProgress::documents_bar(multi, "Extracting returns");
    let mut result = extract_batch(&documents, &AutoExtractor, template, progress.as_ref());
    result.errors.extend(read_errors);

    let filters = if options.pick_filters {
        interactive::pick_filters(&result)?
    } else {
        options.filters
    };
    let filtered = if filters.is_open() {
        result.clone()
    } else {
        for dimension in FilterDimension::all() {
            if let Selection::Only(values) = filters.selection(*dimension) {
                log::info!("Keeping {} in {values:?}", dimension.label());
            }
        }
        filters.apply(&result)
    };
    let combined = CombinedView::build(&filtered);

    log::info!(
        "{} of {} documents match the filters ({} failed)",
        filtered.general.len(),
        result.general.len(),
        filtered.errors.len()
    );

    if options.json {
        let report = GstReport {
            result: &filtered,
            combined: &combined,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        if options.output.is_none() {
            return Ok(());
        }
    }

    let path = options
        .output
        .unwrap_or_else(|| PathBuf::from(&template.export_file));
    write_gst_workbook(&path, &filtered, &combined)?;
    print_written(&path, filtered.general.len(), &filtered.errors);

    Ok(())
}

/// Extracts and exports a batch of TDS documents of one kind.
///
/// # Errors
///
/// Returns an error if a prompt fails or the output cannot be written.
fn run_tds(
    multi: &MultiProgress,
    options: TdsOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let form = match options.form {
        Some(form) => form,
        None => interactive::pick_tds_form()?,
    };

    let (documents, read_errors) = load_documents(&options.files);

    let progress = IndicatifProgress::documents_bar(multi, "Extracting TDS documents");
    let mut result =
        extract_tds_batch(&documents, &AutoExtractor, form, progress.as_ref());
    result.errors.extend(read_errors);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        if options.output.is_none() {
            return Ok(());
        }
    }

    let path = options.output.unwrap_or_else(default_tds_output);
    write_tds_workbook(&path, &result)?;
    print_written(&path, result.records.len(), &result.errors);

    Ok(())
}

fn list_templates() -> Result<(), Box<dyn std::error::Error>> {
    let registry = TemplateRegistry::load()?;

    println!("{:<16} {:<32} EXPORT FILE", "ID", "NAME");
    println!("{}", "-".repeat(72));
    for template in registry.iter() {
        println!(
            "{:<16} {:<32} {}",
            template.id, template.name, template.export_file
        );
    }

    Ok(())
}

fn parse_form(value: &str) -> Result<TdsForm, String> {
    value.parse().map_err(|_| {
        let known: Vec<&str> = TdsForm::all().iter().map(AsRef::as_ref).collect();
        format!("unknown form {value:?} (expected one of: {})", known.join(", "))
    })
}

fn default_tds_output() -> PathBuf {
    PathBuf::from(format!(
        "extracted_data_{}.xlsx",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

fn print_written(path: &Path, rows: usize, errors: &[DocumentError]) {
    println!("Wrote {rows} rows to {}", path.display());
    if !errors.is_empty() {
        println!("{} documents failed:", errors.len());
        for error in errors {
            println!("  {}: {}", error.document, error.message);
        }
    }
}

/// Expands directories into the `.pdf` and `.txt` files they contain,
/// sorted by name. Plain file arguments are kept as given.
fn collect_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        match std::fs::read_dir(input) {
            Ok(entries) => {
                let mut found: Vec<PathBuf> = entries
                    .filter_map(Result::ok)
                    .map(|e| e.path())
                    .filter(|p| p.is_file() && is_document(p))
                    .collect();
                found.sort();
                log::debug!("{} documents in {}", found.len(), input.display());
                files.extend(found);
            }
            Err(e) => log::warn!("Cannot list {}: {e}", input.display()),
        }
    }

    files
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf") || e.eq_ignore_ascii_case("txt"))
}

/// Reads every input into memory. Files that cannot be read become
/// per-document errors.
fn load_documents(inputs: &[PathBuf]) -> (Vec<Document>, Vec<DocumentError>) {
    let mut documents = Vec::new();
    let mut errors = Vec::new();

    for path in collect_files(inputs) {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        match std::fs::read(&path) {
            Ok(bytes) => documents.push(Document::new(name, bytes)),
            Err(e) => {
                log::error!("Cannot read {}: {e}", path.display());
                errors.push(DocumentError {
                    document: name,
                    message: e.to_string(),
                });
            }
        }
    }

    (documents, errors)
}
