//! `dialoguer` prompts used when options are left off the command line.

use std::path::PathBuf;

use dialoguer::{Input, MultiSelect, Select};
use gstr_extract_batch::filter::{SELECT_ALL, filter_options};
use gstr_extract_batch::{BatchResult, Filters, Selection};
use gstr_extract_cli_utils::MultiProgress;
use gstr_extract_parse::{CompiledTemplate, TemplateRegistry};
use gstr_extract_tds::TdsForm;

use crate::{ExtractOptions, TdsOptions};

enum Task {
    ExtractReturns,
    ExtractTds,
    ListTemplates,
}

impl Task {
    const ALL: &[Self] = &[Self::ExtractReturns, Self::ExtractTds, Self::ListTemplates];

    const fn label(&self) -> &'static str {
        match self {
            Self::ExtractReturns => "Extract GST returns",
            Self::ExtractTds => "Extract TDS documents",
            Self::ListTemplates => "List return templates",
        }
    }
}

/// Asks what to do, then which files and options to use.
///
/// # Errors
///
/// Returns an error if a prompt fails or the chosen run fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("GST Return Extraction");
    println!();

    let labels: Vec<&str> = Task::ALL.iter().map(Task::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Task::ALL[idx] {
        Task::ExtractReturns => {
            let files = prompt_files()?;
            crate::run_extract(
                multi,
                ExtractOptions {
                    template: None,
                    output: None,
                    json: false,
                    pick_filters: true,
                    filters: Filters::default(),
                    files,
                },
            )
        }
        Task::ExtractTds => {
            let files = prompt_files()?;
            crate::run_tds(
                multi,
                TdsOptions {
                    form: None,
                    output: None,
                    json: false,
                    files,
                },
            )
        }
        Task::ListTemplates => crate::list_templates(),
    }
}

fn prompt_files() -> Result<Vec<PathBuf>, dialoguer::Error> {
    let input: String = Input::new()
        .with_prompt("Files or directories (space-separated)")
        .default(".".to_owned())
        .interact_text()?;

    Ok(input.split_whitespace().map(PathBuf::from).collect())
}

/// Asks which return template to read the batch with.
///
/// # Errors
///
/// Returns an error if the prompt fails.
pub fn pick_template(registry: &TemplateRegistry) -> Result<&CompiledTemplate, dialoguer::Error> {
    let templates: Vec<&CompiledTemplate> = registry.iter().collect();
    let labels: Vec<&str> = templates.iter().map(|t| t.name.as_str()).collect();

    let idx = Select::new()
        .with_prompt("Return type")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(templates[idx])
}

/// Asks which kind of TDS document the batch holds.
///
/// # Errors
///
/// Returns an error if the prompt fails.
pub fn pick_tds_form() -> Result<TdsForm, dialoguer::Error> {
    let labels: Vec<&str> = TdsForm::all().iter().map(|f| f.label()).collect();

    let idx = Select::new()
        .with_prompt("Document type")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(TdsForm::all()[idx])
}

/// Offers the distinct values of every filter dimension, headed by
/// "Select All". Dimensions with a single value are left open.
///
/// # Errors
///
/// Returns an error if a prompt fails.
pub fn pick_filters(result: &BatchResult) -> Result<Filters, dialoguer::Error> {
    let mut filters = Filters::default();

    for (dimension, values) in filter_options(&result.general) {
        if values.len() < 2 {
            continue;
        }

        let mut items = vec![SELECT_ALL.to_owned()];
        items.extend(values);
        let mut defaults = vec![false; items.len()];
        defaults[0] = true;

        let chosen = MultiSelect::new()
            .with_prompt(format!(
                "{} (space=toggle, enter=confirm)",
                dimension.label()
            ))
            .items(&items)
            .defaults(&defaults)
            .max_length(20)
            .interact()?;

        filters.set(
            dimension,
            Selection::from_values(chosen.into_iter().map(|i| items[i].clone())),
        );
    }

    Ok(filters)
}
