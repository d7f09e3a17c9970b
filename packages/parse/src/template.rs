//! Config-driven return template definitions.
//!
//! A [`ReturnTemplate`] captures everything that differs between return
//! forms and form versions: header field patterns, section anchors,
//! category lists and their matchers, and the payment table's column
//! mapping. One generic pipeline runs every template.
//!
//! Templates are deserialized from TOML and compiled once into a
//! [`CompiledTemplate`] whose regexes and lookup tables are ready to use.

use std::collections::BTreeMap;
use std::str::FromStr;

use gstr_extract_returns_models::{
    CombinedLayout, GeneralField, PaymentColumn, PaymentField, PaymentSchema, PaymentSection,
    RecoveryStrategy, ReturnForm, TableSchema, TaxHead,
};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::fields::FieldRule;
use crate::payment::{PaymentLayout, PaymentRule, SectionMarker};
use crate::recover::{CategoryRule, TableRule};
use crate::section::SectionAnchors;

/// One numeric capture in a category pattern.
const NUM_CAPTURE: &str = r"([\d,]+\.?\d*)";

/// Errors raised while loading or compiling a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The TOML did not match the template schema.
    #[error("Failed to parse template {id}: {source}")]
    Toml {
        id: String,
        #[source]
        source: toml::de::Error,
    },

    /// A field or category pattern is not a valid regex.
    #[error("Invalid pattern in template {template}: {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },

    /// The template is well-formed TOML but semantically invalid.
    #[error("Invalid template {template}: {message}")]
    Invalid { template: String, message: String },

    /// No template with the requested identifier exists.
    #[error("Unknown template: {0}")]
    Unknown(String),
}

// ── Template definition ──────────────────────────────────────────────────

/// A complete return template as written in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ReturnTemplate {
    /// Unique identifier (e.g., `"gstr3b_2024"`).
    pub id: String,
    /// Human-readable name shown when choosing a template.
    pub name: String,
    pub form: ReturnForm,
    /// Form version label (e.g., `"2024"`).
    pub version: String,
    pub combined_layout: CombinedLayout,
    /// Default workbook file name for filtered exports.
    pub export_file: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    #[serde(default)]
    pub payment: Option<PaymentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub field: GeneralField,
    /// Case-sensitive regex; capture group 1 is the value.
    pub pattern: String,
}

/// A category table: fixed row labels, fixed value columns.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub id: String,
    pub title: String,
    pub label_column: String,
    pub columns: Vec<String>,
    pub section: SectionAnchors,
    /// Strategies in priority order.
    pub strategies: Vec<RecoveryStrategy>,
    pub categories: Vec<CategoryConfig>,
    /// Defaults to the number of columns.
    #[serde(default)]
    pub min_line_values: Option<usize>,
    /// Whether category patterns ignore case.
    #[serde(default = "ignore_case_by_default")]
    pub case_insensitive: bool,
}

const fn ignore_case_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub label: String,
    #[serde(default)]
    pub grid_keywords: Vec<String>,
    /// Regex variants, strictest first. `{num}` is one numeric capture and
    /// `{values}` one capture per table column.
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub line_keywords: Vec<String>,
}

/// The section-tagged payment table.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub id: String,
    pub title: String,
    pub section: SectionAnchors,
    pub markers: MarkersConfig,
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub min_line_len: usize,
    pub columns: Vec<PaymentColumn>,
    pub layouts: Vec<LayoutConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkersConfig {
    pub other_than_reverse_charge: MarkerConfig,
    pub reverse_charge: MarkerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkerConfig {
    pub any: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Column mapping of one tax head, shared by the listed sections.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    pub tax: TaxHead,
    pub sections: Vec<PaymentSection>,
    pub min_values: usize,
    /// Payment field name → amount token position.
    pub positions: BTreeMap<String, usize>,
}

/// Parses a template from TOML.
///
/// # Errors
///
/// Returns [`TemplateError::Toml`] if the TOML does not match the template
/// schema.
pub fn parse_template_toml(id: &str, toml_str: &str) -> Result<ReturnTemplate, TemplateError> {
    toml::de::from_str(toml_str).map_err(|source| TemplateError::Toml {
        id: id.to_owned(),
        source,
    })
}

// ── Compiled template ────────────────────────────────────────────────────

/// A template with every pattern compiled and every mapping resolved.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub id: String,
    pub name: String,
    pub form: ReturnForm,
    pub version: String,
    pub combined_layout: CombinedLayout,
    pub export_file: String,
    pub fields: Vec<FieldRule>,
    pub tables: Vec<TableRule>,
    pub payment: Option<PaymentRule>,
}

impl CompiledTemplate {
    /// Schemas of the category tables, in template order.
    pub fn table_schemas(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.iter().map(|t| &t.schema)
    }

    #[must_use]
    pub fn payment_schema(&self) -> Option<&PaymentSchema> {
        self.payment.as_ref().map(|p| &p.schema)
    }
}

impl ReturnTemplate {
    /// Compiles every pattern and validates the template.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile, a table has no
    /// columns or categories, a payment position names an unknown field, or
    /// a (tax head, section) pair has more than one layout.
    pub fn compile(&self) -> Result<CompiledTemplate, TemplateError> {
        let fields = self
            .fields
            .iter()
            .map(|f| {
                Ok(FieldRule {
                    field: f.field,
                    pattern: Regex::new(&f.pattern).map_err(|e| self.regex_error(e))?,
                })
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        let tables = self
            .tables
            .iter()
            .map(|t| self.compile_table(t))
            .collect::<Result<Vec<_>, _>>()?;

        let payment = self
            .payment
            .as_ref()
            .map(|p| self.compile_payment(p))
            .transpose()?;

        Ok(CompiledTemplate {
            id: self.id.clone(),
            name: self.name.clone(),
            form: self.form,
            version: self.version.clone(),
            combined_layout: self.combined_layout,
            export_file: self.export_file.clone(),
            fields,
            tables,
            payment,
        })
    }

    fn compile_table(&self, table: &TableConfig) -> Result<TableRule, TemplateError> {
        let width = table.columns.len();
        if width == 0 {
            return Err(self.invalid(format!("table {} has no columns", table.id)));
        }
        if table.categories.is_empty() {
            return Err(self.invalid(format!("table {} has no categories", table.id)));
        }

        let values = vec![NUM_CAPTURE; width].join(r"\s+");
        let categories = table
            .categories
            .iter()
            .map(|c| {
                let patterns = c
                    .patterns
                    .iter()
                    .map(|p| {
                        let expanded = p.replace("{values}", &values).replace("{num}", NUM_CAPTURE);
                        RegexBuilder::new(&expanded)
                            .case_insensitive(table.case_insensitive)
                            .multi_line(true)
                            .dot_matches_new_line(true)
                            .build()
                            .map_err(|e| self.regex_error(e))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(CategoryRule {
                    label: c.label.clone(),
                    grid_keywords: c.grid_keywords.iter().map(|k| k.to_lowercase()).collect(),
                    patterns,
                    line_keywords: c.line_keywords.clone(),
                })
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        Ok(TableRule {
            schema: TableSchema {
                id: table.id.clone(),
                title: table.title.clone(),
                label_column: table.label_column.clone(),
                columns: table.columns.clone(),
                categories: table.categories.iter().map(|c| c.label.clone()).collect(),
            },
            section: table.section.clone(),
            strategies: table.strategies.clone(),
            categories,
            min_line_values: table.min_line_values.unwrap_or(width),
        })
    }

    fn compile_payment(&self, payment: &PaymentConfig) -> Result<PaymentRule, TemplateError> {
        let mut layouts = BTreeMap::new();

        for layout in &payment.layouts {
            let positions = layout
                .positions
                .iter()
                .map(|(name, position)| {
                    PaymentField::from_str(name)
                        .map(|field| (field, *position))
                        .map_err(|_| self.invalid(format!("unknown payment field {name:?}")))
                })
                .collect::<Result<Vec<_>, _>>()?;

            for section in &layout.sections {
                let compiled = PaymentLayout {
                    min_values: layout.min_values,
                    positions: positions.clone(),
                };
                if layouts.insert((layout.tax, *section), compiled).is_some() {
                    return Err(self.invalid(format!(
                        "duplicate {} layout for {}",
                        layout.tax, section
                    )));
                }
            }
        }

        let lower = |v: &[String]| v.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();
        let marker = |section, config: &MarkerConfig| SectionMarker {
            section,
            any: lower(&config.any),
            exclude: lower(&config.exclude),
        };

        Ok(PaymentRule {
            schema: PaymentSchema {
                id: payment.id.clone(),
                title: payment.title.clone(),
                columns: payment.columns.clone(),
            },
            section: payment.section.clone(),
            markers: vec![
                marker(
                    PaymentSection::OtherThanReverseCharge,
                    &payment.markers.other_than_reverse_charge,
                ),
                marker(PaymentSection::ReverseCharge, &payment.markers.reverse_charge),
            ],
            skip: lower(&payment.skip),
            min_line_len: payment.min_line_len,
            layouts,
        })
    }

    fn regex_error(&self, source: regex::Error) -> TemplateError {
        TemplateError::Regex {
            template: self.id.clone(),
            source,
        }
    }

    fn invalid(&self, message: String) -> TemplateError {
        TemplateError::Invalid {
            template: self.id.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
id = "mini"
name = "Minimal"
form = "gstr3b"
version = "2024"
combined_layout = "gstr3b_2024"
export_file = "mini.xlsx"

[[fields]]
field = "period"
pattern = 'Period\s+([A-Za-z]+)'

[[tables]]
id = "t"
title = "T"
label_column = "Details"
columns = ["A", "B"]
strategies = ["anchored_regex"]
section = { start = ["T start"] }

[[tables.categories]]
label = "(1) Row"
patterns = ['\(1\)\s+Row\s+{values}', 'Row total {num}']
"#;

    #[test]
    fn compiles_minimal_template() {
        let template = parse_template_toml("mini", MINIMAL).unwrap().compile().unwrap();
        assert_eq!(template.combined_layout, CombinedLayout::Gstr3b2024);
        assert_eq!(template.fields.len(), 1);
        assert!(template.payment.is_none());

        let table = &template.tables[0];
        assert_eq!(table.min_line_values, 2);
        assert_eq!(table.schema.categories, vec!["(1) Row"]);
        let pattern = &table.categories[0].patterns[0];
        let caps = pattern.captures("(1) ROW 1,000.00 2.50").unwrap();
        assert_eq!(&caps[1], "1,000.00");
        assert_eq!(&caps[2], "2.50");
        assert_eq!(table.categories[0].patterns[1].captures_len(), 2);
    }

    #[test]
    fn case_sensitive_tables_keep_pattern_case() {
        let toml = MINIMAL.replace(
            r#"strategies = ["anchored_regex"]"#,
            "strategies = [\"anchored_regex\"]\ncase_insensitive = false",
        );
        let template = parse_template_toml("mini", &toml).unwrap().compile().unwrap();
        let pattern = &template.tables[0].categories[0].patterns[0];
        assert!(pattern.captures("(1) ROW 1.00 2.00").is_none());
        assert!(pattern.captures("(1) Row 1.00 2.00").is_some());
    }

    #[test]
    fn invalid_regex_is_reported() {
        let broken = MINIMAL.replace(r"Period\s+([A-Za-z]+)", r"Period\s+([A-Za-z]+");
        let err = parse_template_toml("mini", &broken)
            .unwrap()
            .compile()
            .unwrap_err();
        assert!(matches!(err, TemplateError::Regex { .. }));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = parse_template_toml("bad", "id = ").unwrap_err();
        assert!(matches!(err, TemplateError::Toml { ref id, .. } if id == "bad"));
    }

    #[test]
    fn duplicate_payment_layouts_are_rejected() {
        let with_payment = format!(
            "{MINIMAL}\n{}",
            r#"
[payment]
id = "p"
title = "P"
section = { start = ["6.1 Payment of tax"] }
columns = [{ field = "tax_payable", header = "Tax payable" }]

[payment.markers]
other_than_reverse_charge = { any = ["other than reverse charge"] }
reverse_charge = { any = ["reverse charge"], exclude = ["other than"] }

[[payment.layouts]]
tax = "cess"
sections = ["other_than_reverse_charge", "reverse_charge"]
min_values = 1
positions = { tax_payable = 0 }

[[payment.layouts]]
tax = "cess"
sections = ["reverse_charge"]
min_values = 1
positions = { tax_payable = 0 }
"#
        );
        let err = parse_template_toml("mini", &with_payment)
            .unwrap()
            .compile()
            .unwrap_err();
        assert!(matches!(err, TemplateError::Invalid { .. }));
    }

    #[test]
    fn unknown_payment_field_is_rejected() {
        let with_payment = format!(
            "{MINIMAL}\n{}",
            r#"
[payment]
id = "p"
title = "P"
section = { start = ["6.1 Payment of tax"] }
columns = []

[payment.markers]
other_than_reverse_charge = { any = ["other than reverse charge"] }
reverse_charge = { any = ["reverse charge"] }

[[payment.layouts]]
tax = "cess"
sections = ["reverse_charge"]
min_values = 1
positions = { surcharge = 0 }
"#
        );
        let err = parse_template_toml("mini", &with_payment)
            .unwrap()
            .compile()
            .unwrap_err();
        assert!(
            matches!(err, TemplateError::Invalid { ref message, .. } if message.contains("surcharge"))
        );
    }
}
