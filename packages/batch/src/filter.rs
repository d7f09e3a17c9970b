//! Multi-select filters over a batch's general details.
//!
//! Each [`FilterDimension`] is either left open ([`Selection::All`], the
//! "Select All" choice) or restricted to a set of values. A document is
//! kept only if it matches every dimension; table rows, payment rows and
//! the combined view follow the kept documents.

use std::collections::BTreeSet;

use gstr_extract_returns_models::GeneralDetails;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::aggregate::BatchResult;

/// The option that stands for every value of a dimension.
pub const SELECT_ALL: &str = "Select All";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterDimension {
    Period,
    State,
    Gstin,
    LegalName,
    FinancialYear,
}

impl FilterDimension {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Period,
            Self::State,
            Self::Gstin,
            Self::LegalName,
            Self::FinancialYear,
        ]
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Period => "Period",
            Self::State => "State",
            Self::Gstin => "GSTIN",
            Self::LegalName => "Legal Name",
            Self::FinancialYear => "Financial Year",
        }
    }

    /// The value of this dimension for one document.
    #[must_use]
    pub fn value(self, general: &GeneralDetails) -> &str {
        match self {
            Self::Period => &general.period,
            Self::State => &general.state,
            Self::Gstin => &general.gstin,
            Self::LegalName => &general.legal_name,
            Self::FinancialYear => &general.financial_year,
        }
    }
}

/// Selected values of one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl Selection {
    /// Builds a selection from chosen options.
    ///
    /// No options, or any option equal to [`SELECT_ALL`], selects
    /// everything.
    #[must_use]
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() || values.contains(SELECT_ALL) {
            Self::All
        } else {
            Self::Only(values)
        }
    }

    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(values) => values.contains(value),
        }
    }
}

/// One [`Selection`] per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub period: Selection,
    pub state: Selection,
    pub gstin: Selection,
    pub legal_name: Selection,
    pub financial_year: Selection,
}

impl Filters {
    #[must_use]
    pub const fn selection(&self, dimension: FilterDimension) -> &Selection {
        match dimension {
            FilterDimension::Period => &self.period,
            FilterDimension::State => &self.state,
            FilterDimension::Gstin => &self.gstin,
            FilterDimension::LegalName => &self.legal_name,
            FilterDimension::FinancialYear => &self.financial_year,
        }
    }

    pub fn set(&mut self, dimension: FilterDimension, selection: Selection) {
        let slot = match dimension {
            FilterDimension::Period => &mut self.period,
            FilterDimension::State => &mut self.state,
            FilterDimension::Gstin => &mut self.gstin,
            FilterDimension::LegalName => &mut self.legal_name,
            FilterDimension::FinancialYear => &mut self.financial_year,
        };
        *slot = selection;
    }

    /// Returns `true` if no dimension is restricted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        FilterDimension::all()
            .iter()
            .all(|d| *self.selection(*d) == Selection::All)
    }

    #[must_use]
    pub fn matches(&self, general: &GeneralDetails) -> bool {
        FilterDimension::all()
            .iter()
            .all(|d| self.selection(*d).matches(d.value(general)))
    }

    /// Restricts `result` to the documents whose general details match.
    ///
    /// Per-document errors are kept as they are.
    #[must_use]
    pub fn apply(&self, result: &BatchResult) -> BatchResult {
        let kept: BTreeSet<&str> = result
            .general
            .iter()
            .filter(|g| self.matches(g))
            .map(|g| g.document.as_str())
            .collect();

        log::debug!(
            "Filters keep {} of {} documents",
            kept.len(),
            result.general.len()
        );

        BatchResult {
            template: result.template.clone(),
            layout: result.layout,
            table_schemas: result.table_schemas.clone(),
            payment_schema: result.payment_schema.clone(),
            general: result
                .general
                .iter()
                .filter(|g| kept.contains(g.document.as_str()))
                .cloned()
                .collect(),
            tables: result
                .tables
                .iter()
                .filter(|r| kept.contains(r.document.as_str()))
                .cloned()
                .collect(),
            payments: result
                .payments
                .iter()
                .filter(|r| kept.contains(r.document.as_str()))
                .cloned()
                .collect(),
            errors: result.errors.clone(),
        }
    }
}

/// Distinct values of every dimension, in order of first appearance.
#[must_use]
pub fn filter_options(general: &[GeneralDetails]) -> Vec<(FilterDimension, Vec<String>)> {
    FilterDimension::all()
        .iter()
        .map(|dimension| {
            let mut seen = BTreeSet::new();
            let values = general
                .iter()
                .map(|g| dimension.value(g))
                .filter(|v| seen.insert(*v))
                .map(str::to_owned)
                .collect();
            (*dimension, values)
        })
        .collect()
}
