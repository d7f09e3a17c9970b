#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for extracted GST return data.
//!
//! Every extraction pass produces the same handful of shapes regardless of
//! which return template was used: one [`GeneralDetails`] per document,
//! fixed-shape [`TableRow`]s for category tables (Table 3.1, Table 4, ...)
//! and [`PaymentRow`]s for the section-tagged payment table (Table 6.1).
//! Rows always carry the name of the document they came from so they can
//! be joined and filtered after aggregation.

pub mod gst_state;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Value used for any scalar field whose pattern did not match.
pub const NOT_FOUND: &str = "Not Found";

/// Value used when a GSTIN prefix does not map to a known state.
pub const UNKNOWN_STATE: &str = "Unknown";

/// Family of return a template reads.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReturnForm {
    /// GSTR-1: outward supplies.
    Gstr1,
    /// GSTR-3B: summary return with ITC and payment of tax.
    Gstr3b,
}

/// Column set of the combined view for a template.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CombinedLayout {
    /// GSTR-3B filed on the 2024 form: one "Tax Paid Through ITC" total.
    #[serde(rename = "gstr3b_2024")]
    #[strum(serialize = "gstr3b_2024")]
    Gstr3b2024,
    /// GSTR-3B filed on the 2025 form: liability adjustment columns and a
    /// column per ITC head.
    #[serde(rename = "gstr3b_2025")]
    #[strum(serialize = "gstr3b_2025")]
    Gstr3b2025,
    /// General details, then the union of every table's value columns.
    Generic,
}

/// A scalar field of [`GeneralDetails`] that is pulled from document text.
///
/// The state is not listed here because it is derived from the GSTIN
/// rather than matched directly.
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
pub enum GeneralField {
    Gstin,
    LegalName,
    FilingDate,
    FinancialYear,
    Period,
}

impl GeneralField {
    /// Returns all fields in output column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Gstin,
            Self::LegalName,
            Self::FilingDate,
            Self::FinancialYear,
            Self::Period,
        ]
    }

    /// Column header used in tabular output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gstin => "GSTIN",
            Self::LegalName => "Legal Name",
            Self::FilingDate => "Date",
            Self::FinancialYear => "Financial Year",
            Self::Period => "Period",
        }
    }
}

/// Scalar header fields of one filed return.
///
/// Unmatched fields hold [`NOT_FOUND`]; an unmapped state holds
/// [`UNKNOWN_STATE`]. The shape never varies between documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralDetails {
    /// Name of the source document.
    pub document: String,
    pub gstin: String,
    /// State or territory derived from the first two GSTIN characters.
    pub state: String,
    pub legal_name: String,
    pub filing_date: String,
    pub financial_year: String,
    pub period: String,
}

impl GeneralDetails {
    /// Creates details for `document` with every field unresolved.
    #[must_use]
    pub fn unresolved(document: &str) -> Self {
        Self {
            document: document.to_owned(),
            gstin: NOT_FOUND.to_owned(),
            state: UNKNOWN_STATE.to_owned(),
            legal_name: NOT_FOUND.to_owned(),
            filing_date: NOT_FOUND.to_owned(),
            financial_year: NOT_FOUND.to_owned(),
            period: NOT_FOUND.to_owned(),
        }
    }

    /// Returns the value held for `field`.
    #[must_use]
    pub fn get(&self, field: GeneralField) -> &str {
        match field {
            GeneralField::Gstin => &self.gstin,
            GeneralField::LegalName => &self.legal_name,
            GeneralField::FilingDate => &self.filing_date,
            GeneralField::FinancialYear => &self.financial_year,
            GeneralField::Period => &self.period,
        }
    }

    /// Sets `field`, re-deriving the state when the GSTIN changes.
    pub fn set(&mut self, field: GeneralField, value: String) {
        match field {
            GeneralField::Gstin => {
                gst_state::state_from_gstin(&value).clone_into(&mut self.state);
                self.gstin = value;
            }
            GeneralField::LegalName => self.legal_name = value,
            GeneralField::FilingDate => self.filing_date = value,
            GeneralField::FinancialYear => self.financial_year = value,
            GeneralField::Period => self.period = value,
        }
    }
}

/// Which recovery strategy produced a table row.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecoveryStrategy {
    /// Matched against a row of a clustered table grid.
    Grid,
    /// Matched by one of the category's regex variants.
    AnchoredRegex,
    /// Numbers pulled from a keyword-bearing line.
    LineScan,
    /// Nothing matched; the row is zero-filled.
    Default,
}

/// Column layout of a category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Stable identifier, e.g. `table_4`.
    pub id: String,
    /// Display title, e.g. `Table 4`.
    pub title: String,
    /// Header of the category label column.
    pub label_column: String,
    /// Headers of the numeric value columns, in positional order.
    pub columns: Vec<String>,
    /// Category labels in their fixed output order.
    pub categories: Vec<String>,
}

/// One category of a category table, recovered from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    /// Name of the source document.
    pub document: String,
    /// Identifier of the [`TableSchema`] this row belongs to.
    pub table: String,
    pub label: String,
    /// One value per schema column.
    pub values: Vec<f64>,
    pub strategy: RecoveryStrategy,
}

impl TableRow {
    /// Returns `true` when the row was zero-filled rather than recovered.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.strategy == RecoveryStrategy::Default
    }
}

/// Tax component a payment row reports on.
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
pub enum TaxHead {
    Integrated,
    Central,
    StateUt,
    Cess,
}

impl TaxHead {
    /// Returns all tax heads in output order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Integrated, Self::Central, Self::StateUt, Self::Cess]
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Integrated => "Integrated tax",
            Self::Central => "Central tax",
            Self::StateUt => "State/UT tax",
            Self::Cess => "Cess",
        }
    }

    /// Lowercase prefix that opens a payment line for this tax head.
    #[must_use]
    pub const fn line_prefix(self) -> &'static str {
        match self {
            Self::Integrated => "integrated",
            Self::Central => "central",
            Self::StateUt => "state/ut",
            Self::Cess => "cess",
        }
    }
}

/// Liability regime of a payment row.
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
pub enum PaymentSection {
    /// Section (A): liabilities other than reverse charge.
    OtherThanReverseCharge,
    /// Section (B): reverse charge liabilities.
    ReverseCharge,
}

impl PaymentSection {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::OtherThanReverseCharge, Self::ReverseCharge]
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OtherThanReverseCharge => "(A) Other than reverse charge",
            Self::ReverseCharge => "(B) Reverse charge",
        }
    }
}

/// A named value slot of a payment row.
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
pub enum PaymentField {
    TaxPayable,
    AdjustmentOfNegativeLiability,
    NetTaxPayable,
    ItcIntegrated,
    ItcCentral,
    ItcStateUt,
    ItcCess,
    PaidInCash,
    InterestPaidInCash,
    LateFeePaidInCash,
}

impl PaymentField {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::TaxPayable,
            Self::AdjustmentOfNegativeLiability,
            Self::NetTaxPayable,
            Self::ItcIntegrated,
            Self::ItcCentral,
            Self::ItcStateUt,
            Self::ItcCess,
            Self::PaidInCash,
            Self::InterestPaidInCash,
            Self::LateFeePaidInCash,
        ]
    }

    /// Returns `true` for the four "paid through ITC" slots.
    #[must_use]
    pub const fn is_itc(self) -> bool {
        matches!(
            self,
            Self::ItcIntegrated | Self::ItcCentral | Self::ItcStateUt | Self::ItcCess
        )
    }
}

/// Payment breakdown of one tax head within one section.
///
/// Slots a given document version does not report stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentValues {
    pub tax_payable: f64,
    pub adjustment_of_negative_liability: f64,
    pub net_tax_payable: f64,
    pub itc_integrated: f64,
    pub itc_central: f64,
    pub itc_state_ut: f64,
    pub itc_cess: f64,
    pub paid_in_cash: f64,
    pub interest_paid_in_cash: f64,
    pub late_fee_paid_in_cash: f64,
}

impl PaymentValues {
    #[must_use]
    pub const fn get(&self, field: PaymentField) -> f64 {
        match field {
            PaymentField::TaxPayable => self.tax_payable,
            PaymentField::AdjustmentOfNegativeLiability => self.adjustment_of_negative_liability,
            PaymentField::NetTaxPayable => self.net_tax_payable,
            PaymentField::ItcIntegrated => self.itc_integrated,
            PaymentField::ItcCentral => self.itc_central,
            PaymentField::ItcStateUt => self.itc_state_ut,
            PaymentField::ItcCess => self.itc_cess,
            PaymentField::PaidInCash => self.paid_in_cash,
            PaymentField::InterestPaidInCash => self.interest_paid_in_cash,
            PaymentField::LateFeePaidInCash => self.late_fee_paid_in_cash,
        }
    }

    pub fn set(&mut self, field: PaymentField, value: f64) {
        let slot = match field {
            PaymentField::TaxPayable => &mut self.tax_payable,
            PaymentField::AdjustmentOfNegativeLiability => {
                &mut self.adjustment_of_negative_liability
            }
            PaymentField::NetTaxPayable => &mut self.net_tax_payable,
            PaymentField::ItcIntegrated => &mut self.itc_integrated,
            PaymentField::ItcCentral => &mut self.itc_central,
            PaymentField::ItcStateUt => &mut self.itc_state_ut,
            PaymentField::ItcCess => &mut self.itc_cess,
            PaymentField::PaidInCash => &mut self.paid_in_cash,
            PaymentField::InterestPaidInCash => &mut self.interest_paid_in_cash,
            PaymentField::LateFeePaidInCash => &mut self.late_fee_paid_in_cash,
        };
        *slot = value;
    }

    /// Sum of the four "paid through ITC" slots.
    #[must_use]
    pub fn itc_total(&self) -> f64 {
        PaymentField::all()
            .iter()
            .filter(|f| f.is_itc())
            .map(|f| self.get(*f))
            .sum()
    }
}

/// One output column of a payment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentColumn {
    pub field: PaymentField,
    pub header: String,
}

/// Column layout of a section-tagged payment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSchema {
    pub id: String,
    pub title: String,
    /// Value columns reported by this document version, after the tax
    /// type and section columns.
    pub columns: Vec<PaymentColumn>,
}

/// One tax head of the payment table, tagged with its section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRow {
    /// Name of the source document.
    pub document: String,
    pub tax: TaxHead,
    pub section: PaymentSection,
    pub values: PaymentValues,
    /// `false` when the row was zero-filled because no line matched.
    pub recovered: bool,
}
