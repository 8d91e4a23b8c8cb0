//! Data models for the Payroll Ledger.
//!
//! The `models` module defines the serialisable entities the dashboard
//! stores (employees with their promotion history, salary payments and
//! monthly income records) together with the input and output
//! structures of the calculators.  Field names use `camelCase` on the
//! wire so that documents written by older versions of the dashboard
//! deserialise unchanged.

use crate::period::MonthYear;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Employment status of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmployeeStatus {
    #[serde(rename = "probation")]
    Probation,
    #[serde(rename = "parttime", alias = "part-time")]
    PartTime,
    #[serde(rename = "fulltime", alias = "full-time")]
    FullTime,
    #[serde(rename = "on notice", alias = "on-notice")]
    OnNotice,
    #[serde(rename = "fired")]
    Fired,
    #[serde(rename = "resigned")]
    Resigned,
}

impl EmployeeStatus {
    /// Whether the employee is still working for the company.
    pub fn is_active(self) -> bool {
        !matches!(self, EmployeeStatus::Fired | EmployeeStatus::Resigned)
    }
}

/// An employee record.
///
/// `position` and `basic_salary` always hold the values set by the most
/// recent promotion (or the hire values if there is none).  Salaries
/// for past months are reconstructed from `promotions` by
/// [`crate::timeline`]; they are never stored per month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Internal record id owned by the store.
    #[serde(default)]
    pub id: String,
    /// Externally assigned identifier, e.g. `"SC-004"`.
    pub employee_id: String,
    pub name: String,
    pub address: String,
    pub position: String,
    pub basic_salary: f64,
    pub currency: String,
    pub joining_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: EmployeeStatus,
    #[serde(default)]
    pub contract_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_sent_date: Option<NaiveDate>,
    /// When `status` last changed.  Drives the fired-employee
    /// retention filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_change_date: Option<DateTime<Utc>>,
    /// Promotions in insertion order.  Insertion order is not
    /// chronological order; sort by `date` before use.
    #[serde(default)]
    pub promotions: Vec<Promotion>,
    /// Optimistic concurrency token, bumped on every write.
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A position/salary transition.
///
/// `from_*` values are in force before the month containing `date` has
/// ended; `to_*` values apply from the following month onwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub date: NaiveDate,
    pub from_position: String,
    pub to_position: String,
    pub from_salary: f64,
    pub to_salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for hiring a new employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub employee_id: String,
    pub name: String,
    pub address: String,
    pub position: String,
    pub basic_salary: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub joining_date: NaiveDate,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_status")]
    pub status: EmployeeStatus,
    #[serde(default)]
    pub contract_sent: bool,
}

fn default_currency() -> String {
    "NPR".to_string()
}

fn default_status() -> EmployeeStatus {
    EmployeeStatus::Probation
}

/// Payload for appending a promotion.  `from_position` and
/// `from_salary` default to the employee's current values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotion {
    pub date: NaiveDate,
    pub to_position: String,
    pub to_salary: f64,
    #[serde(default)]
    pub from_position: Option<String>,
    #[serde(default)]
    pub from_salary: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// The `version` the caller last read.  When present, the append is
    /// rejected if the employee changed in the meantime.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// The issuing company, printed in the payslip header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
    /// Permanent account number (tax registration).
    pub pan_no: String,
    pub email: String,
    pub phone: String,
}

/// One itemised line of a salary payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryItem {
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

/// A salary payment to one employee for one month.
///
/// Bookkeeping only: `amount` is what was recorded as paid, which is
/// not authoritative for what the employee *should* have earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRecord {
    #[serde(default)]
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub month: u32,
    pub year: i32,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<SalaryItem>,
    pub payment_date: NaiveDate,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SalaryRecord {
    pub fn period(&self) -> MonthYear {
        MonthYear::new(self.month, self.year)
    }
}

/// Payload for recording a salary payment.  When `items` is non-empty
/// the stored `amount` is their sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSalaryRecord {
    pub employee_id: String,
    pub month: u32,
    pub year: i32,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub items: Vec<SalaryItem>,
    pub payment_date: NaiveDate,
    #[serde(default = "default_payment_status")]
    pub status: PaymentStatus,
}

fn default_payment_status() -> PaymentStatus {
    PaymentStatus::Paid
}

impl NewSalaryRecord {
    /// The amount to persist: the item total when items are given,
    /// otherwise the entered amount.
    pub fn total_amount(&self) -> f64 {
        if self.items.is_empty() {
            self.amount
        } else {
            self.items.iter().map(|item| item.amount).sum()
        }
    }
}

/// A payment made to one person out of a month's income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayment {
    #[serde(default)]
    pub employee_name: String,
    pub amount: f64,
    #[serde(default)]
    pub charges: f64,
}

impl EmployeePayment {
    /// Amount plus transfer charges.
    pub fn total(&self) -> f64 {
        self.amount + self.charges
    }
}

/// Financial inputs for one month, as entered by the user.  Exchange
/// rates are manual inputs, never fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeInputs {
    pub original_aud_salary: f64,
    pub usd_amount: f64,
    /// NPR per 1 USD.
    pub usd_rate: f64,
    pub npr_received: f64,
    pub bank_cuts_known: f64,
    #[serde(default)]
    pub employee_payments: Vec<EmployeePayment>,
}

/// Values derived from [`IncomeInputs`] by
/// [`crate::ledger::compute_income_ledger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeLedger {
    /// `usd_amount * usd_rate`.  Shown in previews, not persisted.
    pub actual_converted_npr: f64,
    pub bank_cuts_hidden: f64,
    pub total_employee_payments: f64,
    pub profit_loss_npr: f64,
    pub profit_loss_aud: f64,
    pub profit_loss_usd: f64,
}

/// Payload for creating an income record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncomeRecord {
    pub month: u32,
    pub year: i32,
    #[serde(flatten)]
    pub inputs: IncomeInputs,
}

/// The income and profit/loss ledger entry of one month.
///
/// Records written by the current schema carry `original_aud_salary`
/// and the fields next to it.  Records from the earlier schema carry the
/// legacy block instead (`total_aud_received` ...).  Both shapes must
/// be readable, see [`crate::ledger::LedgerView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    #[serde(default)]
    pub id: String,
    pub month: u32,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_aud_salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npr_received: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_cuts_known: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_cuts_hidden: Option<f64>,
    #[serde(default)]
    pub employee_payments: Vec<EmployeePayment>,
    /// Profit/loss as stored when the record was written.  Legacy
    /// records may lack some of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_loss_npr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_loss_aud: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_loss_usd: Option<f64>,
    // Legacy schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_aud_received: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founder_salary_aud: Option<f64>,
    /// AUD to NPR.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_cuts_npr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_employee_salaries_npr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IncomeRecord {
    pub fn period(&self) -> MonthYear {
        MonthYear::new(self.month, self.year)
    }

    /// Build a current-schema record from entered inputs and the ledger
    /// computed for them.
    pub fn from_ledger(period: MonthYear, inputs: IncomeInputs, ledger: IncomeLedger) -> Self {
        Self {
            id: String::new(),
            month: period.month,
            year: period.year,
            original_aud_salary: Some(inputs.original_aud_salary),
            usd_amount: Some(inputs.usd_amount),
            usd_rate: Some(inputs.usd_rate),
            npr_received: Some(inputs.npr_received),
            bank_cuts_known: Some(inputs.bank_cuts_known),
            bank_cuts_hidden: Some(ledger.bank_cuts_hidden),
            employee_payments: inputs.employee_payments,
            profit_loss_npr: Some(ledger.profit_loss_npr),
            profit_loss_aud: Some(ledger.profit_loss_aud),
            profit_loss_usd: Some(ledger.profit_loss_usd),
            total_aud_received: None,
            founder_salary_aud: None,
            conversion_rate: None,
            bank_cuts_npr: None,
            total_employee_salaries_npr: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Which income records to return.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IncomeFilter {
    /// Every record.
    #[default]
    All,
    /// Records whose period is one of the given months.
    Periods(Vec<MonthYear>),
}

/// One employee's line in a month's payroll snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollLine {
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub salary: f64,
    pub currency: String,
    /// `salary / conversionRate` for legacy records that carry a rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_aud: Option<f64>,
}

/// Point-in-time payroll for the period of one income record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSnapshot {
    pub income_record_id: String,
    pub period: MonthYear,
    pub lines: Vec<PayrollLine>,
    pub total_salaries: f64,
}
