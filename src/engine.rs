//! Payroll computation engine.
//!
//! The `engine` module turns loaded employees and income records into
//! point-in-time payroll views.  It uses the [`rayon`] crate to build
//! the snapshots of many income records in parallel.  Salaries are
//! always resolved through [`crate::timeline`], never taken from stored
//! salary records, so that mis-entered historical payments do not leak
//! into payroll totals or payslips.

use crate::models::{
    CompanyInfo, Employee, IncomeRecord, PaymentStatus, PayrollLine, PayrollSnapshot,
    SalaryRecord,
};
use crate::period::MonthYear;
use crate::timeline::{effective_terms_for_month, has_joined_by_month, latest_promotion_month};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Builds one payroll snapshot per income record.  Output order matches
/// `records`.
pub fn build_payroll_snapshots(employees: &[Employee], records: &[IncomeRecord]) -> Vec<PayrollSnapshot> {
    records
        .par_iter()
        .map(|record| payroll_snapshot(employees, record))
        .collect()
}

/// Payroll for the period of `record`: every employee who had joined
/// by then, at the salary and position in force that month.
pub fn payroll_snapshot(employees: &[Employee], record: &IncomeRecord) -> PayrollSnapshot {
    let period = record.period();
    // Only legacy records carry an AUD rate to show salaries against.
    let aud_rate = record.conversion_rate.filter(|rate| *rate > 0.0);

    let lines: Vec<PayrollLine> = employees
        .iter()
        .filter(|employee| has_joined_by_month(employee, period.month, period.year))
        .map(|employee| {
            let terms = effective_terms_for_month(employee, period.month, period.year);
            PayrollLine {
                employee_id: employee.employee_id.clone(),
                name: employee.name.clone(),
                position: terms.position,
                salary: terms.salary,
                currency: employee.currency.clone(),
                salary_aud: aud_rate.map(|rate| terms.salary / rate),
            }
        })
        .collect();
    let total_salaries = lines.iter().map(|line| line.salary).sum();

    PayrollSnapshot {
        income_record_id: record.id.clone(),
        period,
        lines,
        total_salaries,
    }
}

/// Sum of effective salaries of everyone employed in `period`.
pub fn total_salaries_for_month(employees: &[Employee], period: MonthYear) -> f64 {
    employees
        .iter()
        .filter(|employee| has_joined_by_month(employee, period.month, period.year))
        .map(|employee| effective_terms_for_month(employee, period.month, period.year).salary)
        .sum()
}

/// Which salary a backfilled month is recorded at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryBasis {
    /// The employee's current `basic_salary` for every month.
    #[default]
    Current,
    /// The salary in force that month, per the promotion timeline.
    Timeline,
}

/// Salary records a backfill would create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillPlan {
    pub records: Vec<SalaryRecord>,
    /// Months left out because the employee already has a record for
    /// them, or because the month does not exist.
    pub skipped: Vec<MonthYear>,
}

/// Last calendar day of `period`, or `None` for an invalid month.
pub fn month_end(period: MonthYear) -> Option<NaiveDate> {
    if !period.is_valid() {
        return None;
    }
    let next = period.succ();
    let first_of_next = NaiveDate::from_ymd_opt(next.year, next.month, 1)?;
    first_of_next.checked_sub_days(Days::new(1))
}

/// Plan one paid salary record per month of `start..=end` for
/// `employee`, dated the last day of each month.
///
/// With [`SalaryBasis::Current`] every month is recorded at today's
/// `basic_salary`, which overstates months before a promotion.  That
/// case is logged rather than silently corrected.
pub fn plan_backfill(
    employee: &Employee,
    start: MonthYear,
    end: MonthYear,
    basis: SalaryBasis,
    existing: &[SalaryRecord],
) -> BackfillPlan {
    if basis == SalaryBasis::Current {
        if let Some(promoted) = latest_promotion_month(employee) {
            if promoted >= start {
                warn!(
                    employee_id = %employee.employee_id,
                    %start,
                    latest_promotion = %promoted,
                    "backfill at current salary covers months before the latest promotion took effect"
                );
            }
        }
    }

    let mut plan = BackfillPlan {
        records: Vec::new(),
        skipped: Vec::new(),
    };
    for period in MonthYear::range_inclusive(start, end) {
        let already_paid = existing
            .iter()
            .any(|r| r.employee_id == employee.employee_id && r.period() == period);
        let payment_date = month_end(period);
        let Some(payment_date) = payment_date.filter(|_| !already_paid) else {
            plan.skipped.push(period);
            continue;
        };
        let amount = match basis {
            SalaryBasis::Current => employee.basic_salary,
            SalaryBasis::Timeline => effective_terms_for_month(employee, period.month, period.year).salary,
        };
        plan.records.push(SalaryRecord {
            id: String::new(),
            employee_id: employee.employee_id.clone(),
            employee_name: employee.name.clone(),
            month: period.month,
            year: period.year,
            amount,
            items: Vec::new(),
            payment_date,
            status: PaymentStatus::Paid,
            created_at: None,
        });
    }
    plan
}

/// One row of the payslip's earnings/deductions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipRow {
    pub label: String,
    pub amount: f64,
}

/// Everything a payslip renderer needs, resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payslip {
    pub file_name: String,
    /// Issuer block for the header.
    pub company: CompanyInfo,
    pub period: MonthYear,
    pub period_label: String,
    pub payment_date: NaiveDate,
    pub employee_id: String,
    pub name: String,
    pub address: String,
    pub position: String,
    pub currency: String,
    pub earnings: Vec<PayslipRow>,
    pub deductions: Vec<PayslipRow>,
    pub total_earnings: f64,
    pub total_deductions: f64,
    pub net_salary: f64,
}

/// Resolve the payslip `company` issues for `record`.  The salary comes
/// from the timeline; `record.amount` is ignored.
pub fn payslip(company: &CompanyInfo, employee: &Employee, record: &SalaryRecord) -> Payslip {
    let period = record.period();
    let terms = effective_terms_for_month(employee, period.month, period.year);
    let total_deductions = 0.0;

    Payslip {
        file_name: format!(
            "Payslip_{}_{}_{:02}.pdf",
            employee.employee_id, period.year, period.month
        ),
        company: company.clone(),
        period,
        period_label: period.to_string(),
        payment_date: record.payment_date,
        employee_id: employee.employee_id.clone(),
        name: employee.name.clone(),
        address: employee.address.clone(),
        position: terms.position,
        currency: employee.currency.clone(),
        earnings: vec![PayslipRow {
            label: "Basic Salary".to_string(),
            amount: terms.salary,
        }],
        deductions: Vec::new(),
        total_earnings: terms.salary,
        total_deductions,
        net_salary: terms.salary - total_deductions,
    }
}
