//! Monthly income reconciliation.
//!
//! Client income arrives in USD (invoiced against an AUD salary) and is
//! converted to NPR by the bank.  The bank discloses some fees; the rest
//! of the shortfall between the clean conversion and what actually
//! arrived is attributed to hidden cuts.  What remains after fees and
//! employee payments is the month's profit or loss, reported in NPR,
//! AUD and USD.
//!
//! All arithmetic is plain `f64` with no rounding.  Zero denominators
//! yield `0` for the dependent ratio instead of `inf`/`NaN`, so that a
//! half-filled form still previews.

use crate::models::{EmployeePayment, IncomeInputs, IncomeLedger, IncomeRecord};
use serde::{Deserialize, Serialize};

/// Derive hidden bank cuts and profit/loss from a month's inputs.
pub fn compute_income_ledger(inputs: &IncomeInputs) -> IncomeLedger {
    let actual_converted_npr = inputs.usd_amount * inputs.usd_rate;
    // Negative when more arrived than the clean conversion; kept as is.
    let bank_cuts_hidden = actual_converted_npr - inputs.npr_received;
    let total_employee_payments: f64 = inputs.employee_payments.iter().map(EmployeePayment::total).sum();

    let profit_loss_npr =
        inputs.npr_received - inputs.bank_cuts_known - bank_cuts_hidden - total_employee_payments;

    let aud_to_npr_rate = if inputs.original_aud_salary > 0.0 {
        actual_converted_npr / inputs.original_aud_salary
    } else {
        0.0
    };
    let profit_loss_aud = if aud_to_npr_rate > 0.0 {
        profit_loss_npr / aud_to_npr_rate
    } else {
        0.0
    };
    let profit_loss_usd = if inputs.usd_rate > 0.0 {
        profit_loss_npr / inputs.usd_rate
    } else {
        0.0
    };

    IncomeLedger {
        actual_converted_npr,
        bank_cuts_hidden,
        total_employee_payments,
        profit_loss_npr,
        profit_loss_aud,
        profit_loss_usd,
    }
}

/// Drop payment lines that were left blank on the entry form: no name,
/// or neither an amount nor charges.
pub fn retain_entered_payments(payments: Vec<EmployeePayment>) -> Vec<EmployeePayment> {
    payments
        .into_iter()
        .filter(|p| !p.employee_name.trim().is_empty() && (p.amount != 0.0 || p.charges != 0.0))
        .collect()
}

/// Inputs of the earlier record schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyInputs {
    pub total_aud_received: f64,
    pub founder_salary_aud: f64,
    /// AUD to NPR.
    pub conversion_rate: f64,
    pub bank_cuts_npr: f64,
    pub total_employee_salaries_npr: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyLedger {
    /// NPR left for employees after the founder's share and bank fees.
    pub available_npr: f64,
    pub profit_loss_npr: f64,
    pub profit_loss_aud: f64,
}

/// The earlier schema's computation: the founder's AUD share comes off
/// the top, the remainder is converted to NPR, bank fees are deducted
/// and employee salaries are paid from what is left.
pub fn compute_legacy_ledger(inputs: &LegacyInputs) -> LegacyLedger {
    let rate = inputs.conversion_rate;
    let available_npr =
        (inputs.total_aud_received - inputs.founder_salary_aud) * rate - inputs.bank_cuts_npr;
    let profit_loss_npr = available_npr - inputs.total_employee_salaries_npr;
    let profit_loss_aud = if rate > 0.0 { profit_loss_npr / rate } else { 0.0 };

    LegacyLedger {
        available_npr,
        profit_loss_npr,
        profit_loss_aud,
    }
}

/// Summary of a current-schema record as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSummary {
    pub original_aud_salary: f64,
    pub usd_amount: f64,
    pub npr_received: f64,
    pub bank_cuts_known: f64,
    pub bank_cuts_hidden: f64,
    pub total_employee_payments: f64,
    pub profit_loss_npr: f64,
    pub profit_loss_aud: f64,
    pub profit_loss_usd: f64,
}

/// A reader's view of an income record, whichever schema wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum LedgerView {
    Current(CurrentSummary),
    Legacy {
        #[serde(flatten)]
        inputs: LegacyInputs,
        #[serde(flatten)]
        ledger: LegacyLedger,
    },
}

impl LedgerView {
    /// Current-schema records are recognised by `original_aud_salary`;
    /// everything else is read as legacy.  Stored profit/loss figures
    /// win over recomputed ones; a legacy record without them gets the
    /// recomputed values.  Other missing numbers read as `0`.
    pub fn of(record: &IncomeRecord) -> Self {
        match record.original_aud_salary {
            Some(original_aud_salary) => LedgerView::Current(CurrentSummary {
                original_aud_salary,
                usd_amount: record.usd_amount.unwrap_or(0.0),
                npr_received: record.npr_received.unwrap_or(0.0),
                bank_cuts_known: record.bank_cuts_known.unwrap_or(0.0),
                bank_cuts_hidden: record.bank_cuts_hidden.unwrap_or(0.0),
                total_employee_payments: record.employee_payments.iter().map(EmployeePayment::total).sum(),
                profit_loss_npr: record.profit_loss_npr.unwrap_or(0.0),
                profit_loss_aud: record.profit_loss_aud.unwrap_or(0.0),
                profit_loss_usd: record.profit_loss_usd.unwrap_or(0.0),
            }),
            None => {
                let inputs = LegacyInputs {
                    total_aud_received: record.total_aud_received.unwrap_or(0.0),
                    founder_salary_aud: record.founder_salary_aud.unwrap_or(0.0),
                    conversion_rate: record.conversion_rate.unwrap_or(0.0),
                    bank_cuts_npr: record.bank_cuts_npr.unwrap_or(0.0),
                    total_employee_salaries_npr: record.total_employee_salaries_npr.unwrap_or(0.0),
                };
                let mut ledger = compute_legacy_ledger(&inputs);
                ledger.profit_loss_npr = record.profit_loss_npr.unwrap_or(ledger.profit_loss_npr);
                ledger.profit_loss_aud = record.profit_loss_aud.unwrap_or(ledger.profit_loss_aud);
                LedgerView::Legacy { inputs, ledger }
            }
        }
    }

    /// Profit/loss in NPR regardless of schema.
    pub fn profit_loss_npr(&self) -> f64 {
        match self {
            LedgerView::Current(summary) => summary.profit_loss_npr,
            LedgerView::Legacy { ledger, .. } => ledger.profit_loss_npr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::MonthYear;
    use serde_json::json;

    fn inputs(payments: Vec<EmployeePayment>) -> IncomeInputs {
        IncomeInputs {
            original_aud_salary: 10000.0,
            usd_amount: 6500.0,
            usd_rate: 133.5,
            npr_received: 850000.0,
            bank_cuts_known: 2500.0,
            employee_payments: payments,
        }
    }

    fn payment(name: &str, amount: f64, charges: f64) -> EmployeePayment {
        EmployeePayment {
            employee_name: name.into(),
            amount,
            charges,
        }
    }

    #[test]
    fn reconciles_reference_month() {
        let ledger = compute_income_ledger(&inputs(Vec::new()));
        assert_eq!(ledger.actual_converted_npr, 867750.0);
        assert_eq!(ledger.bank_cuts_hidden, 17750.0);
        assert_eq!(ledger.total_employee_payments, 0.0);
        assert_eq!(ledger.profit_loss_npr, 829750.0);
        // 867750 NPR for 10000 AUD is 86.775 NPR per AUD.
        assert!((ledger.profit_loss_aud - 829750.0 / 86.775).abs() < 1e-9);
        assert!((ledger.profit_loss_usd - 829750.0 / 133.5).abs() < 1e-9);
    }

    #[test]
    fn employee_payments_include_charges() {
        let ledger = compute_income_ledger(&inputs(vec![
            payment("Asha", 60000.0, 250.0),
            payment("Bikash", 45000.0, 0.0),
        ]));
        assert_eq!(ledger.total_employee_payments, 105250.0);
        assert_eq!(ledger.profit_loss_npr, 829750.0 - 105250.0);
    }

    #[test]
    fn zero_aud_salary_forces_zero_aud_result() {
        let mut input = inputs(vec![payment("Asha", 1000.0, 0.0)]);
        input.original_aud_salary = 0.0;
        let ledger = compute_income_ledger(&input);
        assert_eq!(ledger.profit_loss_aud, 0.0);
        assert!(ledger.profit_loss_usd.is_finite());
    }

    #[test]
    fn empty_form_previews_without_nan() {
        let ledger = compute_income_ledger(&IncomeInputs::default());
        assert_eq!(ledger, IncomeLedger::default());
    }

    #[test]
    fn hidden_cuts_may_be_negative() {
        let mut input = inputs(Vec::new());
        input.npr_received = 870000.0;
        let ledger = compute_income_ledger(&input);
        assert_eq!(ledger.bank_cuts_hidden, -2250.0);
        assert_eq!(ledger.profit_loss_npr, 870000.0 - 2500.0 + 2250.0);
    }

    #[test]
    fn blank_payment_lines_are_dropped() {
        let kept = retain_entered_payments(vec![
            payment("Asha", 1000.0, 0.0),
            payment("  ", 500.0, 10.0),
            payment("Bikash", 0.0, 0.0),
            payment("Chandra", 0.0, 15.0),
        ]);
        let names: Vec<_> = kept.iter().map(|p| p.employee_name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Chandra"]);
    }

    #[test]
    fn legacy_ledger_matches_old_formula() {
        let ledger = compute_legacy_ledger(&LegacyInputs {
            total_aud_received: 10000.0,
            founder_salary_aud: 3000.0,
            conversion_rate: 88.0,
            bank_cuts_npr: 4400.0,
            total_employee_salaries_npr: 300000.0,
        });
        assert!((ledger.available_npr - (7000.0 * 88.0 - 4400.0)).abs() < 1e-6);
        assert!((ledger.profit_loss_npr - (611600.0 - 300000.0)).abs() < 1e-6);
        assert!((ledger.profit_loss_aud - 311600.0 / 88.0).abs() < 1e-9);
    }

    #[test]
    fn legacy_ledger_with_zero_rate_is_finite() {
        let ledger = compute_legacy_ledger(&LegacyInputs {
            total_aud_received: 10000.0,
            total_employee_salaries_npr: 1000.0,
            ..LegacyInputs::default()
        });
        assert_eq!(ledger.profit_loss_aud, 0.0);
        assert_eq!(ledger.profit_loss_npr, -1000.0);

        let with_fees = compute_legacy_ledger(&LegacyInputs {
            total_aud_received: 10000.0,
            bank_cuts_npr: 4400.0,
            ..LegacyInputs::default()
        });
        assert_eq!(with_fees.available_npr, -4400.0);
    }

    #[test]
    fn view_branches_on_record_shape() {
        let legacy: IncomeRecord = serde_json::from_value(json!({
            "id": "old-1",
            "month": 3,
            "year": 2023,
            "totalAudReceived": 10000.0,
            "founderSalaryAud": 3000.0,
            "conversionRate": 88.0,
            "bankCutsNpr": 4400.0,
            "totalEmployeeSalariesNpr": 300000.0,
            "profitLossNpr": 311600.0,
            "profitLossAud": 3540.9,
            "profitLossUsd": 0.0
        }))
        .unwrap();
        match LedgerView::of(&legacy) {
            LedgerView::Legacy { inputs, ledger } => {
                assert_eq!(inputs.conversion_rate, 88.0);
                assert_eq!(ledger.profit_loss_npr, 311600.0);
                assert_eq!(ledger.profit_loss_aud, 3540.9);
            }
            other => panic!("expected legacy view, got {other:?}"),
        }

        let mut drifted = legacy.clone();
        drifted.profit_loss_npr = Some(300000.0);
        drifted.profit_loss_aud = None;
        match LedgerView::of(&drifted) {
            LedgerView::Legacy { ledger, .. } => {
                assert_eq!(ledger.profit_loss_npr, 300000.0);
                assert!((ledger.profit_loss_aud - 311600.0 / 88.0).abs() < 1e-6);
            }
            other => panic!("expected legacy view, got {other:?}"),
        }

        let input = inputs(vec![payment("Asha", 1000.0, 50.0)]);
        let ledger = compute_income_ledger(&input);
        let current = IncomeRecord::from_ledger(MonthYear::new(9, 2024), input, ledger);
        let view = LedgerView::of(&current);
        assert_eq!(view.profit_loss_npr(), ledger.profit_loss_npr);
        match view {
            LedgerView::Current(summary) => {
                assert_eq!(summary.total_employee_payments, 1050.0);
                assert_eq!(summary.bank_cuts_hidden, 17750.0);
            }
            other => panic!("expected current view, got {other:?}"),
        }
    }
}
