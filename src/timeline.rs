//! Salary timeline resolution.
//!
//! An employee record only stores the *current* position and salary.
//! What the employee earned in a past month is reconstructed from the
//! append-only promotion history.  A promotion dated in month M changes
//! pay from month M+1 onwards; month M itself is still paid at the old
//! rate.
//!
//! Everything here is pure and total: no I/O, no errors, no panics.

use crate::models::{Employee, Promotion};
use crate::period::MonthYear;

/// Salary and position in force for a given month.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveTerms {
    pub salary: f64,
    pub position: String,
}

/// True if the employee joined in or before `month`/`year`.
/// Day-of-month is ignored.
pub fn has_joined_by_month(employee: &Employee, month: u32, year: i32) -> bool {
    MonthYear::of(employee.joining_date) <= MonthYear::new(month, year)
}

/// The salary in force for `month`/`year`.
pub fn effective_salary_for_month(employee: &Employee, month: u32, year: i32) -> f64 {
    effective_terms_for_month(employee, month, year).salary
}

/// The position held during `month`/`year`.
pub fn effective_position_for_month(employee: &Employee, month: u32, year: i32) -> String {
    effective_terms_for_month(employee, month, year).position
}

/// Salary and position in force for `month`/`year`.
///
/// Without promotions the stored values are returned as they are.
/// Otherwise the stored values are ignored (they already reflect the
/// latest promotion) and the timeline is replayed from the earliest
/// promotion's `from_*` values:
///
/// - a promotion in an earlier month is in effect: take its `to_*`
///   values and keep scanning;
/// - a promotion in the queried month is not yet in effect: take its
///   `from_*` values and stop;
/// - a promotion in a later month: stop.
///
/// Consequently, when several promotions share the queried month only
/// the earliest of them is consulted.
pub fn effective_terms_for_month(employee: &Employee, month: u32, year: i32) -> EffectiveTerms {
    let sorted = sorted_promotions(&employee.promotions);
    let Some(first) = sorted.first() else {
        return EffectiveTerms {
            salary: employee.basic_salary,
            position: employee.position.clone(),
        };
    };

    let target = MonthYear::new(month, year);
    let mut salary = first.from_salary;
    let mut position = first.from_position.as_str();

    for promotion in &sorted {
        let promoted = MonthYear::of(promotion.date);
        if promoted < target {
            salary = promotion.to_salary;
            position = promotion.to_position.as_str();
        } else if promoted == target {
            salary = promotion.from_salary;
            position = promotion.from_position.as_str();
            break;
        } else {
            break;
        }
    }

    EffectiveTerms {
        salary,
        position: position.to_string(),
    }
}

/// Promotions ordered by `date`, oldest first.  The sort is stable, so
/// promotions sharing a date keep their insertion order.
pub fn sorted_promotions(promotions: &[Promotion]) -> Vec<&Promotion> {
    let mut sorted: Vec<&Promotion> = promotions.iter().collect();
    sorted.sort_by_key(|promotion| promotion.date);
    sorted
}

/// The month from which the latest promotion pays out, if any.
pub fn latest_promotion_month(employee: &Employee) -> Option<MonthYear> {
    employee
        .promotions
        .iter()
        .map(|promotion| MonthYear::of(promotion.date))
        .max()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::EmployeeStatus;
    use chrono::NaiveDate;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn employee(basic_salary: f64, joined: NaiveDate) -> Employee {
        Employee {
            id: "rec-1".into(),
            employee_id: "SC-001".into(),
            name: "Asha Tamang".into(),
            address: "Bhaktapur".into(),
            position: "Developer".into(),
            basic_salary,
            currency: "NPR".into(),
            joining_date: joined,
            email: None,
            phone: None,
            status: EmployeeStatus::FullTime,
            contract_sent: true,
            contract_sent_date: None,
            status_change_date: None,
            promotions: Vec::new(),
            version: 0,
            created_at: None,
            updated_at: None,
        }
    }

    pub(crate) fn promotion(on: NaiveDate, from: (&str, f64), to: (&str, f64)) -> Promotion {
        Promotion {
            date: on,
            from_position: from.0.into(),
            to_position: to.0.into(),
            from_salary: from.1,
            to_salary: to.1,
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn no_promotions_returns_basic_salary_for_every_month() {
        let emp = employee(45000.0, date(2023, 4, 10));
        for (month, year) in [(1, 2020), (4, 2023), (12, 2030)] {
            assert_eq!(effective_salary_for_month(&emp, month, year), 45000.0);
            assert_eq!(effective_position_for_month(&emp, month, year), "Developer");
        }
    }

    #[test]
    fn promotion_takes_effect_the_month_after() {
        let mut emp = employee(60000.0, date(2023, 1, 1));
        emp.position = "Senior Developer".into();
        emp.promotions.push(promotion(
            date(2024, 9, 15),
            ("Developer", 50000.0),
            ("Senior Developer", 60000.0),
        ));

        assert_eq!(effective_salary_for_month(&emp, 8, 2024), 50000.0);
        assert_eq!(effective_salary_for_month(&emp, 9, 2024), 50000.0);
        assert_eq!(effective_salary_for_month(&emp, 10, 2024), 60000.0);
        assert_eq!(effective_salary_for_month(&emp, 1, 2023), 50000.0);
        assert_eq!(effective_salary_for_month(&emp, 3, 2026), 60000.0);

        assert_eq!(effective_position_for_month(&emp, 9, 2024), "Developer");
        assert_eq!(effective_position_for_month(&emp, 10, 2024), "Senior Developer");
    }

    #[test]
    fn later_promotions_supersede_earlier_ones() {
        let mut emp = employee(80000.0, date(2022, 1, 1));
        emp.promotions = vec![
            promotion(date(2024, 6, 1), ("Senior", 60000.0), ("Lead", 80000.0)),
            promotion(date(2023, 3, 20), ("Junior", 40000.0), ("Senior", 60000.0)),
        ];

        assert_eq!(effective_salary_for_month(&emp, 2, 2023), 40000.0);
        assert_eq!(effective_salary_for_month(&emp, 3, 2023), 40000.0);
        assert_eq!(effective_salary_for_month(&emp, 4, 2023), 60000.0);
        assert_eq!(effective_salary_for_month(&emp, 6, 2024), 60000.0);
        assert_eq!(effective_salary_for_month(&emp, 7, 2024), 80000.0);
        assert_eq!(effective_position_for_month(&emp, 1, 2024), "Senior");
    }

    #[test]
    fn same_month_promotions_consult_only_the_earliest() {
        let mut emp = employee(70000.0, date(2022, 1, 1));
        emp.promotions = vec![
            promotion(date(2024, 5, 25), ("B", 55000.0), ("C", 70000.0)),
            promotion(date(2024, 5, 3), ("A", 50000.0), ("B", 55000.0)),
        ];

        assert_eq!(effective_salary_for_month(&emp, 5, 2024), 50000.0);
        assert_eq!(effective_position_for_month(&emp, 5, 2024), "A");
        assert_eq!(effective_salary_for_month(&emp, 6, 2024), 70000.0);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = promotion(date(2023, 2, 1), ("L1", 30000.0), ("L2", 35000.0));
        let b = promotion(date(2023, 11, 1), ("L2", 35000.0), ("L3", 42000.0));
        let c = promotion(date(2024, 7, 1), ("L3", 42000.0), ("L4", 50000.0));

        let mut forward = employee(50000.0, date(2022, 6, 1));
        forward.promotions = vec![a.clone(), b.clone(), c.clone()];
        let mut shuffled = forward.clone();
        shuffled.promotions = vec![c, a, b];

        for period in MonthYear::range_inclusive(MonthYear::new(1, 2023), MonthYear::new(12, 2024)) {
            assert_eq!(
                effective_terms_for_month(&forward, period.month, period.year),
                effective_terms_for_month(&shuffled, period.month, period.year),
                "diverged at {period}"
            );
        }
    }

    #[test]
    fn resolution_is_repeatable() {
        let mut emp = employee(60000.0, date(2023, 1, 1));
        emp.promotions.push(promotion(date(2024, 9, 15), ("Dev", 50000.0), ("Senior", 60000.0)));
        let first = effective_terms_for_month(&emp, 9, 2024);
        let second = effective_terms_for_month(&emp, 9, 2024);
        assert_eq!(first, second);
    }

    #[test]
    fn joined_by_month_ignores_day() {
        let emp = employee(1.0, date(2024, 3, 28));
        assert!(!has_joined_by_month(&emp, 2, 2024));
        assert!(!has_joined_by_month(&emp, 12, 2023));
        assert!(has_joined_by_month(&emp, 3, 2024));
        assert!(has_joined_by_month(&emp, 4, 2024));
        assert!(has_joined_by_month(&emp, 1, 2025));
    }

    #[test]
    fn out_of_range_month_does_not_panic() {
        let mut emp = employee(60000.0, date(2023, 1, 1));
        emp.promotions.push(promotion(date(2024, 12, 1), ("Dev", 50000.0), ("Senior", 60000.0)));
        // Month 13 of 2024 sorts after December 2024.
        assert_eq!(effective_salary_for_month(&emp, 13, 2024), 60000.0);
        assert_eq!(effective_salary_for_month(&emp, 0, 2024), 50000.0);
    }

    #[test]
    fn latest_promotion_month_picks_maximum() {
        let mut emp = employee(1.0, date(2020, 1, 1));
        assert_eq!(latest_promotion_month(&emp), None);
        emp.promotions = vec![
            promotion(date(2024, 2, 1), ("a", 1.0), ("b", 2.0)),
            promotion(date(2023, 8, 1), ("x", 0.5), ("a", 1.0)),
        ];
        assert_eq!(latest_promotion_month(&emp), Some(MonthYear::new(2, 2024)));
    }
}
