//! Employee roster views.
//!
//! Fired employees drop out of the standard listings once their status
//! change is older than the retention window.  This is a read-time
//! filter: nothing is deleted.

use crate::models::{Employee, EmployeeStatus};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether `employee` belongs in the standard listing at `now`.
pub fn is_visible(employee: &Employee, now: DateTime<Utc>, retention_days: i64) -> bool {
    match (employee.status, employee.status_change_date) {
        (EmployeeStatus::Fired, Some(changed)) => changed >= now - Duration::days(retention_days),
        _ => true,
    }
}

/// The standard listing: everyone except employees fired more than
/// `retention_days` ago.  Order is preserved.
pub fn visible_employees(employees: Vec<Employee>, now: DateTime<Utc>, retention_days: i64) -> Vec<Employee> {
    employees
        .into_iter()
        .filter(|e| is_visible(e, now, retention_days))
        .collect()
}

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Days between midnight (UTC) of the joining date and `now`, with any
/// started day counted as a whole one.
pub fn days_since_joined(joining_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let joined = joining_date.and_time(NaiveTime::default()).and_utc();
    let millis = (now - joined).num_milliseconds().abs();
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_employees: usize,
    pub active_employees: usize,
    pub contracts_pending: usize,
    pub average_days_since_joined: i64,
}

pub fn dashboard_stats(employees: &[Employee], now: DateTime<Utc>) -> DashboardStats {
    let average_days_since_joined = if employees.is_empty() {
        0
    } else {
        let total: i64 = employees
            .iter()
            .map(|e| days_since_joined(e.joining_date, now))
            .sum();
        (total as f64 / employees.len() as f64).round() as i64
    };

    DashboardStats {
        total_employees: employees.len(),
        active_employees: employees.iter().filter(|e| e.status.is_active()).count(),
        contracts_pending: employees.iter().filter(|e| !e.contract_sent).count(),
        average_days_since_joined,
    }
}
