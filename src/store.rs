//! Persistence boundary.
//!
//! The [`Repository`] trait is the only way the rest of the crate reads
//! or writes employees, salary records and income records.  A hosted
//! document database would implement it; [`MemoryStore`] is the
//! in-process implementation used by the server and the tests.
//!
//! Every write to an employee happens under one lock acquisition, so a
//! promotion append cannot lose a concurrent update.  Callers that read
//! an employee earlier can additionally pass the `version` they saw and
//! get [`StoreError::VersionConflict`] instead of overwriting newer data.

use crate::error::StoreError;
use crate::models::{
    Employee, EmployeeStatus, IncomeFilter, IncomeRecord, NewEmployee, NewPromotion, Promotion,
    SalaryRecord,
};
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Storage operations needed by the dashboard.
///
/// Implementations must be thread-safe (`Send + Sync`) because the HTTP
/// layer shares one instance across requests.
pub trait Repository: Send + Sync {
    /// All employees, newest first.  No visibility filtering; see
    /// [`crate::roster::visible_employees`].
    fn list_employees(&self) -> Result<Vec<Employee>, StoreError>;
    fn get_employee(&self, id: &str) -> Result<Employee, StoreError>;
    fn create_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError>;
    /// Append a promotion and move `position`/`basic_salary` to its
    /// target values, atomically.
    fn append_promotion(&self, id: &str, promotion: NewPromotion) -> Result<Employee, StoreError>;
    /// Change status and stamp `status_change_date`.
    fn update_status(&self, id: &str, status: EmployeeStatus) -> Result<Employee, StoreError>;
    /// Set the contract flag; stamps `contract_sent_date` when set.
    fn set_contract_sent(&self, id: &str, sent: bool) -> Result<Employee, StoreError>;

    /// Income records matching `filter`, newest period first.
    fn list_income_records(&self, filter: &IncomeFilter) -> Result<Vec<IncomeRecord>, StoreError>;
    /// Insert a record.  Rejects a second record for the same period.
    fn create_income_record(&self, record: IncomeRecord) -> Result<IncomeRecord, StoreError>;
    fn delete_income_record(&self, id: &str) -> Result<(), StoreError>;

    fn create_salary_record(&self, record: SalaryRecord) -> Result<SalaryRecord, StoreError>;
    fn get_salary_record(&self, id: &str) -> Result<SalaryRecord, StoreError>;
    /// Salary records, newest period first, optionally for one
    /// employee (by external `employee_id`).
    fn list_salary_records(&self, employee_id: Option<&str>) -> Result<Vec<SalaryRecord>, StoreError>;
}

#[derive(Debug, Default)]
struct Collections {
    employees: Vec<Employee>,
    income_records: Vec<IncomeRecord>,
    salary_records: Vec<SalaryRecord>,
}

/// In-memory [`Repository`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with existing documents, e.g. an export of the
    /// hosted database.  Documents without an id get one.
    pub fn with_documents(
        employees: Vec<Employee>,
        income_records: Vec<IncomeRecord>,
        salary_records: Vec<SalaryRecord>,
    ) -> Self {
        let mut collections = Collections {
            employees,
            income_records,
            salary_records,
        };
        for employee in &mut collections.employees {
            if employee.id.is_empty() {
                employee.id = new_id();
            }
        }
        for record in &mut collections.income_records {
            if record.id.is_empty() {
                record.id = new_id();
            }
        }
        for record in &mut collections.salary_records {
            if record.id.is_empty() {
                record.id = new_id();
            }
        }
        Self {
            inner: RwLock::new(collections),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> Result<T, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Collections) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut guard = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        f(&mut guard)
    }

    fn modify_employee(
        &self,
        id: &str,
        f: impl FnOnce(&mut Employee) -> Result<(), StoreError>,
    ) -> Result<Employee, StoreError> {
        self.write(|c| {
            let employee = c
                .employees
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| StoreError::not_found("employee", id))?;
            f(employee)?;
            employee.version += 1;
            employee.updated_at = Some(Utc::now());
            Ok(employee.clone())
        })
    }
}

impl Repository for MemoryStore {
    fn list_employees(&self) -> Result<Vec<Employee>, StoreError> {
        self.read(|c| c.employees.iter().rev().cloned().collect())
    }

    fn get_employee(&self, id: &str) -> Result<Employee, StoreError> {
        self.read(|c| c.employees.iter().find(|e| e.id == id).cloned())?
            .ok_or_else(|| StoreError::not_found("employee", id))
    }

    fn create_employee(&self, new: NewEmployee) -> Result<Employee, StoreError> {
        let now = Utc::now();
        let employee = Employee {
            id: new_id(),
            employee_id: new.employee_id,
            name: new.name,
            address: new.address,
            position: new.position,
            basic_salary: new.basic_salary,
            currency: new.currency,
            joining_date: new.joining_date,
            email: new.email,
            phone: new.phone,
            status: new.status,
            contract_sent: new.contract_sent,
            contract_sent_date: new.contract_sent.then(|| now.date_naive()),
            status_change_date: None,
            promotions: Vec::new(),
            version: 0,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.write(|c| {
            c.employees.push(employee.clone());
            Ok(())
        })?;
        info!(id = %employee.id, employee_id = %employee.employee_id, "employee created");
        Ok(employee)
    }

    fn append_promotion(&self, id: &str, new: NewPromotion) -> Result<Employee, StoreError> {
        let employee = self.modify_employee(id, |employee| {
            if let Some(expected) = new.expected_version {
                if expected != employee.version {
                    return Err(StoreError::VersionConflict {
                        id: employee.id.clone(),
                        expected,
                        actual: employee.version,
                    });
                }
            }
            let promotion = Promotion {
                date: new.date,
                from_position: new.from_position.unwrap_or_else(|| employee.position.clone()),
                to_position: new.to_position,
                from_salary: new.from_salary.unwrap_or(employee.basic_salary),
                to_salary: new.to_salary,
                notes: new.notes,
                created_at: Some(Utc::now()),
            };
            employee.position = promotion.to_position.clone();
            employee.basic_salary = promotion.to_salary;
            employee.promotions.push(promotion);
            Ok(())
        })?;
        info!(
            id,
            position = %employee.position,
            salary = employee.basic_salary,
            "promotion appended"
        );
        Ok(employee)
    }

    fn update_status(&self, id: &str, status: EmployeeStatus) -> Result<Employee, StoreError> {
        let employee = self.modify_employee(id, |employee| {
            employee.status = status;
            employee.status_change_date = Some(Utc::now());
            Ok(())
        })?;
        info!(id, status = ?status, "employee status changed");
        Ok(employee)
    }

    fn set_contract_sent(&self, id: &str, sent: bool) -> Result<Employee, StoreError> {
        self.modify_employee(id, |employee| {
            employee.contract_sent = sent;
            employee.contract_sent_date = sent.then(|| Utc::now().date_naive());
            Ok(())
        })
    }

    fn list_income_records(&self, filter: &IncomeFilter) -> Result<Vec<IncomeRecord>, StoreError> {
        let mut records = self.read(|c| match filter {
            IncomeFilter::All => c.income_records.clone(),
            IncomeFilter::Periods(periods) => {
                let wanted: HashSet<_> = periods.iter().copied().collect();
                c.income_records
                    .iter()
                    .filter(|r| wanted.contains(&r.period()))
                    .cloned()
                    .collect()
            }
        })?;
        records.sort_by_key(|r| Reverse(r.period()));
        Ok(records)
    }

    fn create_income_record(&self, mut record: IncomeRecord) -> Result<IncomeRecord, StoreError> {
        let period = record.period();
        let now = Utc::now();
        record.id = new_id();
        record.created_at = Some(now);
        record.updated_at = Some(now);
        self.write(|c| {
            if c.income_records.iter().any(|r| r.period() == period) {
                return Err(StoreError::DuplicatePeriod(period));
            }
            c.income_records.push(record.clone());
            Ok(())
        })?;
        info!(id = %record.id, %period, profit_loss_npr = ?record.profit_loss_npr, "income record created");
        Ok(record)
    }

    fn delete_income_record(&self, id: &str) -> Result<(), StoreError> {
        self.write(|c| {
            let before = c.income_records.len();
            c.income_records.retain(|r| r.id != id);
            if c.income_records.len() == before {
                return Err(StoreError::not_found("income record", id));
            }
            Ok(())
        })?;
        info!(id, "income record deleted");
        Ok(())
    }

    fn create_salary_record(&self, mut record: SalaryRecord) -> Result<SalaryRecord, StoreError> {
        record.id = new_id();
        record.created_at = Some(Utc::now());
        self.write(|c| {
            c.salary_records.push(record.clone());
            Ok(())
        })?;
        info!(
            id = %record.id,
            employee_id = %record.employee_id,
            period = %record.period(),
            amount = record.amount,
            "salary record created"
        );
        Ok(record)
    }

    fn get_salary_record(&self, id: &str) -> Result<SalaryRecord, StoreError> {
        self.read(|c| c.salary_records.iter().find(|r| r.id == id).cloned())?
            .ok_or_else(|| StoreError::not_found("salary record", id))
    }

    fn list_salary_records(&self, employee_id: Option<&str>) -> Result<Vec<SalaryRecord>, StoreError> {
        let mut records = self.read(|c| {
            c.salary_records
                .iter()
                .filter(|r| employee_id.map_or(true, |wanted| r.employee_id == wanted))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        records.sort_by_key(|r| Reverse(r.period()));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use crate::period::MonthYear;
    use crate::timeline::tests::{date, employee};
    use std::sync::Arc;
    use std::thread;

    fn income(month: u32, year: i32) -> IncomeRecord {
        IncomeRecord::from_ledger(MonthYear::new(month, year), Default::default(), Default::default())
    }

    fn promotion_to(salary: f64) -> NewPromotion {
        NewPromotion {
            date: date(2024, 9, 1),
            to_position: format!("Level {salary}"),
            to_salary: salary,
            from_position: None,
            from_salary: None,
            notes: None,
            expected_version: None,
        }
    }

    #[test]
    fn rejects_duplicate_income_period() {
        let store = MemoryStore::new();
        store.create_income_record(income(9, 2024)).unwrap();
        let err = store.create_income_record(income(9, 2024)).unwrap_err();
        assert_eq!(err, StoreError::DuplicatePeriod(MonthYear::new(9, 2024)));
        store.create_income_record(income(9, 2025)).unwrap();
    }

    #[test]
    fn lists_income_newest_first_and_filters_periods() {
        let store = MemoryStore::new();
        for (m, y) in [(3, 2024), (11, 2023), (1, 2025), (12, 2024)] {
            store.create_income_record(income(m, y)).unwrap();
        }
        let all: Vec<_> = store
            .list_income_records(&IncomeFilter::All)
            .unwrap()
            .iter()
            .map(IncomeRecord::period)
            .collect();
        assert_eq!(
            all,
            vec![
                MonthYear::new(1, 2025),
                MonthYear::new(12, 2024),
                MonthYear::new(3, 2024),
                MonthYear::new(11, 2023),
            ]
        );

        let filter = IncomeFilter::Periods(vec![MonthYear::new(11, 2023), MonthYear::new(12, 2024)]);
        let picked: Vec<_> = store
            .list_income_records(&filter)
            .unwrap()
            .iter()
            .map(IncomeRecord::period)
            .collect();
        assert_eq!(picked, vec![MonthYear::new(12, 2024), MonthYear::new(11, 2023)]);
    }

    #[test]
    fn delete_missing_income_is_not_found() {
        let store = MemoryStore::new();
        let created = store.create_income_record(income(1, 2024)).unwrap();
        store.delete_income_record(&created.id).unwrap();
        assert!(matches!(
            store.delete_income_record(&created.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn promotion_updates_current_terms() {
        let store = MemoryStore::with_documents(vec![employee(50000.0, date(2023, 1, 1))], vec![], vec![]);
        let updated = store.append_promotion("rec-1", promotion_to(60000.0)).unwrap();
        assert_eq!(updated.basic_salary, 60000.0);
        assert_eq!(updated.position, "Level 60000");
        assert_eq!(updated.version, 1);
        let promo = &updated.promotions[0];
        assert_eq!(promo.from_salary, 50000.0);
        assert_eq!(promo.from_position, "Developer");
        assert!(promo.created_at.is_some());
    }

    #[test]
    fn stale_version_is_rejected() {
        let store = MemoryStore::with_documents(vec![employee(50000.0, date(2023, 1, 1))], vec![], vec![]);
        store.append_promotion("rec-1", promotion_to(55000.0)).unwrap();

        let mut stale = promotion_to(70000.0);
        stale.expected_version = Some(0);
        let err = store.append_promotion("rec-1", stale).unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionConflict {
                id: "rec-1".into(),
                expected: 0,
                actual: 1
            }
        );
        assert_eq!(store.get_employee("rec-1").unwrap().basic_salary, 55000.0);
    }

    #[test]
    fn concurrent_appends_keep_every_promotion() {
        let store = Arc::new(MemoryStore::with_documents(
            vec![employee(1000.0, date(2023, 1, 1))],
            vec![],
            vec![],
        ));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .append_promotion("rec-1", promotion_to(2000.0 + i as f64))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let employee = store.get_employee("rec-1").unwrap();
        assert_eq!(employee.promotions.len(), 8);
        assert_eq!(employee.version, 8);
    }

    #[test]
    fn status_change_is_stamped() {
        let store = MemoryStore::with_documents(vec![employee(1.0, date(2023, 1, 1))], vec![], vec![]);
        let updated = store.update_status("rec-1", EmployeeStatus::Fired).unwrap();
        assert_eq!(updated.status, EmployeeStatus::Fired);
        assert!(updated.status_change_date.is_some());
        assert!(store.update_status("missing", EmployeeStatus::Fired).is_err());
    }

    #[test]
    fn salary_records_filter_by_employee() {
        let store = MemoryStore::new();
        for (emp, month) in [("SC-001", 1), ("SC-002", 2), ("SC-001", 3)] {
            store
                .create_salary_record(SalaryRecord {
                    id: String::new(),
                    employee_id: emp.into(),
                    employee_name: emp.into(),
                    month,
                    year: 2024,
                    amount: 1.0,
                    items: Vec::new(),
                    payment_date: date(2024, month, 28),
                    status: PaymentStatus::Paid,
                    created_at: None,
                })
                .unwrap();
        }
        let mine = store.list_salary_records(Some("SC-001")).unwrap();
        let months: Vec<_> = mine.iter().map(|r| r.month).collect();
        assert_eq!(months, vec![3, 1]);
        assert_eq!(store.list_salary_records(None).unwrap().len(), 3);
    }
}
