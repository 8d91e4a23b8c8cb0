//! Payroll Ledger library crate.
//!
//! This crate exposes the salary timeline resolver, the monthly income
//! reconciliation and the API components as reusable modules.  External
//! applications may depend on the `payroll_ledger` crate and call into
//! `timeline::effective_salary_for_month` or
//! `ledger::compute_income_ledger` directly, or embed the API via
//! `api::build_router`.

pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod models;
pub mod period;
pub mod roster;
pub mod store;
pub mod timeline;
