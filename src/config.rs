//! Runtime configuration.
//!
//! Read once at startup from the process environment (after loading an
//! optional `.env` file) and handed to the router as explicit state.

use crate::error::ConfigError;
use crate::models::CompanyInfo;
use std::env;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_FIRED_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `PAYROLL_BIND_ADDR`
    pub bind_addr: String,
    /// `PAYROLL_ALLOWED_EMAILS`, comma separated.  Stored lower-cased.
    pub allowed_emails: Vec<String>,
    /// `PAYROLL_FIRED_RETENTION_DAYS`: how long a fired employee stays
    /// in standard listings after the status change.
    pub fired_retention_days: i64,
    /// `PAYROLL_COMPANY_NAME`, `_ADDRESS`, `_PAN_NO`, `_EMAIL`, `_PHONE`:
    /// the issuer block of payslips.  Unset parts stay empty.
    pub company: CompanyInfo,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            allowed_emails: Vec::new(),
            fired_retention_days: DEFAULT_FIRED_RETENTION_DAYS,
            company: CompanyInfo::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.  Unset variables take
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("PAYROLL_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let allowed_emails = lookup("PAYROLL_ALLOWED_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_default();
        let fired_retention_days = match lookup("PAYROLL_FIRED_RETENTION_DAYS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days >= 0)
                .ok_or(ConfigError::Invalid {
                    name: "PAYROLL_FIRED_RETENTION_DAYS",
                    value: raw,
                })?,
            None => DEFAULT_FIRED_RETENTION_DAYS,
        };

        let company_field = |suffix: &str| {
            lookup(&format!("PAYROLL_COMPANY_{suffix}"))
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };
        let company = CompanyInfo {
            name: company_field("NAME"),
            address: company_field("ADDRESS"),
            pan_no: company_field("PAN_NO"),
            email: company_field("EMAIL"),
            phone: company_field("PHONE"),
        };

        Ok(Self {
            bind_addr,
            allowed_emails,
            fired_retention_days,
            company,
        })
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}
