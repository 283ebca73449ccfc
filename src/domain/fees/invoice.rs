//! Invoice metadata: invoice numbers, external IDs and due dates.

use crate::domain::calendar::add_days;
use crate::domain::errors::DatabindError;
use chrono::NaiveDate;
use std::collections::HashMap;

pub const ACRONYM_NOT_FOUND: &str = "Acronym Not Found";

/// Invoice-number prefix for a billing entity ID.
pub fn entity_acronym(entity_id: &str) -> Option<&'static str> {
    match entity_id {
        "15" => Some("ADB"),
        "33" => Some("ABS"),
        _ => None,
    }
}

/// Hands out `"{acronym}-{n}"` invoice numbers.
///
/// `n` is assigned the first time an MSAID is seen and reused for every later
/// account of that organization. State lives for one calculator run.
#[derive(Debug, Clone)]
pub struct InvoiceNumberGenerator {
    next: u64,
    assigned: HashMap<String, u64>,
}

impl InvoiceNumberGenerator {
    pub fn new(first: u64) -> Self {
        Self {
            next: first,
            assigned: HashMap::new(),
        }
    }

    pub fn invoice_number(&mut self, entity_id: &str, msa_id: &str) -> String {
        let Some(acronym) = entity_acronym(entity_id) else {
            return ACRONYM_NOT_FOUND.to_string();
        };

        let number = match self.assigned.get(msa_id) {
            Some(&n) => n,
            None => {
                let n = self.next;
                self.assigned.insert(msa_id.to_string(), n);
                self.next += 1;
                n
            }
        };

        format!("{acronym}-{number}")
    }
}

/// Sequential external IDs; the seed goes to the first account of the run.
#[derive(Debug, Clone)]
pub struct ExternalIdCounter {
    current: u64,
    started: bool,
}

impl ExternalIdCounter {
    pub fn new(seed: u64) -> Self {
        Self {
            current: seed,
            started: false,
        }
    }

    pub fn next_id(&mut self) -> u64 {
        if self.started {
            self.current += 1;
        }
        self.started = true;
        self.current
    }
}

/// Invoice date plus the billing-term days. Empty terms mean due on issue.
pub fn due_date(invoice_date: NaiveDate, billing_terms: &str) -> Result<NaiveDate, DatabindError> {
    let terms = billing_terms.trim();
    if terms.is_empty() {
        return Ok(invoice_date);
    }

    let days: u64 = terms.parse().map_err(|_| DatabindError::InvalidBillingTerms {
        terms: billing_terms.to_string(),
    })?;
    Ok(add_days(invoice_date, days))
}
