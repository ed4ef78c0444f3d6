//! Invoice list view: status filter, search forwarding and dashboard figures.

use serde::{Deserialize, Serialize};

use crate::models::{Amount, Invoice, InvoiceStatus};

/// Status filter applied on top of an already fetched (and searched) list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(InvoiceStatus),
}

impl StatusFilter {
    /// Filters in the order they are offered to users.
    pub const CHOICES: [StatusFilter; 5] = [
        StatusFilter::All,
        StatusFilter::Only(InvoiceStatus::Paid),
        StatusFilter::Only(InvoiceStatus::Sent),
        StatusFilter::Only(InvoiceStatus::Overdue),
        StatusFilter::Only(InvoiceStatus::Draft),
    ];

    /// Unknown or missing values mean `All`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("paid") => StatusFilter::Only(InvoiceStatus::Paid),
            Some("sent") => StatusFilter::Only(InvoiceStatus::Sent),
            Some("overdue") => StatusFilter::Only(InvoiceStatus::Overdue),
            Some("draft") => StatusFilter::Only(InvoiceStatus::Draft),
            _ => StatusFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.as_str(),
        }
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => invoice.status == *status,
        }
    }
}

/// Free-text search term. Matching happens in the store; this only
/// normalises what gets forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery(Option<String>);

impl SearchQuery {
    pub fn new(raw: Option<&str>) -> Self {
        Self(
            raw.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        )
    }

    pub fn term(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Figures shown above the list. Always computed over the whole collection
/// the list holds, never over the status-filtered subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: Amount,
    pub pending_amount: Amount,
    pub invoice_count: usize,
}

impl DashboardStats {
    pub fn compute(invoices: &[Invoice]) -> Self {
        Self {
            total_revenue: invoices.iter().map(Invoice::total_amount).sum(),
            pending_amount: invoices
                .iter()
                .filter(|i| i.status != InvoiceStatus::Paid)
                .map(Invoice::total_amount)
                .sum(),
            invoice_count: invoices.len(),
        }
    }
}

/// The fetched collection behind the dashboard.
#[derive(Debug, Clone, Default)]
pub struct InvoiceList {
    invoices: Vec<Invoice>,
}

impl InvoiceList {
    pub fn new(invoices: Vec<Invoice>) -> Self {
        Self { invoices }
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(&self.invoices)
    }

    pub fn filtered(&self, filter: StatusFilter) -> Vec<&Invoice> {
        self.invoices.iter().filter(|i| filter.matches(i)).collect()
    }

    /// Drop a deleted invoice locally instead of refetching.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.invoices.len();
        self.invoices.retain(|i| i.id != id);
        self.invoices.len() != before
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }
}
