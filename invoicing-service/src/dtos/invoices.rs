use chrono::{NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::listing::DashboardStats;
use crate::models::{
    Amount, CompanyDetails, CustomerDetails, Invoice, InvoiceStatus, LineItem, PaymentInstructions,
};
use crate::render::format_currency;

/// Invoice as returned over the API, with timestamps as RFC 3339 strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub invoice_number: String,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub reference: String,
    pub customer_details: CustomerDetails,
    pub items: Vec<LineItem>,
    pub total_amount: Amount,
    pub company_details: CompanyDetails,
    pub payment_instructions: PaymentInstructions,
    pub status: InvoiceStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            items: invoice.items().to_vec(),
            total_amount: invoice.total_amount(),
            created_at: invoice.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: invoice.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            id: invoice.id,
            owner_id: invoice.owner_id,
            invoice_number: invoice.invoice_number,
            invoice_date: invoice.invoice_date,
            due_date: invoice.due_date,
            reference: invoice.reference,
            customer_details: invoice.customer_details,
            company_details: invoice.company_details,
            payment_instructions: invoice.payment_instructions,
            status: invoice.status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    /// Message shown once above the list, e.g. after a failed preview.
    pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    /// Serve the PDF for viewing (and printing) in the browser instead of
    /// as a download.
    #[serde(default)]
    pub inline: bool,
}

/// Stats as numbers plus the same figures formatted for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub formatted_total_revenue: String,
    pub formatted_pending_amount: String,
}

impl From<DashboardStats> for DashboardStatsResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            formatted_total_revenue: format_currency(stats.total_revenue),
            formatted_pending_amount: format_currency(stats.pending_amount),
            stats,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: DashboardStatsResponse,
    /// Active status filter, echoed back.
    pub status: String,
    pub invoices: Vec<InvoiceResponse>,
}

#[derive(Debug, Serialize)]
pub struct ExportStatusResponse {
    pub preparing: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAddedResponse {
    pub index: usize,
    pub invoice: InvoiceResponse,
}
