//! Domain models for invoicing-service.

mod amount;
mod invoice;
mod line_item;
mod user;

pub use amount::Amount;
pub use invoice::{
    invoice_number_from_millis, CompanyDetails, CustomerDetails, Invoice, InvoiceContent,
    InvoiceStatus, PaymentInstructions, DEFAULT_PAYMENT_TERMS_DAYS, MAX_LINE_ITEMS,
};
pub use line_item::{LineItem, LineItemPatch};
pub use user::{normalize_email, CompanyProfile, SanitizedUser, User};
