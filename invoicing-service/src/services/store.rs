//! Persistence seams. Every invoice query is scoped to its owner.

use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{CompanyProfile, Invoice, User};

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Newest first. `search` is a case-insensitive substring over the invoice
    /// number, customer name and reference.
    async fn list(&self, owner_id: &str, search: Option<&str>) -> Result<Vec<Invoice>, AppError>;
    async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Invoice>, AppError>;
    async fn insert(&self, invoice: &Invoice) -> Result<(), AppError>;
    /// Replace a stored invoice. Returns false when the owner has no such invoice.
    async fn update(&self, invoice: &Invoice) -> Result<bool, AppError>;
    async fn delete(&self, owner_id: &str, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AppError::Conflict` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn update_profile(
        &self,
        id: &str,
        profile: &CompanyProfile,
    ) -> Result<Option<User>, AppError>;
}

/// Treat user search input as a literal inside a regex.
pub fn escape_regex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(
            c,
            '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Substring match used by the in-memory store, mirroring the regex query.
pub fn matches_search(invoice: &Invoice, term: &str) -> bool {
    let needle = term.to_lowercase();
    [
        invoice.invoice_number.as_str(),
        invoice.customer_details.name.as_str(),
        invoice.reference.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceContent;

    #[test]
    fn escapes_regex_metacharacters() {
        assert_eq!(escape_regex("INV-1.0 (a)"), r"INV-1\.0 \(a\)");
        assert_eq!(escape_regex("plain"), "plain");
    }

    #[test]
    fn search_covers_number_customer_and_reference() {
        let mut content = InvoiceContent {
            invoice_number: "INV-123".into(),
            reference: "PO-77".into(),
            ..Default::default()
        };
        content.customer_details.name = "Acme Pty".into();
        let invoice = Invoice::new("o".into(), content);

        assert!(matches_search(&invoice, "inv-12"));
        assert!(matches_search(&invoice, "ACME"));
        assert!(matches_search(&invoice, "po-7"));
        assert!(!matches_search(&invoice, "globex"));
    }
}
