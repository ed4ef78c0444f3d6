//! Invoice model for invoicing-service.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{Amount, LineItem, LineItemPatch, User};
use crate::totals::invoice_total;

/// Days between invoice date and the default due date of a new invoice.
pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 14;

/// Most line items one invoice may carry. Past this the single-page export
/// would outgrow what the rasterizer is willing to allocate.
pub const MAX_LINE_ITEMS: usize = 100;

/// Invoice status. Set explicitly by the user; nothing transitions it automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Sent => "Sent",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "sent" => InvoiceStatus::Sent,
            "paid" => InvoiceStatus::Paid,
            "overdue" => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Draft,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerDetails {
    #[validate(custom(function = "not_blank", message = "Customer name is required"))]
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    pub website: String,
}

/// Issuing company block, snapshotted from the owner's profile when the
/// invoice is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyDetails {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub abn: String,
    #[serde(alias = "AmountEnclosed")]
    pub amount_enclosed: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInstructions {
    pub bank_name: String,
    pub account_number: String,
    pub bsb: String,
}

/// The editable body of an invoice, as sent by clients on create and update.
///
/// Identity, ownership and timestamps are never taken from the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceContent {
    pub invoice_number: String,
    #[serde(deserialize_with = "lenient_date")]
    pub invoice_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    pub reference: String,
    #[validate(nested)]
    pub customer_details: CustomerDetails,
    /// At most [`MAX_LINE_ITEMS`].
    #[validate(length(max = 100, message = "An invoice can have at most 100 line items"))]
    pub items: Vec<LineItem>,
    /// Client-computed total. Only compared against the server's total.
    #[serde(skip_serializing)]
    pub total_amount: Option<Amount>,
    pub company_details: CompanyDetails,
    pub payment_instructions: PaymentInstructions,
    pub status: InvoiceStatus,
}

/// Stored invoice document. Timestamps are BSON dates in MongoDB; API
/// responses go through `InvoiceResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub customer_details: CustomerDetails,
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    total_amount: Amount,
    #[serde(default)]
    pub company_details: CompanyDetails,
    #[serde(default)]
    pub payment_instructions: PaymentInstructions,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn new(owner_id: String, content: InvoiceContent) -> Self {
        let now = Utc::now();
        let mut invoice = Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            invoice_number: String::new(),
            invoice_date: None,
            due_date: None,
            reference: String::new(),
            customer_details: CustomerDetails::default(),
            items: Vec::new(),
            total_amount: Amount::ZERO,
            company_details: CompanyDetails::default(),
            payment_instructions: PaymentInstructions::default(),
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        invoice.apply(content);
        if invoice.due_date.is_none() {
            invoice.due_date = invoice
                .invoice_date
                .map(|d| d + Duration::days(DEFAULT_PAYMENT_TERMS_DAYS));
        }
        invoice
    }

    /// Seeded draft for the "new invoice" form: today, today + 14 days, one
    /// blank item, company and payment details copied from the owner's profile.
    pub fn template_for(owner: &User, today: NaiveDate, now_millis: i64) -> InvoiceContent {
        let profile = &owner.company_profile;
        let company_email = if profile.email.trim().is_empty() {
            owner.email.clone()
        } else {
            profile.email.clone()
        };

        InvoiceContent {
            invoice_number: invoice_number_from_millis(now_millis),
            invoice_date: Some(today),
            due_date: Some(today + Duration::days(DEFAULT_PAYMENT_TERMS_DAYS)),
            reference: String::new(),
            customer_details: CustomerDetails::default(),
            items: vec![LineItem::default()],
            total_amount: None,
            company_details: CompanyDetails {
                name: profile.name.clone(),
                address: profile.address.clone(),
                phone: profile.phone.clone(),
                email: company_email,
                website: profile.website.clone(),
                abn: profile.abn.clone(),
                amount_enclosed: String::new(),
            },
            payment_instructions: PaymentInstructions {
                bank_name: profile.bank_name.clone(),
                account_number: profile.account_number.clone(),
                bsb: profile.bsb.clone(),
            },
            status: InvoiceStatus::Draft,
        }
    }

    /// Replace the editable body (last write wins) and recompute derived fields.
    /// A cleared due date stays cleared.
    ///
    /// Returns true when the client's total disagreed with the recomputed one.
    pub fn apply(&mut self, content: InvoiceContent) -> bool {
        self.invoice_number = content.invoice_number;
        self.invoice_date = content.invoice_date;
        self.due_date = content.due_date;
        self.reference = content.reference;
        self.customer_details = content.customer_details;
        self.items = content.items;
        self.company_details = content.company_details;
        self.payment_instructions = content.payment_instructions;
        self.status = content.status;
        self.updated_at = Utc::now();

        let drifted = self.recompute();
        let client_total_mismatch = content
            .total_amount
            .is_some_and(|t| t.round_cents() != self.total_amount.round_cents());
        drifted || client_total_mismatch
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    /// Recompute every line total and the grand total.
    ///
    /// An invoice never has zero items; an empty list gains one blank row.
    /// Returns true when any stored line total had drifted.
    pub fn recompute(&mut self) -> bool {
        if self.items.is_empty() {
            self.items.push(LineItem::default());
        }
        let mut drifted = false;
        for item in &mut self.items {
            drifted |= item.recompute();
        }
        self.total_amount = invoice_total(&self.items);
        drifted
    }

    /// Append a blank row and return its index, or `None` once the invoice
    /// already holds [`MAX_LINE_ITEMS`].
    pub fn add_item(&mut self) -> Option<usize> {
        if self.items.len() >= MAX_LINE_ITEMS {
            return None;
        }
        self.items.push(LineItem::default());
        self.recompute();
        Some(self.items.len() - 1)
    }

    /// Remove the item at `index`. Removing the sole item, or an index that
    /// does not exist, leaves the invoice unchanged and returns false.
    pub fn remove_item(&mut self, index: usize) -> bool {
        if self.items.len() <= 1 || index >= self.items.len() {
            return false;
        }
        self.items.remove(index);
        self.recompute();
        true
    }

    pub fn update_item(&mut self, index: usize, patch: LineItemPatch) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        patch.apply(item);
        self.recompute();
        true
    }

    /// Customer-facing artifact name, e.g. `Invoice-INV-123456.pdf`.
    pub fn file_name(&self) -> String {
        format!("Invoice-{}.pdf", sanitize_file_component(&self.invoice_number))
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// `INV-` followed by the last six digits of a millisecond timestamp.
pub fn invoice_number_from_millis(millis: i64) -> String {
    let digits = millis.unsigned_abs().to_string();
    let tail = &digits[digits.len().saturating_sub(6)..];
    format!("INV-{}", tail)
}

fn sanitize_file_component(input: &str) -> String {
    let cleaned: String = input
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "draft".to_string()
    } else {
        cleaned
    }
}

/// Accepts `YYYY-MM-DD`, a full RFC 3339 timestamp, an empty string or null.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.date_naive());
    }
    trimmed
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(q: &str, p: &str) -> LineItem {
        LineItem::new("row".into(), Amount::parse(q), Amount::parse(p))
    }

    fn invoice_with(items: Vec<LineItem>) -> Invoice {
        Invoice::new(
            "owner-1".into(),
            InvoiceContent {
                invoice_number: "INV-000001".into(),
                items,
                ..Default::default()
            },
        )
    }

    #[test]
    fn totals_follow_every_item_change() {
        let mut invoice = invoice_with(vec![item("2", "10.5"), item("1", "5")]);
        assert_eq!(invoice.items()[0].total(), Amount::parse("21.00"));
        assert_eq!(invoice.items()[1].total(), Amount::parse("5.00"));
        assert_eq!(invoice.total_amount(), Amount::parse("26.00"));

        invoice.update_item(
            0,
            LineItemPatch {
                quantity: Some(Amount::from(3)),
                ..Default::default()
            },
        );
        assert_eq!(invoice.items()[0].total(), Amount::parse("31.50"));
        assert_eq!(invoice.total_amount(), Amount::parse("36.50"));

        let idx = invoice.add_item();
        assert_eq!(idx, Some(2));
        assert_eq!(invoice.total_amount(), Amount::parse("36.50"));

        assert!(invoice.remove_item(0));
        assert_eq!(invoice.total_amount(), Amount::parse("5.00"));
    }

    #[test]
    fn removing_the_sole_item_is_a_no_op() {
        let mut invoice = invoice_with(vec![item("1", "40")]);
        let before = invoice.clone();
        assert!(!invoice.remove_item(0));
        assert_eq!(invoice.items(), before.items());
        assert_eq!(invoice.total_amount(), Amount::from(40));
    }

    #[test]
    fn out_of_range_edits_are_ignored() {
        let mut invoice = invoice_with(vec![item("1", "1"), item("1", "2")]);
        assert!(!invoice.remove_item(7));
        assert!(!invoice.update_item(7, LineItemPatch::default()));
        assert_eq!(invoice.items().len(), 2);
    }

    #[test]
    fn empty_item_list_gains_a_blank_row() {
        let invoice = invoice_with(Vec::new());
        assert_eq!(invoice.items().len(), 1);
        assert_eq!(invoice.total_amount(), Amount::ZERO);
    }

    #[test]
    fn due_date_defaults_to_fourteen_days_after_invoice_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let invoice = Invoice::new(
            "o".into(),
            InvoiceContent {
                invoice_date: Some(date),
                ..Default::default()
            },
        );
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2026, 2, 3));
    }

    #[test]
    fn update_keeps_a_cleared_due_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let mut invoice = Invoice::new(
            "o".into(),
            InvoiceContent {
                invoice_date: Some(date),
                ..Default::default()
            },
        );
        assert!(invoice.due_date.is_some());

        invoice.apply(InvoiceContent {
            invoice_date: Some(date),
            due_date: None,
            ..Default::default()
        });
        assert_eq!(invoice.due_date, None);
    }

    #[test]
    fn content_requires_a_customer_name() {
        let mut content = InvoiceContent::default();
        content.customer_details.name = "   ".into();
        let errors = content.validate().unwrap_err();
        assert!(errors.to_string().contains("Customer name is required"));

        content.customer_details.name = "Globex".into();
        assert!(content.validate().is_ok());
    }

    #[test]
    fn item_count_is_capped() {
        let mut content = InvoiceContent {
            items: vec![item("1", "1"); MAX_LINE_ITEMS + 1],
            ..Default::default()
        };
        content.customer_details.name = "Globex".into();
        assert!(content.validate().is_err());

        content.items.truncate(MAX_LINE_ITEMS);
        assert!(content.validate().is_ok());

        let mut invoice = Invoice::new("o".into(), content);
        assert_eq!(invoice.add_item(), None);
        assert_eq!(invoice.items().len(), MAX_LINE_ITEMS);
    }

    #[test]
    fn timestamps_are_stored_as_bson_dates() {
        let invoice = invoice_with(vec![item("1", "1")]);
        let doc = mongodb::bson::to_document(&invoice).unwrap();
        assert!(matches!(
            doc.get("createdAt"),
            Some(mongodb::bson::Bson::DateTime(_))
        ));
        assert!(matches!(
            doc.get("updatedAt"),
            Some(mongodb::bson::Bson::DateTime(_))
        ));

        let back: Invoice = mongodb::bson::from_document(doc).unwrap();
        assert_eq!(
            back.created_at.timestamp_millis(),
            invoice.created_at.timestamp_millis()
        );
    }

    #[test]
    fn apply_reports_client_total_mismatch() {
        let mut invoice = invoice_with(vec![item("1", "1")]);
        let content = InvoiceContent {
            items: vec![item("2", "10.5")],
            total_amount: Some(Amount::from(5)),
            ..Default::default()
        };
        assert!(invoice.apply(content));
        assert_eq!(invoice.total_amount(), Amount::from(21));
    }

    #[test]
    fn status_round_trips_as_capitalised_name() {
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Overdue).unwrap(),
            "\"Overdue\""
        );
        assert_eq!(InvoiceStatus::from_string("paid"), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::from_string("bogus"), InvoiceStatus::Draft);
    }

    #[test]
    fn dates_accept_form_and_timestamp_shapes() {
        assert_eq!(parse_date("2026-03-01"), NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(
            parse_date("2026-03-01T00:00:00.000Z"),
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn invoice_numbers_use_last_six_digits() {
        assert_eq!(invoice_number_from_millis(1_760_000_123_456), "INV-123456");
        assert_eq!(invoice_number_from_millis(42), "INV-42");
    }

    #[test]
    fn file_name_replaces_path_characters() {
        let mut invoice = invoice_with(vec![item("1", "1")]);
        invoice.invoice_number = "INV/7 a".into();
        assert_eq!(invoice.file_name(), "Invoice-INV_7_a.pdf");
    }
}
