//! Screen pages: the invoice preview and the dashboard, rendered through
//! askama templates under `templates/pages/`.

use askama::Template;

use super::format::{format_currency, format_date};
use super::layout::{Align, DocumentLayout, LayoutNode, NodeKind, NodeRole, TextStyle};
use crate::listing::{InvoiceList, SearchQuery, StatusFilter};
use crate::models::Invoice;

/// One positioned element of the sheet, with its inline CSS already built.
pub enum SheetNode {
    /// href, style, text
    Link(String, String, String),
    /// style, text
    Text(String, String),
    /// style
    Rule(String),
    /// src, alt, style
    Image(String, String, String),
}

pub struct Sheet {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<SheetNode>,
}

fn text_css(style: &TextStyle) -> String {
    let mut css = format!(
        "font-size:{}px;line-height:{}px;color:{};",
        style.size,
        style.line_height(),
        style.color.hex()
    );
    css.push_str(if style.bold {
        "font-weight:700;"
    } else {
        "font-weight:400;"
    });
    if style.italic {
        css.push_str("font-style:italic;");
    }
    if style.underline {
        css.push_str("text-decoration:underline;");
    }
    css
}

fn sheet_node(node: &LayoutNode) -> SheetNode {
    let r = node.rect;
    let pos = format!(
        "left:{}px;top:{}px;width:{}px;height:{}px;",
        r.x, r.y, r.width, r.height
    );

    match &node.kind {
        NodeKind::Text { content, style } => {
            let style = format!("{}{}", pos, text_css(style));
            match (&node.role, &node.href) {
                (Some(NodeRole::PayOnlineLink), Some(href)) => {
                    SheetNode::Link(href.clone(), style, content.clone())
                }
                _ => SheetNode::Text(style, content.clone()),
            }
        }
        NodeKind::Rule { color, dashed } => SheetNode::Rule(format!(
            "left:{}px;top:{}px;width:{}px;height:0;border-top:{}px {} {};",
            r.x,
            r.y,
            r.width,
            r.height,
            if *dashed { "dashed" } else { "solid" },
            color.hex()
        )),
        NodeKind::Image { src, alt, align } => {
            let position = match align {
                Align::Left => "left",
                Align::Center => "center",
                Align::Right => "right",
            };
            SheetNode::Image(
                src.clone(),
                alt.clone(),
                format!("{}object-fit:contain;object-position:{} center;", pos, position),
            )
        }
    }
}

impl Sheet {
    pub fn from_layout(layout: &DocumentLayout) -> Self {
        Self {
            width: layout.width,
            height: layout.height,
            nodes: layout.nodes.iter().map(sheet_node).collect(),
        }
    }
}

/// `mailto:` link that opens a prefilled message to the customer.
pub fn send_mailto(invoice: &Invoice) -> String {
    let company = invoice.company_details.name.trim();
    let subject = if company.is_empty() {
        format!("Invoice {}", invoice.invoice_number)
    } else {
        format!("Invoice {} from {}", invoice.invoice_number, company)
    };
    let body = format!(
        "Hi {},\n\nPlease find attached invoice {}.\n\nTotal Amount: {}\n\nThank you for your business!",
        invoice.customer_details.name,
        invoice.invoice_number,
        format_currency(invoice.total_amount())
    );
    format!(
        "mailto:{}?subject={}&body={}",
        urlencoding::encode(invoice.customer_details.email.trim()),
        urlencoding::encode(&subject),
        urlencoding::encode(&body)
    )
}

/// Full preview page: toolbar (hidden when printing) and the invoice sheet.
#[derive(Template)]
#[template(path = "pages/preview.html")]
pub struct PreviewTemplate {
    pub invoice_id: String,
    pub invoice_number: String,
    pub mailto: String,
    pub sheet: Sheet,
}

impl PreviewTemplate {
    pub fn new(invoice: &Invoice, layout: &DocumentLayout) -> Self {
        Self {
            invoice_id: urlencoding::encode(&invoice.id).into_owned(),
            invoice_number: invoice.invoice_number.clone(),
            mailto: send_mailto(invoice),
            sheet: Sheet::from_layout(layout),
        }
    }
}

pub struct FilterChip {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

pub struct DashboardRow {
    pub id: String,
    pub number: String,
    pub customer: String,
    pub date: String,
    pub due: String,
    pub status: &'static str,
    pub total: String,
}

impl DashboardRow {
    fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            id: urlencoding::encode(&invoice.id).into_owned(),
            number: invoice.invoice_number.clone(),
            customer: invoice.customer_details.name.clone(),
            date: format_date(invoice.invoice_date),
            due: format_date(invoice.due_date),
            status: invoice.status.as_str(),
            total: format_currency(invoice.total_amount()),
        }
    }
}

fn filter_href(filter: StatusFilter, search: &SearchQuery) -> String {
    match search.term() {
        Some(term) => format!(
            "/invoices?status={}&search={}",
            filter.as_str(),
            urlencoding::encode(term)
        ),
        None => format!("/invoices?status={}", filter.as_str()),
    }
}

/// Dashboard: figures over the whole list, filter chips, search box and rows.
#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub notice: Option<String>,
    pub total_revenue: String,
    pub pending_amount: String,
    pub invoice_count: usize,
    pub status: &'static str,
    pub search_term: String,
    pub filters: Vec<FilterChip>,
    pub rows: Vec<DashboardRow>,
}

impl DashboardTemplate {
    pub fn new(
        list: &InvoiceList,
        filter: StatusFilter,
        search: &SearchQuery,
        notice: Option<&str>,
    ) -> Self {
        let stats = list.stats();
        Self {
            notice: notice
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            total_revenue: format_currency(stats.total_revenue),
            pending_amount: format_currency(stats.pending_amount),
            invoice_count: stats.invoice_count,
            status: filter.as_str(),
            search_term: search.term().unwrap_or_default().to_string(),
            filters: StatusFilter::CHOICES
                .into_iter()
                .map(|choice| FilterChip {
                    label: choice.as_str(),
                    href: filter_href(choice, search),
                    active: choice == filter,
                })
                .collect(),
            rows: list
                .filtered(filter)
                .into_iter()
                .map(DashboardRow::from_invoice)
                .collect(),
        }
    }
}
