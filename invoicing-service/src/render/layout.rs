//! Invoice → positioned layout tree.
//!
//! The tree is expressed in source pixels on a fixed 896 px wide sheet. Both
//! the HTML painter and the rasterizer consume the same tree, so what the
//! preview shows is exactly what the exported PDF contains.

use serde::{Deserialize, Serialize};

use super::format::{format_currency, format_date, format_quantity};
use crate::models::{Amount, Invoice};

/// Width of the invoice sheet in source pixels.
pub const SOURCE_WIDTH: f32 = 896.0;
/// Minimum sheet height; the payment slip sits at the bottom of it.
pub const MIN_HEIGHT: f32 = 1400.0;

/// Horizontal advance of one glyph as a fraction of the font size. Painters
/// must use a fixed-pitch face with this advance.
pub const GLYPH_ADVANCE: f32 = 0.6;
pub const LINE_HEIGHT: f32 = 1.5;

const PAD_X: f32 = 48.0;
const PAD_TOP: f32 = 48.0;
const PAD_BOTTOM: f32 = 96.0;
const SLIP_BOTTOM_OFFSET: f32 = 40.0;
const CONTENT_RIGHT: f32 = SOURCE_WIDTH - PAD_X;
const COLUMN_GAP: f32 = 48.0;
const COLUMN_WIDTH: f32 = (CONTENT_RIGHT - PAD_X - COLUMN_GAP) / 2.0;
const RIGHT_COLUMN_X: f32 = PAD_X + COLUMN_WIDTH + COLUMN_GAP;

const PAY_ONLINE_TEXT: &str = "View and pay online now";
const NAME_PLACEHOLDER: &str = "Name Here";
const ITEM_PLACEHOLDER: &str = "Item here";
const QUANTITY_PLACEHOLDER: &str = "xxx.x";
const PRICE_PLACEHOLDER: &str = "x,xxx.xx";
const NUMBER_PLACEHOLDER: &str = "INV-00001";

pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);
pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
const SLATE_950: Rgb = Rgb(0x02, 0x06, 0x17);
const SLATE_900: Rgb = Rgb(0x0f, 0x17, 0x2a);
const SLATE_800: Rgb = Rgb(0x1e, 0x29, 0x3b);
const SLATE_700: Rgb = Rgb(0x33, 0x41, 0x55);
const SLATE_600: Rgb = Rgb(0x47, 0x55, 0x69);
const SLATE_500: Rgb = Rgb(0x64, 0x74, 0x8b);
const SLATE_400: Rgb = Rgb(0x94, 0xa3, 0xb8);
const SLATE_200: Rgb = Rgb(0xe2, 0xe8, 0xf0);
const SLATE_50: Rgb = Rgb(0xf8, 0xfa, 0xfc);
const PRIMARY: Rgb = Rgb(0xf2, 0x00, 0x00);

/// Static rendering inputs that are not part of the invoice itself.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Target of the "View and pay online now" affordance.
    pub payment_url: String,
    /// Issuer logo; the company name is drawn instead when absent.
    pub logo_url: Option<String>,
    /// Accepted card marks; drawn as text badges when empty.
    pub card_icons: Vec<CardIcon>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardIcon {
    pub label: String,
    pub src: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Rgb,
}

impl TextStyle {
    const fn new(size: f32, color: Rgb) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
            underline: false,
            color,
        }
    }

    const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    const fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn line_height(&self) -> f32 {
        self.size * LINE_HEIGHT
    }
}

/// Width in source pixels of a single line of text in `style`.
pub fn text_width(text: &str, style: &TextStyle) -> f32 {
    text.chars().count() as f32 * style.size * GLYPH_ADVANCE
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Text { content: String, style: TextStyle },
    Rule { color: Rgb, dashed: bool },
    /// Scaled to fit inside `rect`, keeping aspect ratio, pinned to `align`.
    Image { src: String, alt: String, align: Align },
}

/// Semantic tag so consumers can locate special nodes by role, not position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeRole {
    PayOnlineLink,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub rect: Rect,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<NodeRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLayout {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<LayoutNode>,
}

impl DocumentLayout {
    /// The "View and pay online now" node, whose box becomes the PDF link.
    pub fn pay_online_link(&self) -> Option<&LayoutNode> {
        self.nodes
            .iter()
            .find(|n| n.role == Some(NodeRole::PayOnlineLink))
    }

    /// Distinct image sources in paint order.
    pub fn asset_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for node in &self.nodes {
            if let NodeKind::Image { src, .. } = &node.kind {
                if !sources.contains(src) {
                    sources.push(src.clone());
                }
            }
        }
        sources
    }
}

/// Builds the layout for `invoice`. Pure: the same invoice and options always
/// produce the same tree.
pub fn layout_invoice(invoice: &Invoice, options: &RenderOptions) -> DocumentLayout {
    let mut sheet = Sheet::default();

    let header_bottom = header(&mut sheet, invoice, options);
    let table_bottom = line_items(&mut sheet, invoice, header_bottom + 96.0);
    let totals_bottom = totals(&mut sheet, invoice, table_bottom + 64.0);
    let payment_bottom = payment_details(&mut sheet, invoice, options, totals_bottom + 80.0);

    // The payment block reserves 320 px for the slip plus the sheet's bottom
    // padding; the slip itself is pinned 40 px above the bottom edge.
    let slip_height = slip_height(invoice);
    let height = (payment_bottom + 320.0 + PAD_BOTTOM)
        .max(MIN_HEIGHT)
        .max(payment_bottom + 48.0 + slip_height + SLIP_BOTTOM_OFFSET);
    let slip_bottom = payment_slip(&mut sheet, invoice, height - SLIP_BOTTOM_OFFSET - slip_height);

    DocumentLayout {
        width: SOURCE_WIDTH,
        height: height.max(slip_bottom + SLIP_BOTTOM_OFFSET),
        nodes: sheet.nodes,
    }
}

#[derive(Default)]
struct Sheet {
    nodes: Vec<LayoutNode>,
}

impl Sheet {
    /// Place one line of text; returns its bottom edge.
    fn text(&mut self, x: f32, y: f32, align: Align, content: &str, style: TextStyle) -> f32 {
        let rect = self.text_rect(x, y, align, content, &style);
        self.nodes.push(LayoutNode {
            rect,
            kind: NodeKind::Text {
                content: content.to_string(),
                style,
            },
            role: None,
            href: None,
        });
        rect.bottom()
    }

    /// `x` is the left edge, the centre or the right edge depending on `align`.
    fn text_rect(&self, x: f32, y: f32, align: Align, content: &str, style: &TextStyle) -> Rect {
        let width = text_width(content, style);
        let left = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        Rect::new(left, y, width, style.line_height())
    }

    /// Several lines stacked from `y`, wrapped to `max_width`.
    fn lines(&mut self, x: f32, y: f32, max_width: f32, text: &str, style: TextStyle) -> f32 {
        let mut cursor = y;
        for line in wrap(text, max_width, &style) {
            cursor = self.text(x, cursor, Align::Left, &line, style);
        }
        cursor
    }

    fn rule(&mut self, x: f32, y: f32, width: f32, thickness: f32, color: Rgb, dashed: bool) -> f32 {
        self.nodes.push(LayoutNode {
            rect: Rect::new(x, y, width, thickness),
            kind: NodeKind::Rule { color, dashed },
            role: None,
            href: None,
        });
        y + thickness
    }

    fn image(&mut self, rect: Rect, align: Align, src: &str, alt: &str) -> f32 {
        self.nodes.push(LayoutNode {
            rect,
            kind: NodeKind::Image {
                src: src.to_string(),
                alt: alt.to_string(),
                align,
            },
            role: None,
            href: None,
        });
        rect.bottom()
    }
}

/// Greedy word wrap on the fixed glyph advance. Explicit newlines are kept;
/// words longer than a line are broken.
fn wrap(text: &str, max_width: f32, style: &TextStyle) -> Vec<String> {
    let max_chars = ((max_width / (style.size * GLYPH_ADVANCE)).floor() as usize).max(1);
    let mut out = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > max_chars {
                if !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                }
                let head: String = word.chars().take(max_chars).collect();
                word = word.chars().skip(max_chars).collect();
                out.push(head);
            }
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        if !line.is_empty() {
            out.push(line);
        }
    }
    out
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// Title, customer block, logo, invoice meta and issuer contact block.
fn header(sheet: &mut Sheet, invoice: &Invoice, options: &RenderOptions) -> f32 {
    let title = TextStyle::new(48.0, BLACK);
    let title_bottom = sheet.text(PAD_X, PAD_TOP, Align::Left, "INVOICE", title);

    let customer = &invoice.customer_details;
    let customer_x = PAD_X + 128.0;
    let customer_width = COLUMN_WIDTH - 128.0;
    let mut left = title_bottom + 48.0;
    left = sheet.text(
        customer_x,
        left,
        Align::Left,
        or_placeholder(&customer.name, NAME_PLACEHOLDER),
        TextStyle::new(14.0, SLATE_700).bold(),
    );
    left = sheet.lines(
        customer_x,
        left + 4.0,
        customer_width,
        or_placeholder(&customer.address, "Customer Address Here"),
        TextStyle::new(12.0, SLATE_500),
    );

    // Issuer mark, right-aligned at the top of the right column.
    let company = &invoice.company_details;
    let company_name = or_placeholder(&company.name, "Company Name");
    let mark_bottom = match &options.logo_url {
        Some(src) => sheet.image(
            Rect::new(CONTENT_RIGHT - 192.0, PAD_TOP, 192.0, 64.0),
            Align::Right,
            src,
            company_name,
        ),
        None => {
            let style = TextStyle::new(20.0, SLATE_900).bold();
            sheet.text(CONTENT_RIGHT, PAD_TOP + 16.0, Align::Right, company_name, style);
            PAD_TOP + 64.0
        }
    };

    let contact_x = CONTENT_RIGHT - 200.0;
    let meta_x = contact_x - 48.0 - 120.0;
    let meta_top = mark_bottom + 32.0;

    let label = TextStyle::new(10.0, SLATE_800).bold();
    let value = TextStyle::new(10.0, SLATE_500);
    let meta = [
        (
            "Invoice Date",
            format_date(invoice.invoice_date),
        ),
        (
            "Invoice Number",
            or_placeholder(&invoice.invoice_number, NUMBER_PLACEHOLDER).to_string(),
        ),
        (
            "Reference",
            or_placeholder(&invoice.reference, "Reference").to_string(),
        ),
        ("ABN", or_placeholder(&company.abn, "ABN Here").to_string()),
    ];
    let mut meta_y = meta_top;
    for (i, (caption, text)) in meta.iter().enumerate() {
        if i > 0 {
            meta_y += 16.0;
        }
        meta_y = sheet.text(meta_x, meta_y, Align::Left, caption, label);
        meta_y = sheet.text(meta_x, meta_y, Align::Left, text, value);
    }

    let contact = TextStyle::new(11.0, SLATE_600);
    let mut contact_y = sheet.text(
        contact_x,
        meta_top,
        Align::Left,
        company_name,
        TextStyle::new(11.0, SLATE_900).bold(),
    );
    contact_y = sheet.lines(
        contact_x,
        contact_y,
        200.0,
        or_placeholder(&company.address, "Company Address Here"),
        contact,
    );
    for line in [
        or_placeholder(&company.phone, "Phone Here"),
        or_placeholder(&company.email, "e-mail here"),
        or_placeholder(&company.website, "Website Here"),
    ] {
        contact_y = sheet.lines(contact_x, contact_y, 200.0, line, contact);
    }

    left.max(meta_y).max(contact_y)
}

const DESCRIPTION_WIDTH: f32 = 400.0;
const QUANTITY_CENTER: f32 = PAD_X + DESCRIPTION_WIDTH + 60.0;
const UNIT_PRICE_RIGHT: f32 = PAD_X + DESCRIPTION_WIDTH + 260.0;

fn line_items(sheet: &mut Sheet, invoice: &Invoice, top: f32) -> f32 {
    let head = TextStyle::new(12.0, SLATE_900).bold();
    let y = top + 8.0;
    sheet.text(PAD_X, y, Align::Left, "DESCRIPTION", head);
    sheet.text(QUANTITY_CENTER, y, Align::Center, "QUANTITY", head);
    sheet.text(UNIT_PRICE_RIGHT, y, Align::Right, "UNIT PRICE", head);
    let head_bottom = sheet.text(CONTENT_RIGHT, y, Align::Right, "AMOUNT USD", head);
    let mut cursor = sheet.rule(PAD_X, head_bottom + 8.0, CONTENT_RIGHT - PAD_X, 1.0, BLACK, false);

    let cell = TextStyle::new(11.0, SLATE_700);
    let amount = TextStyle::new(11.0, SLATE_900).bold();
    let count = invoice.items().len();

    for (index, item) in invoice.items().iter().enumerate() {
        let row_top = cursor + 16.0;
        let description_bottom = sheet.lines(
            PAD_X,
            row_top,
            DESCRIPTION_WIDTH - 16.0,
            or_placeholder(&item.description, ITEM_PLACEHOLDER),
            cell,
        );
        let quantity = if item.quantity.is_zero() {
            QUANTITY_PLACEHOLDER.to_string()
        } else {
            format_quantity(item.quantity)
        };
        let price = if item.unit_price.is_zero() {
            PRICE_PLACEHOLDER.to_string()
        } else {
            format_currency(item.unit_price)
        };
        sheet.text(QUANTITY_CENTER, row_top, Align::Center, &quantity, cell);
        sheet.text(UNIT_PRICE_RIGHT, row_top, Align::Right, &price, cell);
        sheet.text(
            CONTENT_RIGHT,
            row_top,
            Align::Right,
            &format_currency(item.total()),
            amount,
        );

        cursor = description_bottom + 16.0;
        if index + 1 < count {
            cursor = sheet.rule(PAD_X, cursor, CONTENT_RIGHT - PAD_X, 1.0, SLATE_50, false);
        }
    }
    cursor
}

fn totals(sheet: &mut Sheet, invoice: &Invoice, top: f32) -> f32 {
    let rule_bottom = sheet.rule(PAD_X, top, CONTENT_RIGHT - PAD_X, 1.0, SLATE_700, false);
    let y = rule_bottom + 8.0;
    let right = CONTENT_RIGHT - 8.0;
    sheet.text(
        right - 256.0,
        y + 2.0,
        Align::Left,
        "TOTAL USD",
        TextStyle::new(12.0, SLATE_900).bold(),
    );
    let bottom = sheet.text(
        right,
        y,
        Align::Right,
        &format_currency(invoice.total_amount()),
        TextStyle::new(14.0, SLATE_950).bold(),
    );
    bottom + 8.0
}

fn payment_details(sheet: &mut Sheet, invoice: &Invoice, options: &RenderOptions, top: f32) -> f32 {
    let body = TextStyle::new(11.0, SLATE_600);
    let strong = TextStyle::new(11.0, SLATE_900).bold();
    let company = &invoice.company_details;
    let bank = &invoice.payment_instructions;

    let mut y = sheet.text(
        PAD_X,
        top,
        Align::Left,
        &format!("Due Date: {}", format_date(invoice.due_date)),
        strong,
    );
    y = sheet.text(
        PAD_X,
        y + 8.0,
        Align::Left,
        "We accept payment by bank transfer or card.",
        body,
    );
    y = sheet.text(PAD_X, y + 16.0, Align::Left, "Bank Details:", strong);
    for line in [
        format!("Bank name: {}", or_placeholder(&bank.bank_name, "Here")),
        format!("Account name: {}", or_placeholder(&company.name, NAME_PLACEHOLDER)),
        format!("Account Number: {}", or_placeholder(&bank.account_number, "Here")),
        format!("BSB: {}", or_placeholder(&bank.bsb, "Here")),
    ] {
        y = sheet.lines(PAD_X, y, COLUMN_WIDTH, &line, body);
    }
    y = sheet.text(
        PAD_X,
        y + 16.0,
        Align::Left,
        "Please quote your invoice number as reference.",
        TextStyle::new(11.0, SLATE_500).italic(),
    );

    // Card marks.
    let marks_top = y + 24.0;
    let mut x = PAD_X;
    let mut marks_bottom = marks_top;
    if options.card_icons.is_empty() {
        let badge = TextStyle::new(10.0, SLATE_900).bold();
        for label in ["VISA", "MASTERCARD", "AMEX"] {
            let bottom = sheet.text(x, marks_top + 4.0, Align::Left, label, badge);
            x += text_width(label, &badge) + 16.0;
            marks_bottom = marks_bottom.max(bottom + 4.0);
        }
    } else {
        for icon in &options.card_icons {
            let bottom = sheet.image(
                Rect::new(x, marks_top, 40.0, 24.0),
                Align::Left,
                &icon.src,
                &icon.label,
            );
            x += 40.0 + 16.0;
            marks_bottom = marks_bottom.max(bottom);
        }
    }

    let link_style = TextStyle::new(11.0, PRIMARY).bold().underline();
    let link_top = marks_bottom + 24.0;
    let rect = sheet.text_rect(PAD_X, link_top, Align::Left, PAY_ONLINE_TEXT, &link_style);
    sheet.nodes.push(LayoutNode {
        rect,
        kind: NodeKind::Text {
            content: PAY_ONLINE_TEXT.to_string(),
            style: link_style,
        },
        role: Some(NodeRole::PayOnlineLink),
        href: Some(options.payment_url.clone()),
    });
    rect.bottom()
}

struct SlipRow {
    caption: &'static str,
    value: String,
}

fn slip_rows(invoice: &Invoice) -> [SlipRow; 4] {
    [
        SlipRow {
            caption: "CUSTOMER",
            value: or_placeholder(&invoice.customer_details.name, NAME_PLACEHOLDER).to_string(),
        },
        SlipRow {
            caption: "INVOICE NUMBER",
            value: or_placeholder(&invoice.invoice_number, NUMBER_PLACEHOLDER).to_string(),
        },
        SlipRow {
            caption: "AMOUNT",
            value: format_currency(invoice.total_amount()),
        },
        SlipRow {
            caption: "DUE DATE",
            value: format_date(invoice.due_date),
        },
    ]
}

const SLIP_TITLE: TextStyle = TextStyle::new(36.0, SLATE_800);
const SLIP_ROW_HEIGHT: f32 = 6.0 + 18.0 + 6.0 + 1.0;

fn slip_customer_lines(invoice: &Invoice) -> Vec<String> {
    let c = &invoice.customer_details;
    let style = TextStyle::new(11.0, SLATE_600);
    let mut lines = wrap(
        or_placeholder(&c.address, "Customer Address Here"),
        COLUMN_WIDTH - 72.0,
        &style,
    );
    lines.push(or_placeholder(&c.phone, "Phone Here").to_string());
    for extra in [&c.email, &c.website] {
        if !extra.trim().is_empty() {
            lines.push(extra.clone());
        }
    }
    lines
}

fn slip_height(invoice: &Invoice) -> f32 {
    let heading = 2.0 + 16.0 + SLIP_TITLE.line_height() + 48.0;
    let left = 16.5 + 4.0 + slip_customer_lines(invoice).len() as f32 * 16.5;
    let right = 4.0 * SLIP_ROW_HEIGHT + 24.0 + 1.0 + 24.0 + 24.0 + 8.0 + 15.0;
    heading + left.max(right)
}

/// Detachable payment advice under a dashed cut line. Returns its bottom edge.
fn payment_slip(sheet: &mut Sheet, invoice: &Invoice, top: f32) -> f32 {
    let width = CONTENT_RIGHT - PAD_X;
    let mut y = sheet.rule(PAD_X, top, width, 2.0, SLATE_900, true);
    y = sheet.text(PAD_X, y + 16.0, Align::Left, "PAYMENT ADVICE", SLIP_TITLE);
    let grid_top = y + 48.0;

    // Left: addressee.
    let body = TextStyle::new(11.0, SLATE_600);
    sheet.text(
        PAD_X,
        grid_top + 4.0,
        Align::Left,
        "To:",
        TextStyle::new(11.0, SLATE_900).bold(),
    );
    let to_x = PAD_X + 72.0;
    let mut left = sheet.text(
        to_x,
        grid_top,
        Align::Left,
        or_placeholder(&invoice.customer_details.name, NAME_PLACEHOLDER),
        TextStyle::new(11.0, SLATE_950).bold(),
    ) + 4.0;
    for line in slip_customer_lines(invoice) {
        left = sheet.text(to_x, left, Align::Left, &line, body);
    }

    // Right: remittance summary.
    let caption = TextStyle::new(9.0, SLATE_500).bold();
    let value = TextStyle::new(12.0, SLATE_900).bold();
    let mut right = grid_top;
    for row in slip_rows(invoice) {
        let text_top = right + 6.0;
        sheet.text(RIGHT_COLUMN_X, text_top + 3.0, Align::Left, row.caption, caption);
        let value_bottom = sheet.text(CONTENT_RIGHT, text_top, Align::Right, &row.value, value);
        right = sheet.rule(
            RIGHT_COLUMN_X,
            value_bottom + 6.0,
            COLUMN_WIDTH,
            1.0,
            SLATE_200,
            false,
        );
    }

    right = sheet.rule(RIGHT_COLUMN_X, right + 24.0, COLUMN_WIDTH, 1.0, SLATE_900, false) + 24.0;
    sheet.text(
        RIGHT_COLUMN_X + 4.0,
        right + 9.0,
        Align::Left,
        "AMOUNT ENCLOSED",
        TextStyle::new(10.0, SLATE_900).bold(),
    );
    let field_x = CONTENT_RIGHT - 4.0 - 192.0;
    let enclosed = invoice.company_details.amount_enclosed.trim();
    if !enclosed.is_empty() {
        sheet.text(
            field_x,
            right + 3.0,
            Align::Left,
            &format_currency(Amount::parse(enclosed)),
            TextStyle::new(12.0, SLATE_900),
        );
    }
    right = sheet.rule(field_x, right + 22.0, 192.0, 2.0, SLATE_900, false) + 8.0;
    right = sheet.text(
        CONTENT_RIGHT,
        right,
        Align::Right,
        "Enter the amount you are paying above",
        TextStyle::new(10.0, SLATE_400).italic(),
    );

    left.max(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceContent, LineItem};

    fn sample(items: usize) -> Invoice {
        let mut content = InvoiceContent {
            invoice_number: "INV-123456".into(),
            invoice_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 6),
            ..Default::default()
        };
        content.customer_details.name = "Acme Pty Ltd".into();
        content.customer_details.address = "1 Long Road\nNewcastle NSW".into();
        content.company_details.name = "Issuer Co".into();
        content.items = (0..items)
            .map(|i| LineItem::new(format!("Line {}", i), Amount::from(2), Amount::parse("10.5")))
            .collect();
        Invoice::new("owner".into(), content)
    }

    fn options() -> RenderOptions {
        RenderOptions {
            payment_url: "https://pay.example.com/".into(),
            logo_url: Some("https://cdn.example.com/logo.png".into()),
            card_icons: vec![CardIcon {
                label: "Visa".into(),
                src: "https://cdn.example.com/visa.png".into(),
            }],
        }
    }

    fn texts(layout: &DocumentLayout) -> Vec<&str> {
        layout
            .nodes
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn layout_is_deterministic() {
        let invoice = sample(2);
        assert_eq!(
            layout_invoice(&invoice, &options()),
            layout_invoice(&invoice, &options())
        );
    }

    #[test]
    fn short_invoices_fill_the_minimum_sheet() {
        let layout = layout_invoice(&sample(1), &options());
        assert_eq!(layout.width, SOURCE_WIDTH);
        assert_eq!(layout.height, MIN_HEIGHT);
        assert!(layout.nodes.iter().all(|n| n.rect.bottom() <= layout.height));
    }

    #[test]
    fn long_invoices_grow_the_sheet() {
        let layout = layout_invoice(&sample(40), &options());
        assert!(layout.height > MIN_HEIGHT);
        assert!(layout.nodes.iter().all(|n| n.rect.bottom() <= layout.height));
    }

    #[test]
    fn sections_appear_in_order() {
        let layout = layout_invoice(&sample(1), &options());
        let y_of = |needle: &str| {
            layout
                .nodes
                .iter()
                .find(|n| matches!(&n.kind, NodeKind::Text { content, .. } if content == needle))
                .map(|n| n.rect.y)
                .unwrap()
        };
        assert!(y_of("INVOICE") < y_of("DESCRIPTION"));
        assert!(y_of("DESCRIPTION") < y_of("TOTAL USD"));
        assert!(y_of("TOTAL USD") < y_of("Bank Details:"));
        assert!(y_of("Bank Details:") < y_of(PAY_ONLINE_TEXT));
        assert!(y_of(PAY_ONLINE_TEXT) < y_of("PAYMENT ADVICE"));
    }

    #[test]
    fn affordance_is_tagged_with_its_target() {
        let layout = layout_invoice(&sample(1), &options());
        let link = layout.pay_online_link().unwrap();
        assert_eq!(link.href.as_deref(), Some("https://pay.example.com/"));
        assert_eq!(
            link.rect.width,
            text_width(PAY_ONLINE_TEXT, &TextStyle::new(11.0, PRIMARY))
        );
    }

    #[test]
    fn placeholders_stand_in_for_missing_values() {
        let invoice = Invoice::new("owner".into(), InvoiceContent::default());
        let layout = layout_invoice(&invoice, &RenderOptions::default());
        let all = texts(&layout);
        for expected in [NAME_PLACEHOLDER, ITEM_PLACEHOLDER, PRICE_PLACEHOLDER, NUMBER_PLACEHOLDER] {
            assert!(all.contains(&expected), "missing {}", expected);
        }
        // Amount column is always the formatted line total.
        assert!(all.contains(&"0.00"));
    }

    #[test]
    fn zero_quantity_line_is_kept() {
        let mut content = InvoiceContent::default();
        content.items = vec![LineItem::new("Free".into(), Amount::ZERO, Amount::from(5))];
        let invoice = Invoice::new("owner".into(), content);
        let doc = layout_invoice(&invoice, &RenderOptions::default());
        let all = texts(&doc);
        assert!(all.contains(&"Free"));
        assert!(all.contains(&QUANTITY_PLACEHOLDER));
        assert!(all.contains(&"0.00"));
    }

    #[test]
    fn assets_are_listed_once() {
        let mut opts = options();
        opts.card_icons.push(opts.card_icons[0].clone());
        let layout = layout_invoice(&sample(1), &opts);
        assert_eq!(
            layout.asset_sources(),
            vec![
                "https://cdn.example.com/logo.png".to_string(),
                "https://cdn.example.com/visa.png".to_string()
            ]
        );
    }

    #[test]
    fn wrap_breaks_on_words_and_newlines() {
        let style = TextStyle::new(10.0, BLACK);
        // 6 px per glyph, 60 px → 10 glyphs per line
        let lines = wrap("alpha beta gamma\ndelta", 60.0, &style);
        assert_eq!(lines, vec!["alpha beta", "gamma", "delta"]);
        let long = wrap("abcdefghijklmnop", 60.0, &style);
        assert_eq!(long, vec!["abcdefghij", "klmnop"]);
    }
}
