//! Invoice sheet layout
//!
//! Lays the invoice out top to bottom in CSS pixels on a fixed-width card.
//! The sheet grows with its content, so long invoices span several pages
//! once captured.

use crate::format::{format_currency, format_date, format_quantity};
use crate::model::{Client, Invoice, SenderDetails};
use crate::wrap::wrap_text;
use capture_engine::{Color, FontSpec, ImageFit, Rect, RuleStyle, Scene, TextMeasure};

/// Capture target id of the invoice sheet
pub const INVOICE_TARGET_ID: &str = "invoice-pdf-content";

/// Card width in CSS pixels
pub const SHEET_WIDTH: f32 = 896.0;
const PADDING: f32 = 40.0;
const CONTENT_WIDTH: f32 = SHEET_WIDTH - 2.0 * PADDING;
const FONT_FAMILY: &str = "Verdana";

const PRIMARY_DARK: Color = Color::rgb(30, 64, 175);
const GRAY_100: Color = Color::rgb(243, 244, 246);
const GRAY_300: Color = Color::rgb(209, 213, 219);
const GRAY_400: Color = Color::rgb(156, 163, 175);
const GRAY_500: Color = Color::rgb(107, 114, 128);
const GRAY_600: Color = Color::rgb(75, 85, 99);
const GRAY_700: Color = Color::rgb(55, 65, 81);

/// Line-item table columns: header, share of the table width, alignment
const COLUMNS: [(&str, f32, Align); 6] = [
    ("ÍTEM", 0.05, Align::Center),
    ("DESCRIPCIÓN", 0.45, Align::Left),
    ("CANTIDAD", 0.10, Align::Right),
    ("UNIDAD", 0.10, Align::Center),
    ("VR. UNITARIO", 0.15, Align::Right),
    ("VR. TOTAL", 0.15, Align::Right),
];
const CELL_PADDING_X: f32 = 4.0;
const CELL_PADDING_Y: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
    Right,
}

/// Text style: font plus line height
#[derive(Debug, Clone)]
struct Style {
    font: FontSpec,
    line_height: f32,
    color: Color,
}

impl Style {
    fn new(size: f32, line_height: f32, color: Color) -> Self {
        Self {
            font: FontSpec::new(FONT_FAMILY, size),
            line_height,
            color,
        }
    }

    fn bold(mut self) -> Self {
        self.font = self.font.bold();
        self
    }

    /// Baseline for a line box starting at `top`
    fn baseline(&self, top: f32) -> f32 {
        top + (self.line_height - self.font.size) / 2.0 + self.font.size * 0.8
    }
}

fn text_sm(color: Color) -> Style {
    Style::new(14.0, 20.0, color)
}

fn text_xs(color: Color) -> Style {
    Style::new(12.0, 16.0, color)
}

/// Everything the sheet shows
pub struct InvoiceSheet<'a> {
    pub invoice: &'a Invoice,
    /// Client to print; falls back to the invoice's embedded client
    pub client: Option<&'a Client>,
    pub sender: &'a SenderDetails,
}

impl<'a> InvoiceSheet<'a> {
    pub fn new(invoice: &'a Invoice, client: Option<&'a Client>, sender: &'a SenderDetails) -> Self {
        Self {
            invoice,
            client,
            sender,
        }
    }

    fn display_client(&self) -> Option<&'a Client> {
        self.client.or(self.invoice.client.as_ref())
    }

    /// Lay the sheet out into a scene
    pub fn render(&self, measure: &dyn TextMeasure) -> Scene {
        let mut sheet = SheetBuilder::new(measure);
        sheet.header(self.invoice, self.sender);
        if let Some(client) = self.display_client() {
            sheet.client_block(client);
        }
        sheet.line_items(self.invoice);
        sheet.total(self.invoice.total());
        sheet.notes(self.invoice.notes.as_deref());
        sheet.signature(self.sender);
        sheet.footer(self.sender);
        let scene = sheet.finish();

        let summary = scene.summary();
        tracing::debug!(
            invoice = %self.invoice.invoice_number,
            height = scene.height,
            texts = summary.texts,
            images = summary.images,
            "laid out invoice sheet"
        );
        scene
    }
}

/// Cursor-based vertical layout
struct SheetBuilder<'m> {
    scene: Scene,
    y: f32,
    measure: &'m dyn TextMeasure,
}

impl<'m> SheetBuilder<'m> {
    fn new(measure: &'m dyn TextMeasure) -> Self {
        Self {
            scene: Scene::new(SHEET_WIDTH, 0.0).with_background(Color::WHITE),
            y: PADDING,
            measure,
        }
    }

    fn finish(mut self) -> Scene {
        self.scene.height = (self.y + PADDING).ceil();
        self.scene
    }

    /// One line of text aligned inside `[x, x + width]`
    fn line(&mut self, x: f32, width: f32, top: f32, text: &str, style: &Style, align: Align) {
        if text.is_empty() {
            return;
        }
        let text_width = self.measure.measure(text, &style.font);
        let start = match align {
            Align::Left => x,
            Align::Center => x + (width - text_width) / 2.0,
            Align::Right => x + width - text_width,
        };
        self.scene
            .text(start, style.baseline(top), text, style.font.clone(), style.color);
    }

    /// Wrapped text block; returns its height
    fn paragraph(&mut self, x: f32, width: f32, top: f32, text: &str, style: &Style, align: Align) -> f32 {
        let lines = wrap_text(text, &style.font, width, self.measure);
        for (i, line) in lines.iter().enumerate() {
            self.line(x, width, top + i as f32 * style.line_height, line, style, align);
        }
        lines.len() as f32 * style.line_height
    }

    /// Wrapped text block at the cursor; advances past it
    fn flow(&mut self, x: f32, width: f32, text: &str, style: &Style, align: Align) {
        let height = self.paragraph(x, width, self.y, text, style, align);
        self.y += height;
    }

    /// Bold label followed by a regular value on one line, right-aligned
    fn labelled_right(&mut self, right: f32, top: f32, label: &str, value: &str, style: &Style) {
        let bold = style.clone().bold();
        let label_width = self.measure.measure(label, &bold.font);
        let value_width = self.measure.measure(value, &style.font);
        let start = right - label_width - value_width;
        self.scene
            .text(start, bold.baseline(top), label, bold.font.clone(), bold.color);
        self.scene.text(
            start + label_width,
            style.baseline(top),
            value,
            style.font.clone(),
            style.color,
        );
    }

    fn divider(&mut self) {
        self.y += 16.0;
        self.scene.rule(PADDING, self.y, CONTENT_WIDTH, 1.0, GRAY_300, RuleStyle::Solid);
        self.y += 1.0 + 32.0;
    }

    fn header(&mut self, invoice: &Invoice, sender: &SenderDetails) {
        let gap = 16.0;
        let column = (CONTENT_WIDTH - 2.0 * gap) / 3.0;
        let top = self.y;

        let mut left_height: f32 = 0.0;
        if let Some(logo) = sender.logo_url.as_deref().filter(|url| !url.trim().is_empty()) {
            let logo_height = 128.0;
            self.scene.image(
                logo,
                Rect::new(PADDING, top, 2.0 * column + gap, logo_height),
                ImageFit::Contain,
            );
            left_height = logo_height + 8.0;
        }

        let right = PADDING + CONTENT_WIDTH;
        let right_x = right - column;
        let mut y = top;
        let title = Style::new(20.0, 28.0, PRIMARY_DARK).bold();
        y += self.paragraph(right_x, column, y, "CUENTA DE COBRO", &title, Align::Right);
        let number = Style::new(24.0, 32.0, GRAY_700).bold();
        y += self.paragraph(right_x, column, y, &invoice.invoice_number, &number, Align::Right);
        y += 8.0;
        let date = text_sm(GRAY_600);
        self.labelled_right(right, y, "Fecha: ", &format_date(&invoice.date), &date);
        y += date.line_height;

        self.y = top + left_height.max(y - top);
        self.divider();
    }

    fn client_block(&mut self, client: &Client) {
        let width = (CONTENT_WIDTH - 16.0) / 2.0;
        let x = PADDING;

        let heading = text_xs(GRAY_500).bold();
        self.flow(x, width, "CLIENTE:", &heading, Align::Left);
        self.y += 4.0;

        let name = text_sm(GRAY_700).bold();
        self.flow(x, width, &client.name, &name, Align::Left);

        let body = text_sm(GRAY_600);
        for (label, value) in [
            ("NIT/CC: ", &client.nit_or_cc),
            ("Dirección: ", &client.address),
            ("Teléfono: ", &client.phone),
            ("Ciudad: ", &client.city),
        ] {
            let line = format!("{}{}", label, value);
            self.flow(x, width, &line, &body, Align::Left);
        }
        self.divider();
    }

    /// Column x positions and widths
    fn columns() -> [(f32, f32); 6] {
        let mut out = [(0.0, 0.0); 6];
        let mut x = PADDING;
        for (slot, (_, share, _)) in out.iter_mut().zip(COLUMNS.iter()) {
            let width = CONTENT_WIDTH * share;
            *slot = (x, width);
            x += width;
        }
        out
    }

    fn line_items(&mut self, invoice: &Invoice) {
        let columns = Self::columns();

        // Header row
        let head = text_xs(GRAY_600).bold();
        let row_top = self.y;
        let mut row_height: f32 = 0.0;
        for ((title, _, align), (x, width)) in COLUMNS.iter().zip(columns) {
            let h = self.paragraph(
                x + CELL_PADDING_X,
                width - 2.0 * CELL_PADDING_X,
                row_top + CELL_PADDING_Y,
                title,
                &head,
                *align,
            );
            row_height = row_height.max(h);
        }
        self.y = row_top + row_height + 2.0 * CELL_PADDING_Y;
        self.scene.rule(PADDING, self.y, CONTENT_WIDTH, 2.0, GRAY_700, RuleStyle::Solid);
        self.y += 2.0;

        let body = text_sm(Color::BLACK);
        let count = invoice.line_items.len();
        for (index, item) in invoice.line_items.iter().enumerate() {
            let cells = [
                (index + 1).to_string(),
                item.description.clone(),
                format_quantity(item.quantity),
                item.unit.clone(),
                format_currency(item.unit_price),
                format_currency(item.amount()),
            ];
            let row_top = self.y;
            let mut row_height: f32 = body.line_height;
            for ((text, (_, _, align)), (x, width)) in cells.iter().zip(COLUMNS.iter()).zip(columns) {
                let h = self.paragraph(
                    x + CELL_PADDING_X,
                    width - 2.0 * CELL_PADDING_X,
                    row_top + CELL_PADDING_Y,
                    text,
                    &body,
                    *align,
                );
                row_height = row_height.max(h);
            }
            self.y = row_top + row_height + 2.0 * CELL_PADDING_Y;
            if index + 1 < count {
                self.scene.rule(PADDING, self.y, CONTENT_WIDTH, 1.0, GRAY_300, RuleStyle::Solid);
                self.y += 1.0;
            }
        }
        self.y += 32.0;
    }

    fn total(&mut self, amount: f64) {
        let style = text_sm(GRAY_700).bold();
        let label = "VALOR TOTAL";
        let value = format_currency(amount);
        let padding = 8.0;
        let content = self.measure.measure(label, &style.font)
            + 16.0
            + self.measure.measure(&value, &style.font)
            + 2.0 * padding;
        let width = content.max(250.0).min(CONTENT_WIDTH);
        let x = PADDING + CONTENT_WIDTH - width;
        let height = style.line_height + 2.0 * padding;

        self.scene
            .fill_rect(Rect::new(x, self.y, width, height), GRAY_100);
        let inner = width - 2.0 * padding;
        self.line(x + padding, inner, self.y + padding, label, &style, Align::Left);
        self.line(x + padding, inner, self.y + padding, &value, &style, Align::Right);
        self.y += height + 32.0;
    }

    fn notes(&mut self, notes: Option<&str>) {
        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            let style = text_xs(GRAY_600);
            self.flow(PADDING, CONTENT_WIDTH, notes, &style, Align::Left);
            self.y += 8.0;
        }
        self.y += 32.0;
    }

    fn signature(&mut self, sender: &SenderDetails) {
        self.y += 48.0;
        self.scene
            .rule(PADDING, self.y, CONTENT_WIDTH, 2.0, GRAY_400, RuleStyle::Dotted);
        self.y += 2.0 + 48.0;

        match sender
            .signature_image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
        {
            Some(url) => {
                let height = 64.0;
                self.scene
                    .image(url, Rect::new(PADDING, self.y, 256.0, height), ImageFit::Contain);
                self.y += height;
            }
            None => {
                // Blank line to sign on
                let height = 48.0;
                self.scene
                    .rule(PADDING, self.y + height - 1.0, 192.0, 1.0, GRAY_400, RuleStyle::Solid);
                self.y += height;
            }
        }
        self.y += 8.0;

        let name = text_sm(GRAY_700).bold();
        self.flow(PADDING, CONTENT_WIDTH, &sender.signature_name, &name, Align::Left);
        let cc = text_sm(GRAY_600);
        self.flow(PADDING, CONTENT_WIDTH, &sender.signature_cc, &cc, Align::Left);
    }

    fn footer(&mut self, sender: &SenderDetails) {
        self.y += 32.0;
        self.scene.rule(PADDING, self.y, CONTENT_WIDTH, 1.0, GRAY_300, RuleStyle::Solid);
        self.y += 1.0 + 32.0;

        let line = footer_line(sender);
        let style = text_xs(GRAY_500);
        self.flow(PADDING, CONTENT_WIDTH, &line, &style, Align::Center);
    }
}

/// `name - address - Cel. phone - email`
pub fn footer_line(sender: &SenderDetails) -> String {
    format!(
        "{} - {} - Cel. {} - {}",
        sender.name, sender.address, sender.phone, sender.email
    )
}
