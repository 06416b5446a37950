//! Fixed invoice/estimate layout.
//!
//! Zones, top to bottom: title, rule, logo, company address, rule, client
//! and invoice metadata grid, line items, totals, observations box, footer
//! gap, rule, contact grid.

use chrono::Local;
use rust_decimal::Decimal;
use std::path::PathBuf;

use super::fonts::Font;
use super::layout::{mm, Align, Cell, Color, Column, PageWriter, Padding, TableStyle};
use super::logo::LogoImage;
use super::models::{BillingRecord, DocumentType};
use super::totals::{format_currency, format_quantity, format_rate, Totals};
use super::traits::Generator;
use super::{GeneratedDocument, GeneratorError};
use crate::config::{AppConfig, CompanyProfile};
use crate::storage::artifact_filename;

const MARGIN_MM: f64 = 20.0;
const BODY_SIZE: f64 = 10.0;
const TITLE_SIZE: f64 = 16.0;
const CONTACT_SIZE: f64 = 8.0;
const RULE_WIDTH: f64 = 0.5;
const LOGO_WIDTH_MM: f64 = 80.0;
const LOGO_HEIGHT_MM: f64 = 25.0;

/// Stateless composer; one logo read per document.
#[derive(Debug, Clone)]
pub struct InvoiceComposer {
    profile: CompanyProfile,
    logo_path: PathBuf,
    tax_rate: Decimal,
}

impl InvoiceComposer {
    pub fn new(profile: CompanyProfile, logo_path: impl Into<PathBuf>, tax_rate: Decimal) -> Self {
        Self {
            profile,
            logo_path: logo_path.into(),
            tax_rate,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.company.clone(),
            config.logo_path.clone(),
            config.tax_rate,
        )
    }

    pub fn totals(&self, record: &BillingRecord) -> Result<Totals, GeneratorError> {
        Totals::compute(&record.line_items, self.tax_rate)
    }

    /// Render `record` to PDF bytes. Identical records give identical bytes.
    pub fn compose(&self, record: &BillingRecord) -> Result<Vec<u8>, GeneratorError> {
        let totals = self.totals(record)?;
        self.render(record, &totals)
    }

    fn render(&self, record: &BillingRecord, totals: &Totals) -> Result<Vec<u8>, GeneratorError> {
        let kind = record.kind();
        let mut page = PageWriter::new(mm(MARGIN_MM));

        page.paragraph(kind.title(), Font::Bold, TITLE_SIZE, Align::Center, Color::BLACK);
        page.spacer(mm(10.0));
        page.rule(RULE_WIDTH, Color::GREY);
        page.spacer(mm(5.0));

        if let Some(logo) = LogoImage::load_optional(&self.logo_path) {
            page.centered_image(logo, mm(LOGO_WIDTH_MM), mm(LOGO_HEIGHT_MM));
        }

        page.paragraph(
            &self.profile.identity_line(),
            Font::Regular,
            BODY_SIZE,
            Align::Center,
            Color::GREY,
        );
        page.spacer(mm(5.0));
        page.rule(RULE_WIDTH, Color::GREY);
        page.spacer(mm(10.0));

        self.metadata_grid(&mut page, record, kind);
        page.spacer(mm(10.0));
        self.items_table(&mut page, record);
        page.spacer(mm(10.0));
        self.totals_table(&mut page, totals);

        page.spacer(mm(10.0));
        page.boxed_paragraph("Observations:", record.observations_text(), BODY_SIZE, 4.0);
        page.spacer(mm(10.0));

        // signature gap
        page.spacer(mm(50.0));
        page.rule(RULE_WIDTH, Color::GREY);
        page.spacer(mm(5.0));
        self.contact_grid(&mut page);

        page.finish()
    }

    fn metadata_grid(&self, page: &mut PageWriter, record: &BillingRecord, kind: DocumentType) {
        let client = &record.client;
        let meta = &record.invoice_meta;
        let (street, municipality) = client.address.lines();

        let rows = match kind {
            DocumentType::Invoice => vec![
                vec![
                    Cell::bold("Client:"),
                    Cell::new(&client.name),
                    Cell::bold("Invoice No.:"),
                    Cell::new(meta.number.as_deref().unwrap_or_default()),
                ],
                vec![
                    Cell::bold("Address:"),
                    Cell::new(street),
                    Cell::bold("Issue date:"),
                    Cell::new(&meta.issue_date),
                ],
                vec![
                    Cell::bold("Municipality:"),
                    Cell::new(municipality),
                    Cell::bold("Due date:"),
                    Cell::new(&meta.due_date),
                ],
                vec![
                    Cell::bold("Tax ID:"),
                    Cell::new(&client.tax_id),
                    Cell::empty(),
                    Cell::empty(),
                ],
            ],
            DocumentType::Estimate => vec![
                vec![
                    Cell::bold("Client:"),
                    Cell::new(&client.name),
                    Cell::bold("Issue date:"),
                    Cell::new(&meta.issue_date),
                ],
                vec![
                    Cell::bold("Address:"),
                    Cell::new(street),
                    Cell::bold("Due date:"),
                    Cell::new(&meta.due_date),
                ],
                vec![
                    Cell::bold("Municipality:"),
                    Cell::new(municipality),
                    Cell::empty(),
                    Cell::empty(),
                ],
                vec![
                    Cell::bold("Tax ID:"),
                    Cell::new(&client.tax_id),
                    Cell::empty(),
                    Cell::empty(),
                ],
            ],
        };

        let columns = [
            Column::left(28.0),
            Column::left(72.0),
            Column::left(30.0),
            Column::left(40.0),
        ];
        page.table(&columns, &rows, &TableStyle::default());
    }

    fn items_table(&self, page: &mut PageWriter, record: &BillingRecord) {
        let symbol = &self.profile.currency_symbol;
        let mut rows = vec![vec![
            Cell::bold("Description"),
            Cell::bold("Quantity"),
            Cell::bold("Price"),
        ]];
        rows.extend(record.line_items.iter().map(|item| {
            vec![
                Cell::new(&item.description),
                Cell::new(format_quantity(item.quantity)),
                Cell::new(format_currency(item.unit_price, symbol)),
            ]
        }));

        let columns = [Column::left(110.0), Column::right(30.0), Column::right(30.0)];
        page.table(&columns, &rows, &TableStyle::default());
    }

    fn totals_table(&self, page: &mut PageWriter, totals: &Totals) {
        let symbol = &self.profile.currency_symbol;
        let rows = vec![
            vec![
                Cell::new("Total without tax"),
                Cell::new(format_currency(totals.subtotal, symbol)),
            ],
            vec![
                Cell::new(format!("Tax {}%", format_rate(self.tax_rate))),
                Cell::new(format_currency(totals.tax, symbol)),
            ],
            vec![
                Cell::bold("TOTAL"),
                Cell::bold(format_currency(totals.total, symbol)),
            ],
        ];

        let columns = [Column::right(140.0), Column::right(30.0)];
        page.table(&columns, &rows, &TableStyle::default());
    }

    fn contact_grid(&self, page: &mut PageWriter) {
        let p = &self.profile;
        let rows = vec![
            vec![
                Cell::new(p.identity_line()),
                Cell::new(format!("Tax ID: {}", p.tax_id)),
                Cell::new(format!("Contact: {}", p.contact_person)),
                Cell::new(format!("Phone: {}", p.phone)),
            ],
            vec![
                Cell::new(format!("E-mail: {}", p.email)),
                Cell::new(format!("Account holder: {}", p.account_holder)),
                Cell::new(format!("Bank: {}", p.bank_name)),
                Cell::empty(),
            ],
            vec![
                Cell::new(format!("IBAN: {}", p.iban)),
                Cell::empty(),
                Cell::empty(),
                Cell::empty(),
            ],
        ];

        let style = TableStyle {
            font_size: CONTACT_SIZE,
            padding: Padding {
                top: 0.0,
                right: 10.0,
                bottom: 0.0,
                left: 0.0,
            },
            row_height: Some(12.0),
            color: Color::BLACK,
        };
        let columns = [
            Column::left(70.0),
            Column::left(45.0),
            Column::left(45.0),
            Column::left(20.0),
        ];
        page.table(&columns, &rows, &style);
    }
}

impl Generator<BillingRecord> for InvoiceComposer {
    fn generate(&self, record: BillingRecord) -> Result<GeneratedDocument, GeneratorError> {
        let document_type = record.kind();
        let totals = self.totals(&record)?;
        let pdf = self.render(&record, &totals)?;
        let filename = artifact_filename(
            document_type.file_prefix(),
            &record.client.name,
            Local::now(),
        );

        log::debug!(
            "Composed {} for '{}': {} bytes, total {}",
            document_type.title(),
            record.client.name,
            pdf.len(),
            totals.total
        );

        Ok(GeneratedDocument {
            filename,
            pdf,
            document_type,
            totals,
        })
    }
}
