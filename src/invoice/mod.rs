//! Invoice module - turns billing records into PDF documents.
//!
//! - `models` - the billing record accepted over HTTP
//! - `totals` - derived subtotal, tax and total
//! - `layout` / `fonts` - flow layout onto A4 pages with the standard fonts
//! - `logo` - optional company logo
//! - `composer` - the fixed invoice/estimate layout
//! - `handlers` - the generate and download endpoints

pub mod composer;
pub mod fonts;
pub mod handlers;
pub mod layout;
pub mod logo;
pub mod models;
pub mod totals;
pub mod traits;

pub use composer::InvoiceComposer;
pub use models::{Address, BillingRecord, Client, DocumentType, InvoiceMeta, LineItem};
pub use totals::Totals;
pub use traits::Generator;

use thiserror::Error;

/// Errors that can occur during document generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid billing record: {0}")]
    MissingField(#[source] serde_json::Error),
    #[error("amount overflow while totalling '{0}'")]
    AmountOverflow(String),
    #[error("failed to encode PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("failed to write PDF: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful document generation.
#[derive(Debug)]
pub struct GeneratedDocument {
    pub filename: String,
    pub pdf: Vec<u8>,
    pub document_type: DocumentType,
    pub totals: Totals,
}
