#![allow(dead_code)]

use invoice_pdf_server::config::CompanyProfile;
use invoice_pdf_server::invoice::InvoiceComposer;
use invoice_pdf_server::storage::ArtifactStore;
use invoice_pdf_server::AppState;
use lopdf::content::Content;
use lopdf::{Document, Object};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::path::Path;

/// App state writing artifacts under `dir`, with no logo on disk.
pub fn test_app_state(dir: &Path) -> AppState {
    let composer = InvoiceComposer::new(
        CompanyProfile::default(),
        dir.join("missing-logo.png"),
        Decimal::new(21, 2),
    );
    AppState::new(composer, ArtifactStore::new(dir.join("artifacts")))
}

pub fn invoice_payload() -> Value {
    json!({
        "document_type": "factura",
        "client": {
            "name": "Acme S.L.",
            "tax_id": "B12345678",
            "address": { "street_and_number": "Calle Mayor 1", "municipality": "Valencia" }
        },
        "invoice_meta": { "number": "F-2025-001", "issue_date": "01/02/2025", "due_date": "01/03/2025" },
        "line_items": [
            { "description": "Service A", "quantity": 2, "unit_price": 50.00 }
        ]
    })
}

pub fn spanish_payload() -> Value {
    json!({
        "tipo_documento": "presupuesto",
        "cliente": {
            "nombre": "Juan Pérez",
            "DNI": "12345678Z",
            "direccion": { "calle_y_numeros": "Av. del Puerto 12", "municipio": "Alicante" }
        },
        "factura": { "fecha_emision": "10/03/2025", "fecha_vencimiento": "10/04/2025" },
        "conceptos": [
            { "descripcion": "Reforma baño", "cantidad": 1, "precio_unitario": 1500 },
            { "descripcion": "Material", "cantidad": 3, "precio_unitario": 19.99 }
        ],
        "observaciones": "Validez 30 días"
    })
}

/// Every string shown with `Tj`, decoded from WinAnsi.
pub fn pdf_texts(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("valid PDF");
    let mut out = Vec::new();
    for id in doc.get_pages().values() {
        let content = Content::decode(&doc.get_page_content(*id).expect("page content"))
            .expect("decodable content");
        for op in content.operations.iter().filter(|op| op.operator == "Tj") {
            if let Some(Object::String(bytes, _)) = op.operands.first() {
                out.push(
                    bytes
                        .iter()
                        .map(|b| if *b == 0x80 { '€' } else { *b as char })
                        .collect(),
                );
            }
        }
    }
    out
}
