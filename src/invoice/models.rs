//! Billing record types accepted by the composer.
//!
//! Field names follow the English API, but every field also accepts the
//! Spanish keys used by older clients (`cliente`,
//! `conceptos`, `fecha_emision`, ...).

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use super::GeneratorError;

/// Placeholder printed in the observations box when the record has none.
pub const DEFAULT_OBSERVATIONS: &str = "No observations";

/// Kind of document being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentType {
    #[default]
    Invoice,
    Estimate,
}

impl DocumentType {
    /// Normalize the caller-supplied type. Only `presupuesto` (any case)
    /// selects an estimate; everything else, including nothing, is an invoice.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("presupuesto") => Self::Estimate,
            _ => Self::Invoice,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Invoice => "INVOICE",
            Self::Estimate => "ESTIMATE",
        }
    }

    /// Prefix used for stored artifact filenames.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Estimate => "estimate",
        }
    }
}

/// Client postal address.
///
/// Callers send either an object or a single string with the street on the
/// first line and the municipality on the next.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Address {
    Structured {
        #[serde(default, alias = "calle_y_numeros")]
        street_and_number: String,
        #[serde(default, alias = "municipio")]
        municipality: String,
    },
    FreeText(String),
}

impl Address {
    /// Split the address into `(street, municipality)`.
    pub fn lines(&self) -> (String, String) {
        match self {
            Self::Structured {
                street_and_number,
                municipality,
            } => (street_and_number.clone(), municipality.clone()),
            Self::FreeText(raw) => match raw.split_once('\n') {
                Some((street, rest)) => (
                    street.trim_end_matches('\r').trim().to_string(),
                    rest.trim().to_string(),
                ),
                None => (raw.trim().to_string(), String::new()),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Client {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "DNI", alias = "dni")]
    pub tax_id: String,
    #[serde(alias = "direccion")]
    pub address: Address,
}

/// Invoice numbering and dates. Dates are display strings and never parsed.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InvoiceMeta {
    #[serde(default, alias = "numero")]
    pub number: Option<String>,
    #[serde(alias = "fecha_emision")]
    pub issue_date: String,
    #[serde(alias = "fecha_vencimiento")]
    pub due_date: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LineItem {
    #[serde(alias = "descripcion")]
    pub description: String,
    #[serde(alias = "cantidad")]
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    #[serde(alias = "precio_unitario")]
    #[schema(value_type = f64)]
    pub unit_price: Decimal,
}

impl LineItem {
    /// Exact line amount, `None` on decimal overflow.
    pub fn amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }
}

/// The structured input describing one invoice or estimate.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BillingRecord {
    #[serde(default, alias = "tipo_documento")]
    pub document_type: Option<String>,
    #[serde(alias = "cliente")]
    pub client: Client,
    #[serde(alias = "factura")]
    pub invoice_meta: InvoiceMeta,
    #[serde(alias = "conceptos")]
    pub line_items: Vec<LineItem>,
    #[serde(default, alias = "observaciones")]
    pub observations: Option<String>,
}

impl BillingRecord {
    /// Build a record from an already-parsed JSON body.
    pub fn from_value(value: serde_json::Value) -> Result<Self, GeneratorError> {
        serde_json::from_value(value).map_err(GeneratorError::MissingField)
    }

    pub fn kind(&self) -> DocumentType {
        DocumentType::from_raw(self.document_type.as_deref())
    }

    pub fn observations_text(&self) -> &str {
        self.observations.as_deref().unwrap_or(DEFAULT_OBSERVATIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_type_normalization() {
        for raw in ["presupuesto", "Presupuesto", "PRESUPUESTO", " presupuesto "] {
            assert_eq!(DocumentType::from_raw(Some(raw)), DocumentType::Estimate);
        }
        for raw in ["factura", "", "estimate", "invoice"] {
            assert_eq!(DocumentType::from_raw(Some(raw)), DocumentType::Invoice);
        }
        assert_eq!(DocumentType::from_raw(None), DocumentType::Invoice);
    }

    #[test]
    fn test_structured_address_lines() {
        let address: Address = serde_json::from_value(json!({
            "calle_y_numeros": "Calle Mayor 1",
            "municipio": "Valencia"
        }))
        .unwrap();

        assert_eq!(
            address.lines(),
            ("Calle Mayor 1".to_string(), "Valencia".to_string())
        );
    }

    #[test]
    fn test_structured_address_missing_fields_default_to_empty() {
        let address: Address = serde_json::from_value(json!({})).unwrap();
        assert_eq!(address.lines(), (String::new(), String::new()));
    }

    #[test]
    fn test_free_text_address_lines() {
        let address: Address = serde_json::from_value(json!("Calle Mayor 1\r\nValencia")).unwrap();
        assert_eq!(
            address.lines(),
            ("Calle Mayor 1".to_string(), "Valencia".to_string())
        );

        let single = Address::FreeText("Calle Mayor 1".to_string());
        assert_eq!(single.lines(), ("Calle Mayor 1".to_string(), String::new()));
    }

    #[test]
    fn test_spanish_record_deserialization() {
        let record = BillingRecord::from_value(json!({
            "tipo_documento": "Presupuesto",
            "cliente": {
                "nombre": "Ana García",
                "DNI": "12345678Z",
                "direccion": { "calle_y_numeros": "Av. Puerto 5", "municipio": "Valencia" }
            },
            "factura": { "fecha_emision": "01/02/2025", "fecha_vencimiento": "01/03/2025" },
            "conceptos": [
                { "descripcion": "Pintura", "cantidad": 3, "precio_unitario": 12.5 }
            ]
        }))
        .unwrap();

        assert_eq!(record.kind(), DocumentType::Estimate);
        assert_eq!(record.client.name, "Ana García");
        assert_eq!(record.invoice_meta.number, None);
        assert_eq!(record.line_items[0].amount(), Some(Decimal::new(375, 1)));
        assert_eq!(record.observations_text(), DEFAULT_OBSERVATIONS);
    }

    #[test]
    fn test_missing_required_field_is_reported() {
        let err = BillingRecord::from_value(json!({
            "client": { "name": "Bob", "tax_id": "X", "address": "Street" },
            "line_items": []
        }))
        .unwrap_err();

        assert!(matches!(err, GeneratorError::MissingField(_)));
        assert!(err.to_string().contains("invoice_meta"));
    }
}
