//! Invoice display model
//!
//! Field names follow the backend JSON (camelCase).

use serde::{Deserialize, Serialize};

/// Unit shown for line items that do not carry one
pub const DEFAULT_UNIT: &str = "HORAS";

/// Client name used in file names when none is known
pub const FALLBACK_CLIENT_NAME: &str = "Cliente";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub description: String,
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub unit_price: f64,
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

impl LineItem {
    /// quantity x unit price
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    pub id: String,
    pub nit_or_cc: String,
    pub name: String,
    pub city: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub client_id: String,
    /// Embedded copy of the client, when the backend populates it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Invoice {
    /// Sum of all line amounts
    pub fn total(&self) -> f64 {
        self.line_items.iter().map(LineItem::amount).sum()
    }

    /// Base download name, `Cuenta de Cobro-<number> <client>.pdf`.
    ///
    /// The client name comes from `client`, then the embedded client, then
    /// [`FALLBACK_CLIENT_NAME`]. Path separators are replaced so the name
    /// stays a single file name.
    pub fn base_file_name(&self, client: Option<&Client>) -> String {
        let client_name = client
            .map(|c| c.name.trim())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                self.client
                    .as_ref()
                    .map(|c| c.name.trim())
                    .filter(|name| !name.is_empty())
            })
            .unwrap_or(FALLBACK_CLIENT_NAME);
        let name = format!("Cuenta de Cobro-{} {}.pdf", self.invoice_number, client_name);
        name.replace(['/', '\\'], "-")
    }
}

/// The issuer profile printed on every invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SenderDetails {
    pub name: String,
    pub nit: String,
    /// e.g. "Persona Natural"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub bank_account_info: String,
    pub signature_name: String,
    #[serde(rename = "signatureCC")]
    pub signature_cc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_image_url: Option<String>,
}

impl Default for SenderDetails {
    /// Placeholder profile shown until the user fills in their settings
    fn default() -> Self {
        Self {
            name: "Tu Nombre/Empresa Aquí".to_string(),
            nit: "Tu NIT/CC Aquí".to_string(),
            kind: "Persona Natural/Jurídica".to_string(),
            logo_url: None,
            address: "Tu Dirección, Ciudad".to_string(),
            phone: "Tu Teléfono".to_string(),
            email: "tuemail@example.com".to_string(),
            bank_account_info:
                "Información de cuenta bancaria (ej: Cuenta de ahorros Bancolombia XXX-XXXXXX-X)"
                    .to_string(),
            signature_name: "Nombre del Firmante".to_string(),
            signature_cc: "CC. del Firmante".to_string(),
            signature_image_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice_json() -> &'static str {
        r#"{
            "id": "inv-1",
            "invoiceNumber": "0042",
            "date": "2025-11-20",
            "clientId": "c-1",
            "client": { "id": "c-1", "nitOrCc": "900.123", "name": "ACME SAS",
                        "city": "Bogotá", "phone": "300", "address": "Calle 1" },
            "lineItems": [
                { "id": "l1", "description": "Desarrollo", "quantity": 10, "unit": "HORAS", "unitPrice": 12000 },
                { "id": "l2", "description": "Soporte", "quantity": 1.5, "unitPrice": 20000 }
            ],
            "notes": "Pagar a 30 días"
        }"#
    }

    #[test]
    fn test_deserialize_backend_json() {
        let invoice: Invoice = serde_json::from_str(invoice_json()).unwrap();
        assert_eq!(invoice.invoice_number, "0042");
        assert_eq!(invoice.line_items.len(), 2);
        assert_eq!(invoice.line_items[1].unit, DEFAULT_UNIT);
        assert_eq!(invoice.client.as_ref().unwrap().nit_or_cc, "900.123");
        assert_eq!(invoice.total(), 150_000.0);
    }

    #[test]
    fn test_base_file_name() {
        let invoice: Invoice = serde_json::from_str(invoice_json()).unwrap();
        let fetched = Client {
            name: "Cliente Nuevo".into(),
            ..Default::default()
        };
        assert_eq!(
            invoice.base_file_name(Some(&fetched)),
            "Cuenta de Cobro-0042 Cliente Nuevo.pdf"
        );
        assert_eq!(invoice.base_file_name(None), "Cuenta de Cobro-0042 ACME SAS.pdf");

        let bare = Invoice {
            client: None,
            ..invoice
        };
        assert_eq!(bare.base_file_name(None), "Cuenta de Cobro-0042 Cliente.pdf");
    }

    #[test]
    fn test_file_name_has_no_separators() {
        let invoice = Invoice {
            id: "x".into(),
            invoice_number: "7/2025".into(),
            date: "2025-01-01".into(),
            client_id: String::new(),
            client: None,
            line_items: Vec::new(),
            notes: None,
        };
        assert_eq!(invoice.base_file_name(None), "Cuenta de Cobro-7-2025 Cliente.pdf");
    }

    #[test]
    fn test_sender_defaults_fill_missing_fields() {
        let sender: SenderDetails =
            serde_json::from_str(r#"{ "name": "Ana Pérez", "signatureCC": "CC 123" }"#).unwrap();
        assert_eq!(sender.name, "Ana Pérez");
        assert_eq!(sender.signature_cc, "CC 123");
        assert_eq!(sender.email, "tuemail@example.com");
        assert!(sender.logo_url.is_none());

        let json = serde_json::to_value(SenderDetails::default()).unwrap();
        assert_eq!(json["type"], "Persona Natural/Jurídica");
        assert!(json.get("logoUrl").is_none());
    }
}
