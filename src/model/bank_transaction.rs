//! Bank statement lines used for reconciliation against purchase orders.
//!
//! Transactions are imported in batches (usually from a bank CSV) and later matched to an
//! orden de compra. They are not a CRUD resource on the backend: the only writes are
//! `import` and `match`.

use crate::framework::Resource;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrigenTransaccion {
    #[default]
    Csv,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: String,
    pub fecha: NaiveDate,
    pub descripcion_banco: String,
    /// Lowercased, whitespace-collapsed `descripcion_banco`, used for fuzzy matching.
    #[serde(default)]
    pub descripcion_banco_normalizada: Option<String>,
    pub monto: f64,
    #[serde(default)]
    pub referencia_bancaria: Option<String>,
    #[serde(default)]
    pub origen: OrigenTransaccion,
    /// 0-100.
    #[serde(default)]
    pub match_confidence: u8,
    #[serde(default)]
    pub match_manual: bool,
    #[serde(default)]
    pub orden_compra_id: Option<String>,
    #[serde(default)]
    pub matched: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an import batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransactionCreate {
    pub fecha: NaiveDate,
    pub descripcion_banco: String,
    pub monto: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referencia_bancaria: Option<String>,
    #[serde(default)]
    pub origen: OrigenTransaccion,
    #[serde(default)]
    pub match_confidence: u8,
    #[serde(default)]
    pub match_manual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orden_compra_id: Option<String>,
    #[serde(default)]
    pub matched: bool,
}

impl BankTransactionCreate {
    /// An unmatched CSV line.
    pub fn new(fecha: NaiveDate, descripcion_banco: impl Into<String>, monto: f64) -> Self {
        Self {
            fecha,
            descripcion_banco: descripcion_banco.into(),
            monto,
            referencia_bancaria: None,
            origen: OrigenTransaccion::Csv,
            match_confidence: 0,
            match_manual: false,
            orden_compra_id: None,
            matched: false,
        }
    }
}

/// Links a transaction to a purchase order. Always marks it matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransactionMatch {
    pub orden_compra_id: String,
    #[serde(default)]
    pub match_confidence: u8,
    #[serde(default = "manual_by_default")]
    pub match_manual: bool,
}

fn manual_by_default() -> bool {
    true
}

impl BankTransactionMatch {
    /// A match picked by a user.
    pub fn manual(orden_compra_id: impl Into<String>) -> Self {
        Self {
            orden_compra_id: orden_compra_id.into(),
            match_confidence: 0,
            match_manual: true,
        }
    }
}

impl Resource for BankTransaction {
    const PATH: &'static str = "bank-transactions";
    type Create = BankTransactionCreate;
    type Update = BankTransactionMatch;

    fn id(&self) -> &str {
        &self.id
    }
}

/// `"  SPEI   Cementos  "` -> `"spei cementos"`.
pub fn normalize_description(descripcion: &str) -> String {
    descripcion
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_description("  SPEI\tCementos   del CENTRO \n"),
            "spei cementos del centro"
        );
        assert_eq!(normalize_description("   "), "");
    }

    #[test]
    fn test_match_payload_defaults_to_manual() {
        let data: BankTransactionMatch = serde_json::from_str(r#"{"orden_compra_id":"oc-001"}"#).unwrap();
        assert_eq!(data, BankTransactionMatch::manual("oc-001"));
    }

    #[test]
    fn test_backend_row_with_missing_optionals_decodes() {
        let row = r#"{
            "id": "bt-9", "fecha": "2024-03-08", "descripcion_banco": "SPEI CEMEX",
            "monto": 464000.0, "created_at": "2024-03-08T12:00:00Z", "updated_at": "2024-03-08T12:00:00Z"
        }"#;
        let tx: BankTransaction = serde_json::from_str(row).unwrap();
        assert_eq!(tx.origen, OrigenTransaccion::Csv);
        assert!(!tx.matched);
        assert_eq!(tx.orden_compra_id, None);
    }
}
