use crate::framework::Resource;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagoEstado {
    #[default]
    Programado,
    Procesando,
    Completado,
    Cancelado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetodoPago {
    #[default]
    Transferencia,
    Cheque,
    Efectivo,
}

/// A payment against a purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pago {
    pub id: String,
    pub numero_pago: String,
    pub obra_id: String,
    pub proveedor_id: String,
    pub orden_compra_id: String,
    pub monto: f64,
    #[serde(default)]
    pub metodo_pago: MetodoPago,
    pub fecha_programada: NaiveDate,
    #[serde(default)]
    pub fecha_procesado: Option<NaiveDate>,
    #[serde(default)]
    pub estado: PagoEstado,
    #[serde(default)]
    pub referencia: Option<String>,
    #[serde(default)]
    pub folio_factura: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagoCreate {
    pub obra_id: String,
    pub proveedor_id: String,
    pub orden_compra_id: String,
    pub monto: f64,
    #[serde(default)]
    pub metodo_pago: MetodoPago,
    pub fecha_programada: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folio_factura: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<PagoEstado>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monto: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metodo_pago: Option<MetodoPago>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_programada: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_procesado: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referencia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

impl Resource for Pago {
    const PATH: &'static str = "pagos";
    type Create = PagoCreate;
    type Update = PagoUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
