use crate::framework::Resource;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// IVA rate applied to purchase orders with `has_iva`.
pub const IVA_RATE: f64 = 0.16;

/// Purchase-order lifecycle: borrador → emitida → recibida → facturada → pagada, or cancelada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdenCompraEstado {
    #[default]
    Borrador,
    Emitida,
    Recibida,
    Facturada,
    Pagada,
    Cancelada,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdenCompraItem {
    pub cantidad: f64,
    pub unidad: String,
    pub descripcion: String,
    pub precio_unitario: f64,
    pub total: f64,
}

/// Line item as submitted on create; the line total is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdenCompraItemInput {
    pub cantidad: f64,
    pub unidad: String,
    pub descripcion: String,
    pub precio_unitario: f64,
}

impl From<OrdenCompraItemInput> for OrdenCompraItem {
    fn from(input: OrdenCompraItemInput) -> Self {
        Self {
            total: input.cantidad * input.precio_unitario,
            cantidad: input.cantidad,
            unidad: input.unidad,
            descripcion: input.descripcion,
            precio_unitario: input.precio_unitario,
        }
    }
}

/// A purchase order issued to a supplier for one obra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdenCompra {
    pub id: String,
    pub numero_orden: String,
    pub obra_id: String,
    pub proveedor_id: String,
    #[serde(default)]
    pub requisicion_id: Option<String>,
    pub fecha_emision: NaiveDate,
    pub fecha_entrega: NaiveDate,
    #[serde(default)]
    pub estado: OrdenCompraEstado,
    #[serde(default)]
    pub has_iva: bool,
    pub subtotal: f64,
    /// Discount percentage applied to the subtotal.
    #[serde(default)]
    pub descuento: f64,
    #[serde(default)]
    pub descuento_monto: f64,
    #[serde(default)]
    pub iva: f64,
    pub total: f64,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub items: Vec<OrdenCompraItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Money breakdown of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totales {
    pub subtotal: f64,
    pub descuento_monto: f64,
    pub iva: f64,
    pub total: f64,
}

impl Totales {
    pub fn compute(items: &[OrdenCompraItem], has_iva: bool, descuento: f64) -> Self {
        let subtotal: f64 = items.iter().map(|item| item.total).sum();
        let descuento_monto = subtotal * descuento / 100.0;
        let base = subtotal - descuento_monto;
        let iva = if has_iva { base * IVA_RATE } else { 0.0 };
        Self {
            subtotal,
            descuento_monto,
            iva,
            total: base + iva,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdenCompraCreate {
    pub obra_id: String,
    pub proveedor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisicion_id: Option<String>,
    pub fecha_entrega: NaiveDate,
    #[serde(default = "default_has_iva")]
    pub has_iva: bool,
    #[serde(default)]
    pub descuento: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    pub items: Vec<OrdenCompraItemInput>,
}

fn default_has_iva() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdenCompraUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<OrdenCompraEstado>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_entrega: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

impl Resource for OrdenCompra {
    const PATH: &'static str = "ordenes-compra";
    type Create = OrdenCompraCreate;
    type Update = OrdenCompraUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
