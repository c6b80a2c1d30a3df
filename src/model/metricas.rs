//! Dashboard read models. Every `compute` is pure: callers pass in the rows, and records that do
//! not belong to the subject are ignored.
//!
//! Shared rules: a purchase order is *committed* unless cancelled, a payment counts as *paid*
//! once completed.

use crate::model::{
    Obra, ObraEstado, OrdenCompra, OrdenCompraEstado, Pago, PagoEstado, Proveedor, Requisicion, RequisicionEstado,
    Urgencia,
};
use serde::{Deserialize, Serialize};

fn committed(oc: &OrdenCompra) -> bool {
    oc.estado != OrdenCompraEstado::Cancelada
}

fn paid(pago: &Pago) -> bool {
    pago.estado == PagoEstado::Completado
}

fn count<T>(rows: &[&T], pred: impl Fn(&T) -> bool) -> u32 {
    rows.iter().filter(|row| pred(row)).count() as u32
}

/// Financial summary of one obra, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricasObra {
    pub obra_id: String,
    pub monto_contratado: f64,
    /// Sum of non-cancelled purchase-order totals.
    pub comprometido: f64,
    /// Sum of completed payments.
    pub pagado: f64,
    pub saldo: f64,
    pub porcentaje_ejecutado: f64,
}

impl MetricasObra {
    /// Computes the summary from the obra's purchase orders and payments. Records belonging to
    /// other obras are ignored.
    pub fn compute(obra: &Obra, ordenes: &[OrdenCompra], pagos: &[Pago]) -> Self {
        let comprometido: f64 = ordenes
            .iter()
            .filter(|oc| oc.obra_id == obra.id && committed(oc))
            .map(|oc| oc.total)
            .sum();
        let pagado: f64 = pagos
            .iter()
            .filter(|p| p.obra_id == obra.id && paid(p))
            .map(|p| p.monto)
            .sum();
        let porcentaje_ejecutado = if obra.monto_contratado > 0.0 {
            comprometido / obra.monto_contratado * 100.0
        } else {
            0.0
        };
        Self {
            obra_id: obra.id.clone(),
            monto_contratado: obra.monto_contratado,
            comprometido,
            pagado,
            saldo: comprometido - pagado,
            porcentaje_ejecutado,
        }
    }
}

/// Purchase-order balance with one supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumenProveedor {
    pub proveedor_id: String,
    pub razon_social: String,
    /// Committed purchase orders.
    pub total_ordenes: u32,
    pub total_comprometido: f64,
    pub total_pagado: f64,
    pub saldo_pendiente: f64,
}

impl ResumenProveedor {
    pub fn compute(proveedor: &Proveedor, ordenes: &[OrdenCompra], pagos: &[Pago]) -> Self {
        let ordenes: Vec<&OrdenCompra> = ordenes
            .iter()
            .filter(|oc| oc.proveedor_id == proveedor.id && committed(oc))
            .collect();
        let total_comprometido: f64 = ordenes.iter().map(|oc| oc.total).sum();
        let total_pagado: f64 = pagos
            .iter()
            .filter(|p| p.proveedor_id == proveedor.id && paid(p))
            .map(|p| p.monto)
            .sum();
        Self {
            proveedor_id: proveedor.id.clone(),
            razon_social: proveedor.razon_social.clone(),
            total_ordenes: ordenes.len() as u32,
            total_comprometido,
            total_pagado,
            saldo_pendiente: total_comprometido - total_pagado,
        }
    }
}

/// Requisition workload of one obra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstadoRequisiciones {
    pub obra_id: String,
    pub nombre_obra: String,
    pub total_requisiciones: u32,
    pub pendientes: u32,
    /// In `en_proceso`.
    pub en_revision: u32,
    /// `urgente` or `muy_urgente`, whatever the estado.
    pub urgentes: u32,
}

impl EstadoRequisiciones {
    pub fn compute(obra: &Obra, requisiciones: &[Requisicion]) -> Self {
        let own: Vec<&Requisicion> = requisiciones.iter().filter(|r| r.obra_id == obra.id).collect();
        Self {
            obra_id: obra.id.clone(),
            nombre_obra: obra.nombre.clone(),
            total_requisiciones: own.len() as u32,
            pendientes: count(&own, |r| r.estado == RequisicionEstado::Pendiente),
            en_revision: count(&own, |r| r.estado == RequisicionEstado::EnProceso),
            urgentes: count(&own, |r| matches!(r.urgencia, Urgencia::Urgente | Urgencia::MuyUrgente)),
        }
    }
}

/// Company-wide totals for the dashboard header.
///
/// Also decodes the backend's `/dashboard/resumen` payload, whose names differ
/// (`obras_activas`, `total_contratado`, `total_oc`, `total_pendiente`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardGlobal {
    #[serde(alias = "obras_activas")]
    pub total_obras_activas: u32,
    /// Contracted amount of active obras.
    #[serde(alias = "total_contratado")]
    pub total_presupuesto: f64,
    #[serde(alias = "total_oc")]
    pub total_comprometido: f64,
    pub total_pagado: f64,
    #[serde(alias = "total_pendiente")]
    pub total_por_pagar: f64,
    #[serde(default)]
    pub requisiciones_pendientes: u32,
    /// Purchase orders still in `borrador` or `emitida`.
    #[serde(default)]
    pub ordenes_pendientes: u32,
}

impl DashboardGlobal {
    pub fn compute(obras: &[Obra], ordenes: &[OrdenCompra], pagos: &[Pago], requisiciones: &[Requisicion]) -> Self {
        let activas: Vec<&Obra> = obras.iter().filter(|o| o.estado == ObraEstado::Activa).collect();
        let total_comprometido: f64 = ordenes.iter().filter(|oc| committed(oc)).map(|oc| oc.total).sum();
        let total_pagado: f64 = pagos.iter().filter(|p| paid(p)).map(|p| p.monto).sum();
        Self {
            total_obras_activas: activas.len() as u32,
            total_presupuesto: activas.iter().map(|o| o.monto_contratado).sum(),
            total_comprometido,
            total_pagado,
            total_por_pagar: total_comprometido - total_pagado,
            requisiciones_pendientes: requisiciones
                .iter()
                .filter(|r| r.estado == RequisicionEstado::Pendiente)
                .count() as u32,
            ordenes_pendientes: ordenes
                .iter()
                .filter(|oc| matches!(oc.estado, OrdenCompraEstado::Borrador | OrdenCompraEstado::Emitida))
                .count() as u32,
        }
    }
}
