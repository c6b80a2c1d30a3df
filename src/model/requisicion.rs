use crate::framework::Resource;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgencia {
    #[default]
    Normal,
    Urgente,
    MuyUrgente,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequisicionEstado {
    #[default]
    Pendiente,
    Aprobada,
    Rechazada,
    EnProceso,
    Completada,
}

/// A requested material line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequisicionItem {
    pub cantidad: f64,
    pub unidad: String,
    pub descripcion: String,
}

/// Material request raised from a site, later converted into an [`OrdenCompra`](crate::model::OrdenCompra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requisicion {
    pub id: String,
    pub numero_requisicion: String,
    pub obra_id: String,
    pub solicitado_por: String,
    pub fecha_solicitud: NaiveDate,
    #[serde(default)]
    pub urgencia: Urgencia,
    #[serde(default)]
    pub estado: RequisicionEstado,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub aprobado_por: Option<String>,
    #[serde(default)]
    pub motivo_rechazo: Option<String>,
    #[serde(default)]
    pub items: Vec<RequisicionItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequisicionCreate {
    pub obra_id: String,
    pub solicitado_por: String,
    #[serde(default)]
    pub urgencia: Urgencia,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    pub items: Vec<RequisicionItem>,
}

/// Approval workflow fields. Items are fixed once the requisition exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequisicionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgencia: Option<Urgencia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<RequisicionEstado>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aprobado_por: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivo_rechazo: Option<String>,
}

impl Resource for Requisicion {
    const PATH: &'static str = "requisiciones";
    type Create = RequisicionCreate;
    type Update = RequisicionUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
