use crate::framework::Resource;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestajoEstado {
    #[default]
    Pendiente,
    EnProceso,
    Completado,
    Cancelado,
}

/// Piecework assignment: a crew ("destajista") paid per unit of work completed in a week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destajo {
    pub id: String,
    pub obra_id: String,
    pub destajista: String,
    pub concepto: String,
    #[serde(default)]
    pub categoria: Option<String>,
    /// Payroll week label, e.g. `"2024-S07"`.
    pub semana: String,
    pub cantidad: f64,
    #[serde(default)]
    pub unidad: Option<String>,
    pub precio_unitario: f64,
    pub total: f64,
    #[serde(default)]
    pub estado: DestajoEstado,
    #[serde(default)]
    pub fecha_pago: Option<NaiveDate>,
    #[serde(default)]
    pub observaciones: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestajoCreate {
    pub obra_id: String,
    pub destajista: String,
    pub concepto: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    pub semana: String,
    pub cantidad: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unidad: Option<String>,
    pub precio_unitario: f64,
    /// Defaults to `cantidad * precio_unitario` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestajoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<DestajoEstado>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_pago: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

impl Resource for Destajo {
    const PATH: &'static str = "destajos";
    type Create = DestajoCreate;
    type Update = DestajoUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
