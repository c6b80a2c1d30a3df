use crate::framework::Resource;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a construction work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObraEstado {
    #[default]
    Activa,
    Suspendida,
    Terminada,
    Cancelada,
}

/// A construction work ("obra"), the top-level cost entity.
///
/// Requisitions, purchase orders, payments and piecework assignments all reference an obra by
/// `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obra {
    pub id: String,
    pub codigo: String,
    pub nombre: String,
    pub numero_contrato: String,
    pub cliente: String,
    pub residente: String,
    #[serde(default)]
    pub direccion: Option<String>,
    pub monto_contratado: f64,
    #[serde(default)]
    pub anticipo_porcentaje: f64,
    #[serde(default)]
    pub retencion_porcentaje: f64,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin_programada: NaiveDate,
    /// Execution term in days.
    pub plazo_ejecucion: u32,
    #[serde(default)]
    pub estado: ObraEstado,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new obra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObraCreate {
    pub codigo: String,
    pub nombre: String,
    pub numero_contrato: String,
    pub cliente: String,
    pub residente: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    pub monto_contratado: f64,
    #[serde(default)]
    pub anticipo_porcentaje: f64,
    #[serde(default)]
    pub retencion_porcentaje: f64,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin_programada: NaiveDate,
    pub plazo_ejecucion: u32,
    #[serde(default)]
    pub estado: ObraEstado,
}

/// Payload for updating an existing obra.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObraUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residente: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monto_contratado: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_fin_programada: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plazo_ejecucion: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<ObraEstado>,
}

impl Resource for Obra {
    const PATH: &'static str = "obras";
    type Create = ObraCreate;
    type Update = ObraUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
