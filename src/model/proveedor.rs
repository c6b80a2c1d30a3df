use crate::framework::Resource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoProveedor {
    Material,
    Servicio,
    Renta,
    Mixto,
}

/// A supplier. Inactive suppliers stay listed but are filtered out of purchase-order forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proveedor {
    pub id: String,
    pub razon_social: String,
    #[serde(default)]
    pub nombre_comercial: Option<String>,
    pub rfc: String,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contacto_principal: Option<String>,
    #[serde(default)]
    pub banco: Option<String>,
    #[serde(default)]
    pub clabe: Option<String>,
    #[serde(default)]
    pub tipo_proveedor: Option<TipoProveedor>,
    #[serde(default)]
    pub credito_dias: u32,
    #[serde(default)]
    pub limite_credito: f64,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProveedorCreate {
    pub razon_social: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre_comercial: Option<String>,
    pub rfc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacto_principal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banco: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clabe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_proveedor: Option<TipoProveedor>,
    #[serde(default)]
    pub credito_dias: u32,
    #[serde(default)]
    pub limite_credito: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProveedorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razon_social: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre_comercial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacto_principal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_proveedor: Option<TipoProveedor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credito_dias: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limite_credito: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

impl Resource for Proveedor {
    const PATH: &'static str = "proveedores";
    type Create = ProveedorCreate;
    type Update = ProveedorUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
