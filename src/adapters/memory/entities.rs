//! Store hooks for every entity: record construction, shape validation and the cross-entity
//! preconditions checked against the other stores.

use crate::framework::{Resource, StoreClient, StoreEntity};
use crate::model::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Human-facing document number, e.g. `OC-1A2B3C4D`.
fn folio(prefix: &str, id: &str) -> String {
    let short: String = id.chars().filter(|c| *c != '-').take(8).collect();
    format!("{prefix}-{}", short.to_uppercase())
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

// --- Obra ---

#[async_trait]
impl StoreEntity for Obra {
    type Context = ();

    fn from_create(id: String, now: DateTime<Utc>, params: ObraCreate) -> Result<Self, String> {
        require_text("codigo", &params.codigo)?;
        require_text("nombre", &params.nombre)?;
        if params.monto_contratado < 0.0 {
            return Err("monto_contratado must not be negative".to_string());
        }
        if params.fecha_fin_programada < params.fecha_inicio {
            return Err("fecha_fin_programada must not precede fecha_inicio".to_string());
        }
        Ok(Self {
            id,
            codigo: params.codigo,
            nombre: params.nombre,
            numero_contrato: params.numero_contrato,
            cliente: params.cliente,
            residente: params.residente,
            direccion: params.direccion,
            monto_contratado: params.monto_contratado,
            anticipo_porcentaje: params.anticipo_porcentaje,
            retencion_porcentaje: params.retencion_porcentaje,
            fecha_inicio: params.fecha_inicio,
            fecha_fin_programada: params.fecha_fin_programada,
            plazo_ejecucion: params.plazo_ejecucion,
            estado: params.estado,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(&mut self, update: ObraUpdate, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(nombre) = update.nombre {
            require_text("nombre", &nombre)?;
            self.nombre = nombre;
        }
        if let Some(monto) = update.monto_contratado {
            if monto < 0.0 {
                return Err("monto_contratado must not be negative".to_string());
            }
            self.monto_contratado = monto;
        }
        if let Some(cliente) = update.cliente {
            self.cliente = cliente;
        }
        if let Some(residente) = update.residente {
            self.residente = residente;
        }
        if update.direccion.is_some() {
            self.direccion = update.direccion;
        }
        if let Some(fecha) = update.fecha_fin_programada {
            self.fecha_fin_programada = fecha;
        }
        if let Some(plazo) = update.plazo_ejecucion {
            self.plazo_ejecucion = plazo;
        }
        if let Some(estado) = update.estado {
            self.estado = estado;
        }
        self.updated_at = now;
        Ok(())
    }
}

// --- Proveedor ---

#[async_trait]
impl StoreEntity for Proveedor {
    type Context = ();

    fn from_create(id: String, now: DateTime<Utc>, params: ProveedorCreate) -> Result<Self, String> {
        require_text("razon_social", &params.razon_social)?;
        require_text("rfc", &params.rfc)?;
        Ok(Self {
            id,
            razon_social: params.razon_social,
            nombre_comercial: params.nombre_comercial,
            rfc: params.rfc.to_uppercase(),
            telefono: params.telefono,
            email: params.email,
            contacto_principal: params.contacto_principal,
            banco: params.banco,
            clabe: params.clabe,
            tipo_proveedor: params.tipo_proveedor,
            credito_dias: params.credito_dias,
            limite_credito: params.limite_credito,
            activo: true,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(&mut self, update: ProveedorUpdate, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(razon_social) = update.razon_social {
            require_text("razon_social", &razon_social)?;
            self.razon_social = razon_social;
        }
        if update.nombre_comercial.is_some() {
            self.nombre_comercial = update.nombre_comercial;
        }
        if update.telefono.is_some() {
            self.telefono = update.telefono;
        }
        if update.email.is_some() {
            self.email = update.email;
        }
        if update.contacto_principal.is_some() {
            self.contacto_principal = update.contacto_principal;
        }
        if update.tipo_proveedor.is_some() {
            self.tipo_proveedor = update.tipo_proveedor;
        }
        if let Some(dias) = update.credito_dias {
            self.credito_dias = dias;
        }
        if let Some(limite) = update.limite_credito {
            self.limite_credito = limite;
        }
        if let Some(activo) = update.activo {
            self.activo = activo;
        }
        self.updated_at = now;
        Ok(())
    }
}

// --- Requisicion ---

#[async_trait]
impl StoreEntity for Requisicion {
    type Context = StoreClient<Obra>;

    fn from_create(id: String, now: DateTime<Utc>, params: RequisicionCreate) -> Result<Self, String> {
        if params.items.is_empty() {
            return Err("a requisicion needs at least one item".to_string());
        }
        if params.items.iter().any(|item| item.cantidad <= 0.0) {
            return Err("item cantidad must be greater than 0".to_string());
        }
        Ok(Self {
            numero_requisicion: folio("REQ", &id),
            id,
            obra_id: params.obra_id,
            solicitado_por: params.solicitado_por,
            fecha_solicitud: now.date_naive(),
            urgencia: params.urgencia,
            estado: RequisicionEstado::Pendiente,
            observaciones: params.observaciones,
            aprobado_por: None,
            motivo_rechazo: None,
            items: params.items,
            created_at: now,
            updated_at: now,
        })
    }

    async fn on_create(&mut self, obras: &StoreClient<Obra>) -> Result<(), String> {
        obras.require(&self.obra_id).await.map(|_| ())
    }

    fn apply_update(&mut self, update: RequisicionUpdate, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(urgencia) = update.urgencia {
            self.urgencia = urgencia;
        }
        if let Some(estado) = update.estado {
            self.estado = estado;
        }
        if update.observaciones.is_some() {
            self.observaciones = update.observaciones;
        }
        if update.aprobado_por.is_some() {
            self.aprobado_por = update.aprobado_por;
        }
        if update.motivo_rechazo.is_some() {
            self.motivo_rechazo = update.motivo_rechazo;
        }
        self.updated_at = now;
        Ok(())
    }
}

// --- OrdenCompra ---

/// Stores a purchase order is validated against.
#[derive(Debug, Clone)]
pub struct OrdenCompraDeps {
    pub obras: StoreClient<Obra>,
    pub proveedores: StoreClient<Proveedor>,
}

#[async_trait]
impl StoreEntity for OrdenCompra {
    type Context = OrdenCompraDeps;

    fn from_create(id: String, now: DateTime<Utc>, params: OrdenCompraCreate) -> Result<Self, String> {
        if params.items.is_empty() {
            return Err("an orden de compra needs at least one item".to_string());
        }
        if params
            .items
            .iter()
            .any(|item| item.cantidad <= 0.0 || item.precio_unitario < 0.0)
        {
            return Err("item cantidad must be greater than 0 and precio_unitario not negative".to_string());
        }
        if !(0.0..=100.0).contains(&params.descuento) {
            return Err("descuento must be between 0 and 100".to_string());
        }
        let items: Vec<OrdenCompraItem> = params.items.into_iter().map(Into::into).collect();
        let totales = Totales::compute(&items, params.has_iva, params.descuento);
        Ok(Self {
            numero_orden: folio("OC", &id),
            id,
            obra_id: params.obra_id,
            proveedor_id: params.proveedor_id,
            requisicion_id: params.requisicion_id,
            fecha_emision: now.date_naive(),
            fecha_entrega: params.fecha_entrega,
            estado: OrdenCompraEstado::Borrador,
            has_iva: params.has_iva,
            subtotal: totales.subtotal,
            descuento: params.descuento,
            descuento_monto: totales.descuento_monto,
            iva: totales.iva,
            total: totales.total,
            observaciones: params.observaciones,
            items,
            created_at: now,
            updated_at: now,
        })
    }

    async fn on_create(&mut self, deps: &OrdenCompraDeps) -> Result<(), String> {
        deps.obras.require(&self.obra_id).await?;
        deps.proveedores.require(&self.proveedor_id).await?;
        Ok(())
    }

    fn apply_update(&mut self, update: OrdenCompraUpdate, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(estado) = update.estado {
            if self.estado == OrdenCompraEstado::Cancelada && estado != OrdenCompraEstado::Cancelada {
                return Err(format!("{} {} is cancelled", Self::PATH, self.id));
            }
            self.estado = estado;
        }
        if let Some(fecha) = update.fecha_entrega {
            self.fecha_entrega = fecha;
        }
        if update.observaciones.is_some() {
            self.observaciones = update.observaciones;
        }
        self.updated_at = now;
        Ok(())
    }
}

// --- Pago ---

#[async_trait]
impl StoreEntity for Pago {
    type Context = StoreClient<OrdenCompra>;

    fn from_create(id: String, now: DateTime<Utc>, params: PagoCreate) -> Result<Self, String> {
        if params.monto <= 0.0 {
            return Err("monto must be greater than 0".to_string());
        }
        Ok(Self {
            numero_pago: folio("PAG", &id),
            id,
            obra_id: params.obra_id,
            proveedor_id: params.proveedor_id,
            orden_compra_id: params.orden_compra_id,
            monto: params.monto,
            metodo_pago: params.metodo_pago,
            fecha_programada: params.fecha_programada,
            fecha_procesado: None,
            estado: PagoEstado::Programado,
            referencia: params.referencia,
            folio_factura: params.folio_factura,
            observaciones: params.observaciones,
            created_at: now,
            updated_at: now,
        })
    }

    async fn on_create(&mut self, ordenes: &StoreClient<OrdenCompra>) -> Result<(), String> {
        ordenes.require(&self.orden_compra_id).await.map(|_| ())
    }

    fn apply_update(&mut self, update: PagoUpdate, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(monto) = update.monto {
            if monto <= 0.0 {
                return Err("monto must be greater than 0".to_string());
            }
            self.monto = monto;
        }
        if let Some(metodo) = update.metodo_pago {
            self.metodo_pago = metodo;
        }
        if let Some(fecha) = update.fecha_programada {
            self.fecha_programada = fecha;
        }
        if update.fecha_procesado.is_some() {
            self.fecha_procesado = update.fecha_procesado;
        }
        if update.referencia.is_some() {
            self.referencia = update.referencia;
        }
        if update.observaciones.is_some() {
            self.observaciones = update.observaciones;
        }
        if let Some(estado) = update.estado {
            if estado == PagoEstado::Completado && self.fecha_procesado.is_none() {
                self.fecha_procesado = Some(now.date_naive());
            }
            self.estado = estado;
        }
        self.updated_at = now;
        Ok(())
    }
}

// --- Destajo ---

#[async_trait]
impl StoreEntity for Destajo {
    type Context = StoreClient<Obra>;

    fn from_create(id: String, now: DateTime<Utc>, params: DestajoCreate) -> Result<Self, String> {
        require_text("destajista", &params.destajista)?;
        if params.cantidad < 0.0 {
            return Err("cantidad must not be negative".to_string());
        }
        if params.precio_unitario < 0.0 {
            return Err("precio_unitario must not be negative".to_string());
        }
        let total = params
            .total
            .unwrap_or(params.cantidad * params.precio_unitario);
        if total < 0.0 {
            return Err("total must not be negative".to_string());
        }
        Ok(Self {
            id,
            obra_id: params.obra_id,
            destajista: params.destajista,
            concepto: params.concepto,
            categoria: params.categoria,
            semana: params.semana,
            cantidad: params.cantidad,
            unidad: params.unidad,
            precio_unitario: params.precio_unitario,
            total,
            estado: DestajoEstado::Pendiente,
            fecha_pago: None,
            observaciones: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn on_create(&mut self, obras: &StoreClient<Obra>) -> Result<(), String> {
        obras.require(&self.obra_id).await.map(|_| ())
    }

    fn apply_update(&mut self, update: DestajoUpdate, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(estado) = update.estado {
            self.estado = estado;
        }
        if update.fecha_pago.is_some() {
            self.fecha_pago = update.fecha_pago;
        }
        if update.observaciones.is_some() {
            self.observaciones = update.observaciones;
        }
        self.updated_at = now;
        Ok(())
    }
}

// --- BankTransaction ---

#[async_trait]
impl StoreEntity for BankTransaction {
    type Context = StoreClient<OrdenCompra>;

    fn from_create(id: String, now: DateTime<Utc>, params: BankTransactionCreate) -> Result<Self, String> {
        require_text("descripcion_banco", &params.descripcion_banco)?;
        if params.match_confidence > 100 {
            return Err("match_confidence must be between 0 and 100".to_string());
        }
        if params.matched && params.orden_compra_id.is_none() {
            return Err("a matched transaction needs an orden_compra_id".to_string());
        }
        Ok(Self {
            id,
            fecha: params.fecha,
            descripcion_banco_normalizada: Some(normalize_description(&params.descripcion_banco)),
            descripcion_banco: params.descripcion_banco,
            monto: params.monto,
            referencia_bancaria: params.referencia_bancaria,
            origen: params.origen,
            match_confidence: params.match_confidence,
            match_manual: params.match_manual,
            orden_compra_id: params.orden_compra_id,
            matched: params.matched,
            created_at: now,
            updated_at: now,
        })
    }

    async fn on_create(&mut self, ordenes: &StoreClient<OrdenCompra>) -> Result<(), String> {
        match &self.orden_compra_id {
            Some(id) => ordenes.require(id).await.map(|_| ()),
            None => Ok(()),
        }
    }

    /// Matching. The orden de compra must be checked by the caller, this hook has no store access.
    fn apply_update(&mut self, update: BankTransactionMatch, now: DateTime<Utc>) -> Result<(), String> {
        require_text("orden_compra_id", &update.orden_compra_id)?;
        if update.match_confidence > 100 {
            return Err("match_confidence must be between 0 and 100".to_string());
        }
        self.orden_compra_id = Some(update.orden_compra_id);
        self.match_confidence = update.match_confidence;
        self.match_manual = update.match_manual;
        self.matched = true;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folio_uses_uuid_prefix() {
        assert_eq!(folio("OC", "1a2b3c4d-5e6f-0000-0000-000000000000"), "OC-1A2B3C4D");
    }

    #[test]
    fn test_destajo_total_defaults_to_quantity_times_price() {
        let destajo = Destajo::from_create(
            "d1".into(),
            Utc::now(),
            DestajoCreate {
                obra_id: "obra-227".into(),
                destajista: "Cuadrilla Hernández".into(),
                concepto: "Muro de block".into(),
                categoria: None,
                semana: "2024-S07".into(),
                cantidad: 12.5,
                unidad: Some("m2".into()),
                precio_unitario: 180.0,
                total: None,
            },
        )
        .unwrap();
        assert_eq!(destajo.total, 2250.0);
        assert_eq!(destajo.estado, DestajoEstado::Pendiente);
    }

    #[test]
    fn test_cancelled_orden_cannot_be_reopened() {
        let mut oc = OrdenCompra::from_create(
            "oc1".into(),
            Utc::now(),
            OrdenCompraCreate {
                obra_id: "obra-227".into(),
                proveedor_id: "prov-cemex".into(),
                requisicion_id: None,
                fecha_entrega: Utc::now().date_naive(),
                has_iva: true,
                descuento: 0.0,
                observaciones: None,
                items: vec![OrdenCompraItemInput {
                    cantidad: 10.0,
                    unidad: "ton".into(),
                    descripcion: "Cemento gris".into(),
                    precio_unitario: 100.0,
                }],
            },
        )
        .unwrap();
        assert!((oc.total - 1160.0).abs() < 1e-9);

        let cancel = OrdenCompraUpdate {
            estado: Some(OrdenCompraEstado::Cancelada),
            ..Default::default()
        };
        oc.apply_update(cancel, Utc::now()).unwrap();
        let reopen = OrdenCompraUpdate {
            estado: Some(OrdenCompraEstado::Emitida),
            ..Default::default()
        };
        assert!(oc.apply_update(reopen, Utc::now()).is_err());
    }

    #[test]
    fn test_bank_transaction_is_normalized_and_matchable() {
        let mut tx = BankTransaction::from_create(
            "bt1".into(),
            Utc::now(),
            BankTransactionCreate::new(Utc::now().date_naive(), "  SPEI  ACEROS del Bajio ", 150_000.0),
        )
        .unwrap();
        assert_eq!(tx.descripcion_banco_normalizada.as_deref(), Some("spei aceros del bajio"));
        assert!(!tx.matched);

        tx.apply_update(BankTransactionMatch::manual("oc-002"), Utc::now()).unwrap();
        assert!(tx.matched);
        assert!(tx.match_manual);
        assert_eq!(tx.orden_compra_id.as_deref(), Some("oc-002"));

        let too_confident = BankTransactionMatch {
            match_confidence: 120,
            ..BankTransactionMatch::manual("oc-001")
        };
        assert!(tx.apply_update(too_confident, Utc::now()).is_err());
    }
}
