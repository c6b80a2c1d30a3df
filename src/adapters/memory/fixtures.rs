//! Seed data for the in-memory adapter's `with_data` mode.
//!
//! Ids are stable (`obra-227`, `prov-cemex`, ...) so tests and demos can refer to them.

use crate::model::*;
use chrono::{DateTime, NaiveDate, Utc};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    date(y, m, d)
        .and_hms_opt(9, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn obra(
    id: &str,
    codigo: &str,
    nombre: &str,
    cliente: &str,
    residente: &str,
    monto_contratado: f64,
    inicio: NaiveDate,
    fin: NaiveDate,
    estado: ObraEstado,
) -> Obra {
    let created = inicio.and_hms_opt(8, 0, 0).map(|dt| dt.and_utc()).unwrap_or_default();
    Obra {
        id: id.to_string(),
        codigo: codigo.to_string(),
        nombre: nombre.to_string(),
        numero_contrato: format!("CONT-{codigo}"),
        cliente: cliente.to_string(),
        residente: residente.to_string(),
        direccion: None,
        monto_contratado,
        anticipo_porcentaje: 30.0,
        retencion_porcentaje: 5.0,
        fecha_inicio: inicio,
        fecha_fin_programada: fin,
        plazo_ejecucion: u32::try_from((fin - inicio).num_days()).unwrap_or(0),
        estado,
        created_at: created,
        updated_at: created,
    }
}

pub fn obras() -> Vec<Obra> {
    vec![
        obra(
            "obra-227",
            "227",
            "Torre Residencial Los Pinos",
            "Inmobiliaria del Bajío",
            "Ing. Laura Méndez",
            12_500_000.0,
            date(2024, 1, 15),
            date(2025, 3, 31),
            ObraEstado::Activa,
        ),
        obra(
            "obra-301",
            "301",
            "Nave Industrial Parque Norte",
            "Logística Norte SA de CV",
            "Arq. Ricardo Salas",
            8_200_000.0,
            date(2024, 4, 1),
            date(2024, 12, 20),
            ObraEstado::Activa,
        ),
        obra(
            "obra-415",
            "415",
            "Pavimentación Av. Juárez",
            "Municipio de Celaya",
            "Ing. Tomás Rivera",
            3_750_000.0,
            date(2023, 6, 1),
            date(2023, 11, 30),
            ObraEstado::Terminada,
        ),
    ]
}

fn proveedor(id: &str, razon_social: &str, rfc: &str, tipo: TipoProveedor, activo: bool) -> Proveedor {
    Proveedor {
        id: id.to_string(),
        razon_social: razon_social.to_string(),
        nombre_comercial: None,
        rfc: rfc.to_string(),
        telefono: None,
        email: None,
        contacto_principal: None,
        banco: None,
        clabe: None,
        tipo_proveedor: Some(tipo),
        credito_dias: 30,
        limite_credito: 500_000.0,
        activo,
        created_at: at(2023, 1, 10),
        updated_at: at(2023, 1, 10),
    }
}

pub fn proveedores() -> Vec<Proveedor> {
    vec![
        proveedor("prov-cemex", "Cementos del Centro SA de CV", "CCE010101AB1", TipoProveedor::Material, true),
        proveedor("prov-aceros", "Aceros y Varillas del Bajío", "AVB020202CD2", TipoProveedor::Material, true),
        proveedor("prov-renta", "Maquinaria y Renta Express", "MRE030303EF3", TipoProveedor::Renta, true),
        proveedor("prov-fletes", "Fletes Rápidos Guanajuato", "FRG040404GH4", TipoProveedor::Servicio, false),
    ]
}

fn line(cantidad: f64, unidad: &str, descripcion: &str) -> RequisicionItem {
    RequisicionItem {
        cantidad,
        unidad: unidad.to_string(),
        descripcion: descripcion.to_string(),
    }
}

pub fn requisiciones() -> Vec<Requisicion> {
    vec![
        Requisicion {
            id: "req-001".to_string(),
            numero_requisicion: "REQ-0001".to_string(),
            obra_id: "obra-227".to_string(),
            solicitado_por: "Ing. Laura Méndez".to_string(),
            fecha_solicitud: date(2024, 2, 5),
            urgencia: Urgencia::Urgente,
            estado: RequisicionEstado::Aprobada,
            observaciones: None,
            aprobado_por: Some("Compras".to_string()),
            motivo_rechazo: None,
            items: vec![line(40.0, "ton", "Cemento gris CPC 30R"), line(12.0, "ton", "Varilla 3/8\"")],
            created_at: at(2024, 2, 5),
            updated_at: at(2024, 2, 6),
        },
        Requisicion {
            id: "req-002".to_string(),
            numero_requisicion: "REQ-0002".to_string(),
            obra_id: "obra-301".to_string(),
            solicitado_por: "Arq. Ricardo Salas".to_string(),
            fecha_solicitud: date(2024, 4, 18),
            urgencia: Urgencia::Normal,
            estado: RequisicionEstado::Pendiente,
            observaciones: Some("Entregar en bodega".to_string()),
            aprobado_por: None,
            motivo_rechazo: None,
            items: vec![line(2.0, "mes", "Renta de retroexcavadora")],
            created_at: at(2024, 4, 18),
            updated_at: at(2024, 4, 18),
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn orden(
    id: &str,
    numero: &str,
    obra_id: &str,
    proveedor_id: &str,
    requisicion_id: Option<&str>,
    emision: NaiveDate,
    estado: OrdenCompraEstado,
    items: Vec<OrdenCompraItemInput>,
) -> OrdenCompra {
    let items: Vec<OrdenCompraItem> = items.into_iter().map(Into::into).collect();
    let totales = Totales::compute(&items, true, 0.0);
    let created = emision.and_hms_opt(10, 0, 0).map(|dt| dt.and_utc()).unwrap_or_default();
    OrdenCompra {
        id: id.to_string(),
        numero_orden: numero.to_string(),
        obra_id: obra_id.to_string(),
        proveedor_id: proveedor_id.to_string(),
        requisicion_id: requisicion_id.map(str::to_string),
        fecha_emision: emision,
        fecha_entrega: emision + chrono::Days::new(7),
        estado,
        has_iva: true,
        subtotal: totales.subtotal,
        descuento: 0.0,
        descuento_monto: totales.descuento_monto,
        iva: totales.iva,
        total: totales.total,
        observaciones: None,
        items,
        created_at: created,
        updated_at: created,
    }
}

fn priced(cantidad: f64, unidad: &str, descripcion: &str, precio_unitario: f64) -> OrdenCompraItemInput {
    OrdenCompraItemInput {
        cantidad,
        unidad: unidad.to_string(),
        descripcion: descripcion.to_string(),
        precio_unitario,
    }
}

/// Totals (IVA included): `oc-001` 464,000; `oc-002` 334,080; `oc-003` 116,000 (cancelled);
/// `oc-004` 185,600.
pub fn ordenes_compra() -> Vec<OrdenCompra> {
    vec![
        orden(
            "oc-001",
            "OC-0001",
            "obra-227",
            "prov-cemex",
            Some("req-001"),
            date(2024, 2, 7),
            OrdenCompraEstado::Pagada,
            vec![priced(40.0, "ton", "Cemento gris CPC 30R", 10_000.0)],
        ),
        orden(
            "oc-002",
            "OC-0002",
            "obra-227",
            "prov-aceros",
            Some("req-001"),
            date(2024, 2, 8),
            OrdenCompraEstado::Recibida,
            vec![priced(12.0, "ton", "Varilla 3/8\"", 24_000.0)],
        ),
        orden(
            "oc-003",
            "OC-0003",
            "obra-227",
            "prov-renta",
            None,
            date(2024, 3, 1),
            OrdenCompraEstado::Cancelada,
            vec![priced(1.0, "mes", "Renta de grúa torre", 100_000.0)],
        ),
        orden(
            "oc-004",
            "OC-0004",
            "obra-301",
            "prov-renta",
            Some("req-002"),
            date(2024, 4, 20),
            OrdenCompraEstado::Emitida,
            vec![priced(2.0, "mes", "Renta de retroexcavadora", 80_000.0)],
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn pago(
    id: &str,
    numero: &str,
    obra_id: &str,
    proveedor_id: &str,
    orden_compra_id: &str,
    monto: f64,
    programado: NaiveDate,
    estado: PagoEstado,
) -> Pago {
    let created = programado.and_hms_opt(12, 0, 0).map(|dt| dt.and_utc()).unwrap_or_default();
    Pago {
        id: id.to_string(),
        numero_pago: numero.to_string(),
        obra_id: obra_id.to_string(),
        proveedor_id: proveedor_id.to_string(),
        orden_compra_id: orden_compra_id.to_string(),
        monto,
        metodo_pago: MetodoPago::Transferencia,
        fecha_programada: programado,
        fecha_procesado: (estado == PagoEstado::Completado).then_some(programado),
        estado,
        referencia: None,
        folio_factura: None,
        observaciones: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn pagos() -> Vec<Pago> {
    vec![
        pago("pago-001", "PAG-0001", "obra-227", "prov-cemex", "oc-001", 464_000.0, date(2024, 3, 8), PagoEstado::Completado),
        pago("pago-002", "PAG-0002", "obra-227", "prov-aceros", "oc-002", 150_000.0, date(2024, 3, 15), PagoEstado::Completado),
        pago("pago-003", "PAG-0003", "obra-227", "prov-aceros", "oc-002", 184_080.0, date(2024, 4, 15), PagoEstado::Programado),
    ]
}

#[allow(clippy::too_many_arguments)]
fn destajo(
    id: &str,
    obra_id: &str,
    destajista: &str,
    concepto: &str,
    semana: &str,
    cantidad: f64,
    unidad: &str,
    precio_unitario: f64,
    estado: DestajoEstado,
) -> Destajo {
    Destajo {
        id: id.to_string(),
        obra_id: obra_id.to_string(),
        destajista: destajista.to_string(),
        concepto: concepto.to_string(),
        categoria: Some("Albañilería".to_string()),
        semana: semana.to_string(),
        cantidad,
        unidad: Some(unidad.to_string()),
        precio_unitario,
        total: cantidad * precio_unitario,
        estado,
        fecha_pago: None,
        observaciones: None,
        created_at: at(2024, 2, 19),
        updated_at: at(2024, 2, 19),
    }
}

pub fn destajos() -> Vec<Destajo> {
    vec![
        destajo("dest-001", "obra-227", "Cuadrilla Hernández", "Muro de block 15cm", "2024-S07", 120.0, "m2", 185.0, DestajoEstado::Completado),
        destajo("dest-002", "obra-227", "Cuadrilla Hernández", "Aplanado fino", "2024-S08", 95.5, "m2", 140.0, DestajoEstado::EnProceso),
        destajo("dest-003", "obra-301", "Cuadrilla Ortiz", "Firme de concreto", "2024-S17", 300.0, "m2", 95.0, DestajoEstado::Pendiente),
    ]
}

fn movimiento(
    id: &str,
    fecha: NaiveDate,
    descripcion: &str,
    monto: f64,
    referencia: &str,
    orden_compra_id: Option<&str>,
) -> BankTransaction {
    let created = fecha.and_hms_opt(18, 0, 0).map(|dt| dt.and_utc()).unwrap_or_default();
    BankTransaction {
        id: id.to_string(),
        fecha,
        descripcion_banco: descripcion.to_string(),
        descripcion_banco_normalizada: Some(normalize_description(descripcion)),
        monto,
        referencia_bancaria: Some(referencia.to_string()),
        origen: OrigenTransaccion::Csv,
        match_confidence: if orden_compra_id.is_some() { 95 } else { 0 },
        match_manual: false,
        orden_compra_id: orden_compra_id.map(str::to_string),
        matched: orden_compra_id.is_some(),
        created_at: created,
        updated_at: created,
    }
}

/// `bt-001` is already matched to `oc-001`; the other two are pending reconciliation.
pub fn bank_transactions() -> Vec<BankTransaction> {
    vec![
        movimiento("bt-001", date(2024, 3, 8), "SPEI CEMENTOS DEL CENTRO PAG-0001", 464_000.0, "0308001", Some("oc-001")),
        movimiento("bt-002", date(2024, 3, 15), "SPEI ACEROS Y VARILLAS  PAG-0002", 150_000.0, "0315002", None),
        movimiento("bt-003", date(2024, 3, 20), "CARGO COMISION POR TRANSFERENCIA", 58.0, "0320003", None),
    ]
}
