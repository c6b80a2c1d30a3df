mod common;

use common::mock_backend::{MockBackend, MockResponse};
use obra_data::adapters::{fixtures, ApiClient, HttpBankTransactions, HttpMetrics, HttpProvider};
use obra_data::framework::{
    BankTransactionProvider, ListParams, MetricsProvider, Page, ProviderError, ResourceProvider, SortOrder,
};
use obra_data::hooks::ViewState;
use obra_data::lifecycle::ErpSystem;
use chrono::NaiveDate;
use obra_data::model::{
    BankTransactionCreate, BankTransactionMatch, Obra, OrdenCompra, Pago, PagoCreate, MetodoPago, Proveedor,
    ProveedorUpdate,
};
use std::time::Duration;

fn api(backend: &MockBackend) -> ApiClient {
    ApiClient::new(&backend.api_url(), Duration::from_secs(2)).expect("valid base url")
}

#[tokio::test]
async fn test_list_sends_query_string_and_accepts_camel_case_pages() {
    let backend = MockBackend::start().await;
    let obras = fixtures::obras();
    backend
        .enqueue(MockResponse::json_value(&serde_json::json!({
            "data": obras,
            "total": 23,
            "page": 2,
            "pageSize": 10,
        })))
        .await;

    let provider = HttpProvider::<Obra>::new(api(&backend));
    let params = ListParams::new()
        .page(2)
        .page_size(10)
        .sort_by("fechaInicio", SortOrder::Desc)
        .filter("estado", "activa")
        .filter("residente", None::<String>);
    let page = provider.list(&params).await.expect("list failed");

    assert_eq!(page.data, obras);
    assert_eq!(page.page_size, 10);
    assert_eq!(page.total_pages, 3, "total_pages derived when absent");

    let requests = backend.captured_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/v1/obras");
    assert_eq!(
        requests[0].query.as_deref(),
        Some("page=2&page_size=10&sort_by=fecha_inicio&sort_order=desc&estado=activa")
    );
}

#[tokio::test]
async fn test_crud_requests_hit_the_right_routes() {
    let backend = MockBackend::start().await;
    let pago = fixtures::pagos()[0].clone();
    let proveedor = fixtures::proveedores()[0].clone();

    backend.enqueue(MockResponse::json_value(&pago)).await;
    backend.enqueue(MockResponse::json_value(&proveedor)).await;
    backend.enqueue(MockResponse::json_value(&proveedor)).await;
    backend.enqueue(MockResponse::no_content()).await;

    let pagos = HttpProvider::<Pago>::new(api(&backend));
    let proveedores = HttpProvider::<Proveedor>::new(api(&backend));

    let created = pagos
        .create(PagoCreate {
            obra_id: "obra-227".into(),
            proveedor_id: "prov-cemex".into(),
            orden_compra_id: "oc-001".into(),
            monto: 464_000.0,
            metodo_pago: MetodoPago::Transferencia,
            fecha_programada: pago.fecha_programada,
            referencia: None,
            folio_factura: None,
            observaciones: None,
        })
        .await
        .expect("create failed");
    assert_eq!(created, pago);

    proveedores.get("prov-cemex").await.expect("get failed");
    proveedores
        .update(
            "prov-cemex",
            ProveedorUpdate {
                activo: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("update failed");
    proveedores.delete("prov-cemex").await.expect("204 is a successful delete");

    let requests = backend.captured_requests().await;
    let routes: Vec<_> = requests
        .iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect();
    assert_eq!(
        routes,
        vec![
            "POST /api/v1/pagos",
            "GET /api/v1/proveedores/prov-cemex",
            "PUT /api/v1/proveedores/prov-cemex",
            "DELETE /api/v1/proveedores/prov-cemex",
        ]
    );

    let body = requests[0].json();
    assert_eq!(body["orden_compra_id"], "oc-001");
    assert_eq!(body["metodo_pago"], "transferencia");
    assert!(body.get("referencia").is_none(), "unset optionals are not sent");

    // Only the changed field goes over the wire.
    assert_eq!(requests[2].json(), serde_json::json!({ "activo": false }));
}

#[tokio::test]
async fn test_error_bodies_become_messages() {
    let backend = MockBackend::start().await;
    backend
        .enqueue(MockResponse::error(
            422,
            r#"{"detail":[{"loc":["body","items"],"msg":"ensure this value has at least 1 items","type":"value_error"}]}"#,
        ))
        .await;
    backend
        .enqueue(MockResponse::error(404, r#"{"detail":"Orden de compra no encontrada"}"#))
        .await;
    backend.enqueue(MockResponse::text(502, "")).await;

    let provider = HttpProvider::<OrdenCompra>::new(api(&backend));

    let err = provider.get("oc-1").await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "items: ensure this value has at least 1 items");
    assert_eq!(
        err.field_errors().unwrap()["items"],
        vec!["ensure this value has at least 1 items"]
    );

    let err = provider.get("oc-2").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Orden de compra no encontrada");

    let err = provider.delete("oc-3").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
}

#[tokio::test]
async fn test_transport_and_decode_failures() {
    // A port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let dead = ApiClient::new(&format!("http://127.0.0.1:{port}/api/v1"), Duration::from_secs(1)).unwrap();
    let err = HttpProvider::<Obra>::new(dead)
        .list(&ListParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");

    let backend = MockBackend::start().await;
    backend.enqueue(MockResponse::json(r#"{"data": "not a list"}"#)).await;
    let err = HttpProvider::<Obra>::new(api(&backend))
        .list(&ListParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let backend = MockBackend::start().await;
    backend
        .enqueue(MockResponse::json(
            r#"{"obra_id":"obra-227","monto_contratado":12500000.0,"comprometido":798080.0,
                "pagado":614000.0,"saldo":184080.0,"porcentaje_ejecutado":6.38464}"#,
        ))
        .await;

    let metrics = HttpMetrics::new(api(&backend))
        .obra_metrics("obra-227")
        .await
        .expect("metrics failed");
    assert_eq!(metrics.saldo, 184_080.0);

    let requests = backend.captured_requests().await;
    assert_eq!(requests[0].path, "/api/v1/dashboard/obras/obra-227/metricas");
}

#[tokio::test]
async fn test_system_in_api_mode_renders_backend_data() {
    let backend = MockBackend::start().await;
    let proveedores = fixtures::proveedores();
    backend
        .enqueue(MockResponse::json_value(&Page::new(proveedores.clone(), 4, 1, 50)))
        .await;
    backend
        .enqueue(MockResponse::error(500, r#"{"message":"database unavailable"}"#))
        .await;

    let system = ErpSystem::start(&common::api_config(&backend.api_url())).expect("system start");
    let query = system.list::<Proveedor>(ListParams::new());

    query.activate().await;
    assert_eq!(query.state().view_state(), ViewState::Data);

    query.refetch().await;
    let state = query.state();
    assert_eq!(state.view_state(), ViewState::Error);
    assert_eq!(state.error.as_deref(), Some("database unavailable"));
    assert_eq!(state.data, proveedores, "failed refetch keeps the loaded rows");

    drop(query);
    system.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_api_mode_lists_use_configured_page_size() {
    let backend = MockBackend::start().await;
    backend
        .enqueue(MockResponse::json_value(&Page::new(fixtures::obras(), 3, 1, 25)))
        .await;
    backend
        .enqueue(MockResponse::json_value(&Page::new(fixtures::obras(), 3, 1, 10)))
        .await;

    let mut config = common::api_config(&backend.api_url());
    config.ui.default_page_size = 25;
    let system = ErpSystem::start(&config).expect("system start");

    let implicit = system.list::<Obra>(ListParams::new().filter("estado", "activa"));
    implicit.activate().await;
    let explicit = system.list::<Obra>(ListParams::new().page_size(10));
    explicit.activate().await;

    let requests = backend.captured_requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].query.as_deref(), Some("page_size=25&estado=activa"));
    assert_eq!(requests[1].query.as_deref(), Some("page_size=10"));

    drop((implicit, explicit));
    system.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_dashboard_read_model_routes() {
    let backend = MockBackend::start().await;
    backend
        .enqueue(MockResponse::json(
            r#"[{"obra_id":"obra-227","monto_contratado":12500000.0,"comprometido":798080.0,
                 "pagado":614000.0,"saldo":184080.0,"porcentaje_ejecutado":6.38464}]"#,
        ))
        .await;
    backend
        .enqueue(MockResponse::json(
            r#"{"proveedor_id":"prov-aceros","razon_social":"Aceros y Varillas del Bajío","total_ordenes":1,
                "total_comprometido":334080.0,"total_pagado":150000.0,"saldo_pendiente":184080.0}"#,
        ))
        .await;
    backend
        .enqueue(MockResponse::json(
            r#"[{"obra_id":"obra-301","nombre_obra":"Nave Industrial Parque Norte","total_requisiciones":1,
                 "pendientes":1,"en_revision":0,"urgentes":0}]"#,
        ))
        .await;
    backend
        .enqueue(MockResponse::json(
            r#"{"obras_activas":2,"total_contratado":20700000.0,"total_estimaciones":0.0,"total_gastos":0.0,
                "total_oc":983680.0,"total_pagado":614000.0,"total_pendiente":369680.0}"#,
        ))
        .await;

    let metrics = HttpMetrics::new(api(&backend));
    assert_eq!(metrics.all_obra_metrics().await.expect("all metrics").len(), 1);
    let resumen = metrics.proveedor_summary("prov-aceros").await.expect("proveedor");
    assert_eq!(resumen.saldo_pendiente, 184_080.0);
    let estado = metrics.requisiciones_status(Some("obra-301")).await.expect("requisiciones");
    assert_eq!(estado[0].pendientes, 1);
    let global = metrics.global_dashboard().await.expect("resumen");
    assert_eq!(global.total_obras_activas, 2);
    assert_eq!(global.total_por_pagar, 369_680.0);

    let requests = backend.captured_requests().await;
    let routes: Vec<(&str, Option<&str>)> = requests
        .iter()
        .map(|r| (r.path.as_str(), r.query.as_deref()))
        .collect();
    assert_eq!(
        routes,
        vec![
            ("/api/v1/dashboard/obras/metricas", None),
            ("/api/v1/dashboard/proveedores/prov-aceros/resumen", None),
            ("/api/v1/dashboard/requisiciones", Some("obra_id=obra-301")),
            ("/api/v1/dashboard/resumen", None),
        ]
    );
}

#[tokio::test]
async fn test_bank_transaction_routes() {
    let backend = MockBackend::start().await;
    let movimientos = fixtures::bank_transactions();
    backend.enqueue(MockResponse::json_value(&movimientos[1..].to_vec())).await;
    backend.enqueue(MockResponse::json_value(&movimientos[2..].to_vec())).await;
    let mut matched = movimientos[1].clone();
    matched.matched = true;
    matched.orden_compra_id = Some("oc-002".to_string());
    backend.enqueue(MockResponse::json_value(&matched)).await;
    backend
        .enqueue(MockResponse::error(404, r#"{"detail":"Transacción no encontrada"}"#))
        .await;

    let provider = HttpBankTransactions::new(api(&backend));
    let pending = provider.list(Some(false)).await.expect("list");
    assert_eq!(pending.len(), 2);

    let line = BankTransactionCreate::new(
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
        "CARGO COMISION POR TRANSFERENCIA",
        58.0,
    );
    let inserted = provider.import(vec![line]).await.expect("import");
    assert_eq!(inserted[0].id, "bt-003");

    let updated = provider
        .match_transaction("bt-002", BankTransactionMatch::manual("oc-002"))
        .await
        .expect("match");
    assert!(updated.matched);

    let err = provider
        .match_transaction("bt-404", BankTransactionMatch::manual("oc-002"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Transacción no encontrada");

    let requests = backend.captured_requests().await;
    assert_eq!(requests[0].path, "/api/v1/bank-transactions");
    assert_eq!(requests[0].query.as_deref(), Some("matched=false"));
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[1].path, "/api/v1/bank-transactions/import");
    assert_eq!(requests[1].json()[0]["descripcion_banco"], "CARGO COMISION POR TRANSFERENCIA");
    assert_eq!(requests[2].method, "PUT");
    assert_eq!(requests[2].path, "/api/v1/bank-transactions/bt-002/match");
    assert_eq!(requests[2].json()["match_manual"], true);
}
