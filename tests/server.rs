mod support;

use std::sync::Arc;

use hyper::StatusCode;

use iexcloud_exporter::exposition;
use iexcloud_exporter::server::MetricsServer;

use support::{FakeMarket, exporter};

fn server(config: &str) -> MetricsServer {
    let market = Arc::new(FakeMarket::default().with_price("AAPL", 187.5));
    MetricsServer::new(exporter(market, config), "/metrics", "Endpoint: test")
}

#[tokio::test]
async fn metrics_path_serves_text_exposition() {
    let server = server(r#"{"metrics": [{"price": {"symbols": ["AAPL"]}}]}"#);

    let reply = server.route("/metrics").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type, exposition::CONTENT_TYPE);
    let body = String::from_utf8(reply.body.to_vec()).unwrap();
    assert!(body.contains("# TYPE iexcloud_up gauge"));
    assert!(body.contains("iexcloud_up 1"));
    assert!(body.contains("iexcloud_price{symbol=\"AAPL\"} 187.5"));
    assert!(body.contains("iexcloud_build_info{"));
}

#[tokio::test]
async fn broken_config_still_answers_with_up_zero() {
    let server = server("not json");

    let reply = server.route("/metrics").await;

    assert_eq!(reply.status, StatusCode::OK);
    let body = String::from_utf8(reply.body.to_vec()).unwrap();
    assert!(body.contains("iexcloud_up 0"));
    assert!(!body.contains("iexcloud_price{"));
}

#[tokio::test]
async fn root_serves_landing_page() {
    let server = server(r#"{"metrics": []}"#);

    let reply = server.route("/").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.content_type.starts_with("text/html"));
    let body = String::from_utf8(reply.body.to_vec()).unwrap();
    assert!(body.contains("<a href='/metrics'>"));
    assert!(body.contains("Endpoint: test"));
}

#[tokio::test]
async fn other_paths_are_not_found() {
    let server = server(r#"{"metrics": []}"#);

    for path in ["/favicon.ico", "/metrics/", "/debug"] {
        assert_eq!(server.route(path).await.status, StatusCode::NOT_FOUND);
    }
}
