use std::time::Duration;

use httpmock::prelude::*;
use rustls::crypto::{CryptoProvider, ring};
use serde_json::json;

use iexcloud_exporter::error::UpstreamError;
use iexcloud_exporter::iex::{IexClient, MarketData, RangeCode};

const TOKEN: &str = "Tsk_test";

fn client(server: &MockServer) -> IexClient {
    // a second install in the same process is refused; that is fine
    let _ = CryptoProvider::install_default(ring::default_provider());

    IexClient::new(&server.url("/stable"), "ignored", TOKEN, Duration::from_secs(5))
        .expect("client")
}

#[tokio::test]
async fn price_hits_the_price_path_with_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/stable/stock/AAPL/price")
                .query_param("token", TOKEN);
            then.status(200).body("187.5");
        })
        .await;

    let price = client(&server).price("AAPL").await.unwrap();

    mock.assert_async().await;
    assert_eq!(price, 187.5);
}

#[tokio::test]
async fn dividends_decode_rows_and_null_dates() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/stable/stock/MSFT/dividends/5y")
                .query_param("token", TOKEN);
            then.status(200).json_body(json!([
                {
                    "exDate": "2019-08-14",
                    "paymentDate": "2019-09-12",
                    "recordDate": "2019-08-15",
                    "declaredDate": "2019-06-12",
                    "amount": 0.46,
                    "flag": "Cash"
                },
                {
                    "exDate": "2019-05-15",
                    "paymentDate": null,
                    "recordDate": "",
                    "declaredDate": "2019-03-12",
                    "amount": "0.46"
                }
            ]));
        })
        .await;

    let rows = client(&server)
        .dividends("MSFT", RangeCode::FiveYears)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].amount, "0.46");
    assert_eq!(rows[0].ex_date.unwrap().to_string(), "2019-08-14");
    assert_eq!(rows[1].amount, "0.46");
    assert!(rows[1].payment_date.is_none());
    assert!(rows[1].record_date.is_none());
}

#[tokio::test]
async fn stats_treat_null_numbers_as_zero() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/stable/stock/AAPL/stats")
                .query_param("token", TOKEN);
            then.status(200).json_body(json!({
                "companyName": "Apple Inc.",
                "marketcap": 990_000_000_000.0_f64,
                "peRatio": null,
                "employees": 132000,
                "ttmEPS": 11.89,
                "nextDividendDate": "1929-10-24",
                "exDividendDate": "2019-08-09",
                "nextEarningsDate": null
            }));
        })
        .await;

    let stats = client(&server).key_stats("AAPL").await.unwrap();

    assert_eq!(stats.market_cap, 990_000_000_000.0);
    assert_eq!(stats.pe_ratio, 0.0);
    assert_eq!(stats.employees, 132_000.0);
    assert_eq!(stats.ttm_eps, 11.89);
    assert_eq!(stats.beta, 0.0);
    assert_eq!(stats.next_dividend_date.unwrap().to_string(), "1929-10-24");
    assert!(stats.next_earnings_date.is_none());
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/stable/stock/NOPE/price");
            then.status(404).body("Unknown symbol");
        })
        .await;

    let err = client(&server).price("NOPE").await.unwrap_err();

    match err {
        UpstreamError::Status { status, url } => {
            assert_eq!(status, 404);
            assert_eq!(url, "/stable/stock/NOPE/price");
            assert!(!url.contains(TOKEN));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/stable/stock/AAPL/price");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let err = client(&server).price("AAPL").await.unwrap_err();

    assert!(matches!(err, UpstreamError::Decode(_)));
}

#[test]
fn host_endpoint_gets_scheme_and_version() {
    let _ = CryptoProvider::install_default(ring::default_provider());

    let client = IexClient::new(
        "sandbox.iexapis.com",
        "stable",
        TOKEN,
        Duration::from_secs(5),
    )
    .unwrap();

    assert_eq!(client.base().as_str(), "https://sandbox.iexapis.com/stable/");
}
