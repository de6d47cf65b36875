use crate::{start_mock_server, storage_options};
use iron_bank::query::AggregateKind;
use iron_bank::{FetchOutcome, TradeStorage};
use mockito::{Matcher, Mock, ServerGuard};

/// Annotated CSV as returned by `/api/v2/query`, `_value` typed as `value_type`
fn annotated_csv(value_type: &str, rows: &[(&str, &str, &str)]) -> String {
    let mut body = format!(
        "#datatype,string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,{value_type},string,string,string,string\r\n\
#group,false,false,true,true,false,false,true,true,true,true\r\n\
#default,_result,,,,,,,,,\r\n\
,result,table,_start,_stop,_time,_value,_field,_measurement,exchange,pair\r\n"
    );
    for (table, (time, value, field)) in rows.iter().enumerate() {
        body.push_str(&format!(
            ",,{table},1970-01-01T00:00:00Z,1970-01-01T00:03:00Z,{time},{value},{field},trades,bitfinex,BTCUSD\r\n"
        ));
    }
    body.push_str("\r\n");
    body
}

async fn mock_series(server: &mut ServerGuard, function: &str, body: String) -> Mock {
    server
        .mock("POST", "/api/v2/query")
        .match_query(Matcher::UrlEncoded("org".into(), "test_org".into()))
        .match_header("Authorization", "Token test_token")
        .match_body(Matcher::Regex(format!("fn: {function}")))
        .with_status(200)
        .with_header("content-type", "text/csv; charset=utf-8")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

#[tokio::test]
async fn test_fetch_merges_three_series() {
    let mut server = match start_mock_server("test_fetch_merges_three_series").await {
        Some(server) => server,
        None => return,
    };

    let sum = mock_series(
        &mut server,
        "sum",
        annotated_csv("double", &[
            ("1970-01-01T00:02:00Z", "4", "buy"),
            ("1970-01-01T00:01:00Z", "1.5", "sell"),
        ]),
    )
    .await;
    let count = mock_series(
        &mut server,
        "count",
        annotated_csv("double", &[("1970-01-01T00:01:00Z", "3", "side")]),
    )
    .await;
    let median = mock_series(
        &mut server,
        "median",
        annotated_csv("double", &[("1970-01-01T00:01:00Z", "100.25", "price")]),
    )
    .await;

    let storage = TradeStorage::configure(&storage_options(&server.url())).unwrap();
    storage.connect().await.unwrap();

    let ticks = match storage.fetch(0, 180_000, None).await {
        FetchOutcome::Ticks(ticks) => ticks,
        other => panic!("unexpected outcome: {other:?}"),
    };

    let summary: Vec<(i64, AggregateKind)> = ticks.iter().map(|t| (t.timestamp, t.series)).collect();
    assert_eq!(
        summary,
        vec![
            (60_000, AggregateKind::Sum),
            (60_000, AggregateKind::Count),
            (60_000, AggregateKind::Median),
            (120_000, AggregateKind::Sum),
        ]
    );
    assert_eq!(ticks[0].sell, Some(1.5));
    assert_eq!(ticks[1].count, Some(3));
    assert_eq!(ticks[2].price, Some(100.25));
    assert_eq!(ticks[3].buy, Some(4.0));
    assert_eq!(ticks[3].exchange.as_deref(), Some("bitfinex"));

    sum.assert_async().await;
    count.assert_async().await;
    median.assert_async().await;
}

#[tokio::test]
async fn test_fetch_reads_integer_counts() {
    let mut server = match start_mock_server("test_fetch_reads_integer_counts").await {
        Some(server) => server,
        None => return,
    };

    let sum = mock_series(
        &mut server,
        "sum",
        annotated_csv("double", &[("1970-01-01T00:01:00Z", "2", "buy")]),
    )
    .await;
    let count = mock_series(
        &mut server,
        "count",
        annotated_csv(
            "long",
            &[
                ("1970-01-01T00:01:00Z", "3", "side"),
                ("1970-01-01T00:02:00Z", "5", "side"),
            ],
        ),
    )
    .await;
    let median = mock_series(
        &mut server,
        "median",
        annotated_csv("double", &[("1970-01-01T00:02:00Z", "99.5", "price")]),
    )
    .await;

    let storage = TradeStorage::configure(&storage_options(&server.url())).unwrap();
    storage.connect().await.unwrap();

    let ticks = storage.fetch(0, 180_000, None).await.into_ticks().unwrap();

    let counts: Vec<(i64, Option<u64>)> = ticks
        .iter()
        .filter(|t| t.series == AggregateKind::Count)
        .map(|t| (t.timestamp, t.count))
        .collect();
    assert_eq!(counts, vec![(60_000, Some(3)), (120_000, Some(5))]);
    assert_eq!(ticks.len(), 4);

    sum.assert_async().await;
    count.assert_async().await;
    median.assert_async().await;
}
