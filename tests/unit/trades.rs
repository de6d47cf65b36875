use iron_bank::encoder::{encode_trades, to_data_points, TradeVolume};
use iron_bank::{parse_trades, IronBankError, Trade};

#[test]
fn test_single_trade_deserializes_from_tuple() {
    let trade: Trade = serde_json::from_str(r#"["okex", "1640995200000", "46000", "0.1", "0", "0"]"#).unwrap();

    assert_eq!(trade, Trade::new("okex", 1_640_995_200_000, 46000.0, 0.1, 0.0, 0.0));
}

#[test]
fn test_parsed_batch_encodes_in_order() {
    let json = r#"[
        ["bitfinex", "1000", "100.5", "2", "1", "0"],
        ["bitfinex", "1001", "100.4", "1", "0", "0"],
        ["bitfinex", "1002", "100", "5", "1", "1"]
    ]"#;
    let trades = parse_trades(json).unwrap();
    let points = encode_trades(&trades, "BTCUSD");

    let timestamps: Vec<i64> = points.iter().map(|p| p.timestamp).collect();
    assert_eq!(timestamps, vec![1000, 1001, 1002]);

    let volumes: Vec<TradeVolume> = points.iter().map(|p| p.fields.volume).collect();
    assert_eq!(
        volumes,
        vec![
            TradeVolume::Buy(2.0),
            TradeVolume::Sell(1.0),
            TradeVolume::Liquidation(5.0)
        ]
    );
    assert_eq!(volumes[2].field_name(), "liquidation");

    let data_points = to_data_points(&points).unwrap();
    assert_eq!(data_points.len(), 3);
}

#[test]
fn test_invalid_batch_reports_validation_error() {
    let error = parse_trades(r#"[["bitfinex", "1000", "100.5", "2", "1"]]"#).unwrap_err();

    assert!(matches!(error, IronBankError::DataValidation { .. }));
    assert_eq!(error.category(), "data");
    assert!(!error.is_retryable());
}

#[test]
fn test_batch_must_be_an_array() {
    assert!(parse_trades(r#"{"exchange": "bitfinex"}"#).is_err());
}
