//! Applies a resolved boost map to an odds-change message.

use crate::error::PublishError;
use crate::models::{BoostedMarketRow, OddsChange};
use std::collections::HashMap;

/// Produce a copy of `message` with every market whose key appears in
/// `boost_map` transformed by its configured strategy.
///
/// The input message is never mutated; unmatched markets are carried over
/// with their exact field values. A boost row referencing a strategy name
/// the registry does not know fails the whole apply.
pub fn apply(
    message: &OddsChange,
    boost_map: &HashMap<String, BoostedMarketRow>,
) -> Result<OddsChange, PublishError> {
    use crate::boost::strategy::BoostStrategy;

    let mut boosted = message.clone();
    for market in &mut boosted.markets {
        if let Some(config) = boost_map.get(&market.market_key()) {
            let strategy = BoostStrategy::from_name(&config.strategy)?;
            strategy.apply(market, config.percent);
        }
    }
    Ok(boosted)
}

/// Collapse boost rows into a `market_key -> row` map, first-seen wins.
///
/// The catalog orders rows by id, so the merge is deterministic.
pub fn boost_map_of(rows: &[BoostedMarketRow]) -> HashMap<String, BoostedMarketRow> {
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        map.entry(row.market_key()).or_insert_with(|| row.clone());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OddsChangeMarket, Outcome, Product};

    fn message() -> OddsChange {
        OddsChange {
            event_id: "sr:match:12345".to_string(),
            product: Product::Prematch,
            timestamp: 1_700_000_000_000,
            markets: vec![
                OddsChangeMarket {
                    id: 10,
                    specifiers: "total=2.5".to_string(),
                    status: 1,
                    favourite: true,
                    outcomes: vec![
                        Outcome {
                            id: "over".to_string(),
                            odds: 2.0,
                            active: true,
                        },
                        Outcome {
                            id: "under".to_string(),
                            odds: 1.8,
                            active: true,
                        },
                    ],
                },
                OddsChangeMarket {
                    id: 1,
                    specifiers: String::new(),
                    status: 1,
                    favourite: false,
                    outcomes: vec![Outcome {
                        id: "home".to_string(),
                        odds: 1.5,
                        active: true,
                    }],
                },
            ],
        }
    }

    fn boost_row(market_id: i64, specifier: &str, strategy: &str, percent: f64) -> BoostedMarketRow {
        BoostedMarketRow {
            profile_id: 1,
            market_id,
            market_specifier: specifier.to_string(),
            strategy: strategy.to_string(),
            percent,
        }
    }

    #[test]
    fn test_matched_market_is_boosted_others_untouched() {
        let msg = message();
        let rows = vec![boost_row(10, "total=2.5", "ADDITIVE_PERCENT", 10.0)];
        let boosted = apply(&msg, &boost_map_of(&rows)).unwrap();

        assert_eq!(boosted.markets[0].outcomes[0].odds, 2.2);
        assert_eq!(boosted.markets[0].outcomes[1].odds, 1.98);
        // the plain-win market did not match any boost key
        assert_eq!(boosted.markets[1], msg.markets[1]);
    }

    #[test]
    fn test_input_message_is_never_mutated() {
        let msg = message();
        let before = msg.clone();
        let rows = vec![boost_row(10, "total=2.5", "ADDITIVE_PERCENT", 25.0)];
        let _ = apply(&msg, &boost_map_of(&rows)).unwrap();

        assert_eq!(msg, before);
    }

    #[test]
    fn test_non_odds_fields_preserved_on_boosted_market() {
        let msg = message();
        let rows = vec![boost_row(10, "total=2.5", "ADDITIVE_PERCENT", 10.0)];
        let boosted = apply(&msg, &boost_map_of(&rows)).unwrap();

        assert_eq!(boosted.markets[0].id, 10);
        assert_eq!(boosted.markets[0].specifiers, "total=2.5");
        assert_eq!(boosted.markets[0].status, 1);
        assert!(boosted.markets[0].favourite);
        assert_eq!(boosted.markets[0].outcomes[0].id, "over");
        assert_eq!(boosted.event_id, msg.event_id);
        assert_eq!(boosted.timestamp, msg.timestamp);
    }

    #[test]
    fn test_unknown_strategy_fails_whole_apply() {
        let msg = message();
        let rows = vec![boost_row(10, "total=2.5", "NOT_A_STRATEGY", 10.0)];
        let err = apply(&msg, &boost_map_of(&rows)).unwrap_err();

        assert!(matches!(err, PublishError::UnknownStrategy { .. }));
    }

    #[test]
    fn test_apply_is_deterministic() {
        let msg = message();
        let rows = vec![boost_row(10, "total=2.5", "MULTIPLICATIVE_PERCENT", 15.0)];
        let map = boost_map_of(&rows);

        let a = apply(&msg, &map).unwrap();
        let b = apply(&msg, &map).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_market_key_first_seen_wins() {
        let rows = vec![
            boost_row(10, "total=2.5", "ADDITIVE_PERCENT", 10.0),
            boost_row(10, "total=2.5", "ADDITIVE_PERCENT", 50.0),
        ];
        let map = boost_map_of(&rows);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("10|total=2.5").unwrap().percent, 10.0);
    }

    #[test]
    fn test_empty_boost_map_is_field_equal_copy() {
        let msg = message();
        let boosted = apply(&msg, &HashMap::new()).unwrap();
        assert_eq!(boosted, msg);
    }
}
