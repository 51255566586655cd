use chrono::{DateTime, Utc};
use quant_instrument::{Bar, CorporateAction, CorporateActionKind};
use rust_decimal::Decimal;

/// Applies `actions` to `bars` in place, scaled-subtractive for dividends,
/// multiplicative for splits, iterating ex-dates newest-to-oldest so a
/// dividend paid before a later split is scaled onto the post-split share
/// base (§9 Open Question (b)).
///
/// Only actions with `ex_date <= end` are considered; a bar is adjusted
/// only if `bar.timestamp < ex_date`, matching "adjust history strictly
/// before the corporate action took effect".
pub fn adjust(bars: &mut [Bar], actions: &[CorporateAction], end: DateTime<Utc>) {
    let mut relevant: Vec<&CorporateAction> = actions.iter().filter(|ca| ca.ex_date <= end).collect();
    relevant.sort_by(|a, b| b.ex_date.cmp(&a.ex_date));

    let mut split_factor = Decimal::ONE;
    for action in relevant {
        match action.kind {
            CorporateActionKind::Split => {
                let factor = Decimal::ONE / action.value;
                for bar in bars.iter_mut() {
                    if bar.timestamp < action.ex_date {
                        bar.open *= factor;
                        bar.high *= factor;
                        bar.low *= factor;
                        bar.close *= factor;
                    }
                }
                split_factor *= factor;
            }
            CorporateActionKind::Dividend => {
                let adjustment = action.value * split_factor;
                for bar in bars.iter_mut() {
                    if bar.timestamp < action.ex_date {
                        bar.open -= adjustment;
                        bar.high -= adjustment;
                        bar.low -= adjustment;
                        bar.close -= adjustment;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quant_instrument::{InternalId, Timeframe};
    use rust_decimal_macros::dec;

    fn bar(id: InternalId, ts: DateTime<Utc>, close: Decimal) -> Bar {
        Bar {
            internal_id: id,
            timestamp: ts,
            timeframe: Timeframe::Day1,
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1000),
            timestamp_knowledge: ts,
        }
    }

    #[test]
    fn test_split_adjustment_scales_bars_before_ex_date() {
        let t1 = Utc::now();
        let t2 = t1 + Duration::days(1);
        let t3 = t2 + Duration::days(1);
        let id = InternalId(1000);

        let mut bars = vec![bar(id, t1, dec!(100)), bar(id, t2, dec!(50)), bar(id, t3, dec!(50))];
        let actions = vec![CorporateAction::new(id, t2, CorporateActionKind::Split, dec!(2))];

        adjust(&mut bars, &actions, t3);

        assert_eq!(bars[0].close, dec!(50));
        assert_eq!(bars[1].close, dec!(50));
        assert_eq!(bars[2].close, dec!(50));
    }

    #[test]
    fn test_dividend_scaled_by_later_split() {
        let t1 = Utc::now();
        let t_div = t1 + Duration::days(1);
        let t_split = t_div + Duration::days(1);
        let t_end = t_split + Duration::days(1);
        let id = InternalId(1000);

        let mut bars = vec![bar(id, t1, dec!(100))];
        let actions = vec![
            CorporateAction::new(id, t_div, CorporateActionKind::Dividend, dec!(1)),
            CorporateAction::new(id, t_split, CorporateActionKind::Split, dec!(2)),
        ];

        adjust(&mut bars, &actions, t_end);

        // Newest-to-oldest: split halves first (100 -> 50), then the $1
        // dividend is scaled by the 0.5 split factor already applied (-0.5).
        assert_eq!(bars[0].close, dec!(49.5));
    }

    #[test]
    fn test_no_actions_in_window_is_identity() {
        let t1 = Utc::now();
        let id = InternalId(1000);
        let mut bars = vec![bar(id, t1, dec!(100))];
        let original = bars.clone();

        adjust(&mut bars, &[], t1);

        assert_eq!(bars, original);
    }
}
