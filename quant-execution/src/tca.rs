use quant_instrument::OrderSide;
use rust_decimal::Decimal;

/// Execution slippage of `executed` relative to an `arrival` benchmark
/// price, in basis points, signed so an unfavorable fill (paying more on
/// a buy, receiving less on a sell) is positive (`spec.md` §8 scenario
/// S5; supplemented from
/// `examples/original_source/src/core/execution_handler.py`'s
/// `TCAEngine.calculate_slippage`). `arrival == 0` has no benchmark to
/// compare against and returns `0` rather than dividing by zero.
pub fn slippage(arrival: Decimal, executed: Decimal, side: OrderSide) -> Decimal {
    if arrival.is_zero() {
        return Decimal::ZERO;
    }
    (executed - arrival) / arrival * Decimal::from(10_000) * side.sign()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_s5_slippage() {
        assert_eq!(slippage(dec!(100), dec!(101), OrderSide::Buy), dec!(100));
        assert_eq!(slippage(dec!(100), dec!(99), OrderSide::Sell), dec!(100));
        assert_eq!(slippage(Decimal::ZERO, dec!(123), OrderSide::Buy), Decimal::ZERO);
    }

    #[test]
    fn test_favorable_fill_is_negative_slippage() {
        assert_eq!(slippage(dec!(100), dec!(99), OrderSide::Buy), dec!(-100));
        assert_eq!(slippage(dec!(100), dec!(101), OrderSide::Sell), dec!(-100));
    }
}
