//! Rounding prices onto an exchange tick grid.

use rust_decimal::{Decimal, RoundingStrategy};
use spread_trader_core::RoundingMode;

fn strategy(mode: RoundingMode) -> RoundingStrategy {
    match mode {
        RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        RoundingMode::HalfAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
    }
}

/// Round `price` to the nearest multiple of `tick`.
///
/// A non-positive tick leaves the price unchanged.
#[must_use]
pub fn round_to_tick(price: Decimal, tick: Decimal, mode: RoundingMode) -> Decimal {
    if tick <= Decimal::ZERO {
        return price;
    }
    let ticks = (price / tick).round_dp_with_strategy(0, strategy(mode));
    (ticks * tick).normalize()
}

#[must_use]
pub fn is_on_tick(price: Decimal, tick: Decimal) -> bool {
    tick > Decimal::ZERO && (price % tick).is_zero()
}
