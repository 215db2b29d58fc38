//! Test fixture generators.
//!
//! Every generated intent is valid from the start: prices are tick-aligned
//! within a band around a mid price, quantities are lot-aligned, and both
//! respect the instrument's precision. Feed them a seeded RNG for
//! reproducible sequences.

use rand::Rng;
use rust_decimal::Decimal;

use crate::{AccountId, Instrument, NewOrder, Side};

/// A tick-aligned price within ±`band_ticks` of `mid_ticks` (both counted in
/// whole ticks of the instrument).
pub fn random_price<R: Rng>(
    rng: &mut R,
    instrument: &Instrument,
    mid_ticks: i64,
    band_ticks: i64,
) -> Decimal {
    let lo = (mid_ticks - band_ticks).max(1);
    let hi = mid_ticks + band_ticks;
    let ticks = rng.gen_range(lo..=hi);
    Decimal::from(ticks) * instrument.price_tick
}

/// A lot-aligned quantity of 1..=`max_lots` lots.
pub fn random_quantity<R: Rng>(rng: &mut R, instrument: &Instrument, max_lots: i64) -> Decimal {
    let lots = rng.gen_range(1..=max_lots.max(1));
    Decimal::from(lots) * instrument.lot_size
}

/// A random valid limit intent from one of `accounts`.
pub fn random_limit_intent<R: Rng>(
    rng: &mut R,
    instrument: &Instrument,
    accounts: &[AccountId],
    mid_ticks: i64,
    band_ticks: i64,
    max_lots: i64,
) -> NewOrder {
    let account = accounts[rng.gen_range(0..accounts.len())];
    let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
    NewOrder::limit(
        account,
        instrument.symbol.clone(),
        side,
        random_price(rng, instrument, mid_ticks, band_ticks),
        random_quantity(rng, instrument, max_lots),
    )
}
