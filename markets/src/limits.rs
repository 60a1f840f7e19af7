//! Hard-coded per-venue order-count limits (spec §6) and the capacity
//! derivation the Order Queue Manager (C6, spec §4.6) uses to size its
//! per-`(account, symbol, side)` admission window.

use crate::exchange::{ExchangeId, MarketType};

/// One venue/market row of the limits table. `per_account` of `None`
/// means unbounded (`∞` in the spec table).
#[derive(Debug, Clone, Copy)]
pub struct VenueLimit {
    pub exchange: ExchangeId,
    pub market: MarketType,
    pub per_symbol: Option<u32>,
    pub per_account: Option<u32>,
    pub conditional: Option<u32>,
}

/// Exchange limits table, reproduced exactly from spec §6.
pub struct ExchangeLimits;

impl ExchangeLimits {
    pub const LIMITS: &'static [VenueLimit] = &[
        VenueLimit {
            exchange: ExchangeId::Binance,
            market: MarketType::Futures,
            per_symbol: Some(200),
            per_account: Some(10_000),
            conditional: Some(10),
        },
        VenueLimit {
            exchange: ExchangeId::Binance,
            market: MarketType::Spot,
            per_symbol: Some(25),
            per_account: Some(1_000),
            conditional: Some(5),
        },
        VenueLimit {
            exchange: ExchangeId::Bybit,
            market: MarketType::Futures,
            per_symbol: Some(500),
            per_account: None,
            conditional: Some(10),
        },
        VenueLimit {
            exchange: ExchangeId::Bybit,
            market: MarketType::Spot,
            per_symbol: None,
            per_account: Some(500),
            conditional: Some(30),
        },
        VenueLimit {
            exchange: ExchangeId::Okx,
            market: MarketType::Futures,
            per_symbol: Some(500),
            per_account: Some(4_000),
            conditional: None,
        },
        VenueLimit {
            exchange: ExchangeId::Okx,
            market: MarketType::Spot,
            per_symbol: Some(500),
            per_account: Some(4_000),
            conditional: None,
        },
        VenueLimit {
            exchange: ExchangeId::Upbit,
            market: MarketType::Spot,
            per_symbol: None,
            per_account: None,
            conditional: Some(20),
        },
    ];

    pub fn lookup(exchange: ExchangeId, market: MarketType) -> Option<&'static VenueLimit> {
        Self::LIMITS
            .iter()
            .find(|l| l.exchange == exchange && l.market == market)
    }

    /// Default admission capacity used when a venue/market has no row in
    /// [`Self::LIMITS`] (e.g. BITHUMB, or B3 market types — spec §4.6
    /// "default 20").
    pub const DEFAULT_CAP: u32 = 20;

    /// Derives the per-`(account, symbol, side)` capacity (spec §4.6):
    /// the lesser of 10% of the per-symbol limit, 10% of the per-account
    /// limit, and the default of 20 — capped at 20, floored at 1.
    pub fn capacity(exchange: ExchangeId, market: MarketType) -> u32 {
        let candidates = match Self::lookup(exchange, market) {
            Some(limit) => {
                let mut values = vec![Self::DEFAULT_CAP];
                if let Some(per_symbol) = limit.per_symbol {
                    values.push((per_symbol as f64 * 0.10).floor() as u32);
                }
                if let Some(per_account) = limit.per_account {
                    values.push((per_account as f64 * 0.10).floor() as u32);
                }
                values
            }
            None => vec![Self::DEFAULT_CAP],
        };

        candidates.into_iter().min().unwrap_or(1).clamp(1, Self::DEFAULT_CAP)
    }

    /// Splits a per-side capacity into LIMIT vs STOP admission windows
    /// (spec §4.6): `max_stop_per_side = cap / 2` (integer division),
    /// `max_limit_per_side = cap - max_stop_per_side`. When `cap == 1`,
    /// STOP gets priority: `(1, 0)` limit/stop.
    pub fn split_sides(cap: u32) -> SideCapacity {
        if cap == 1 {
            return SideCapacity {
                max_limit_per_side: 0,
                max_stop_per_side: 1,
            };
        }
        let max_stop_per_side = cap / 2;
        let max_limit_per_side = cap - max_stop_per_side;
        SideCapacity {
            max_limit_per_side,
            max_stop_per_side,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideCapacity {
    pub max_limit_per_side: u32,
    pub max_stop_per_side: u32,
}
