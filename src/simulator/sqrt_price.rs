//! Q96 fixed-point price decoding
//!
//! Concentrated-liquidity pools store `sqrtPriceX96 = sqrt(token1/token0) * 2^96`
//! in raw (undecimalized) units. Decoding divides by 2^96, squares, and shifts
//! by the decimal difference to get a human "token1 per token0" rate.

use alloy_primitives::U256;
use std::str::FromStr;

use crate::error::{RouteError, RouteResult};

/// Rates below this are treated as a token0/token1 ordering mix-up
const MIN_PLAUSIBLE_PRICE: f64 = 1e-10;

/// sqrtPriceX96 is a uint160 on-chain
const MAX_SQRT_PRICE_BITS: i32 = 160;

/// A decoded pool price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedPrice {
    /// Human rate: token1 per token0
    pub token1_per_token0: f64,

    /// Reciprocal rate (0 when the rate is 0)
    pub token0_per_token1: f64,

    /// (sqrtPriceX96 / 2^96)^2, before decimal adjustment
    pub raw_price: f64,

    /// The decimal exponent was flipped by the plausibility check
    pub inverted: bool,
}

fn q96() -> f64 {
    2_f64.powi(96)
}

/// Parse a sqrt price from a decimal or 0x-prefixed hex string
pub fn parse_sqrt_price_x96(value: &str) -> RouteResult<U256> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(RouteError::invalid(format!(
            "sqrt price must be a non-negative integer, got {:?}",
            value
        )));
    }

    U256::from_str(trimmed).map_err(|e| {
        RouteError::invalid(format!("Failed to parse sqrt price {:?}: {}", value, e))
    })
}

fn u256_to_f64(value: U256) -> RouteResult<f64> {
    value
        .to_string()
        .parse::<f64>()
        .map_err(|e| RouteError::Calculation(format!("sqrt price not representable: {}", e)))
}

/// Decode a raw Q96 value into human-readable rates
pub fn decode_sqrt_price(
    sqrt_price_x96: U256,
    decimals0: u8,
    decimals1: u8,
) -> RouteResult<DecodedPrice> {
    let sqrt_price = u256_to_f64(sqrt_price_x96)? / q96();
    let raw_price = sqrt_price * sqrt_price;

    let shift = decimals0 as i32 - decimals1 as i32;
    let mut price = raw_price * 10_f64.powi(shift);
    let mut inverted = false;

    // Source pools don't always agree on which token is token0
    if price < MIN_PLAUSIBLE_PRICE && raw_price >= MIN_PLAUSIBLE_PRICE {
        price = raw_price * 10_f64.powi(-shift);
        inverted = true;
    }

    if !price.is_finite() || !raw_price.is_finite() {
        return Err(RouteError::Calculation(format!(
            "decoded price is not finite (raw {})",
            raw_price
        )));
    }

    let reciprocal = if price > 0.0 { 1.0 / price } else { 0.0 };

    Ok(DecodedPrice {
        token1_per_token0: price,
        token0_per_token1: reciprocal,
        raw_price,
        inverted,
    })
}

/// Parse and decode in one step
pub fn decode_sqrt_price_str(
    sqrt_price_x96: &str,
    decimals0: u8,
    decimals1: u8,
) -> RouteResult<DecodedPrice> {
    let value = parse_sqrt_price_x96(sqrt_price_x96)?;
    decode_sqrt_price(value, decimals0, decimals1)
}

/// Encode a human "token1 per token0" rate as sqrtPriceX96
pub fn encode_sqrt_price_x96(price: f64, decimals0: u8, decimals1: u8) -> RouteResult<U256> {
    if !price.is_finite() || price < 0.0 {
        return Err(RouteError::invalid(format!("cannot encode price {}", price)));
    }

    let raw_price = price * 10_f64.powi(decimals1 as i32 - decimals0 as i32);
    let scaled = raw_price.sqrt() * q96();

    if !scaled.is_finite() || scaled >= 2_f64.powi(MAX_SQRT_PRICE_BITS) {
        return Err(RouteError::Calculation(format!(
            "price {} does not fit a sqrtPriceX96",
            price
        )));
    }

    // Split at 2^64 so each half converts exactly
    let two_64 = 2_f64.powi(64);
    let high = (scaled / two_64).floor();
    let low = scaled - high * two_64;
    Ok((U256::from(high as u128) << 64usize) + U256::from(low as u64))
}
