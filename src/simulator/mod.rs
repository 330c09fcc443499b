//! Phase 3: The Simulator
//!
//! Responsible for:
//! - Pricing swaps against constant-product reserves
//! - Decoding Q96 fixed-point pool prices

mod sqrt_price;
pub mod swap_simulator;

pub use sqrt_price::{
    decode_sqrt_price, decode_sqrt_price_str, encode_sqrt_price_x96, parse_sqrt_price_x96,
    DecodedPrice,
};
pub use swap_simulator::{
    max_input_within_impact, simulate_pool, simulate_swap, PriceImpactResult,
};
