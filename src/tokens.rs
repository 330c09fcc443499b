//! Token symbol tables
//!
//! Pools on different chains name the same asset differently: the native gas
//! token is usually traded through a wrapped contract (WETH, WMATIC, WBNB...).
//! Matching is done on normalized symbols so `WETH/USDC` on Arbitrum and
//! `ETH/USDC` on a chain that quotes the native asset directly are the same pair.

use std::collections::HashMap;

lazy_static::lazy_static! {
    /// Wrapped (or bridged) symbol -> canonical native symbol
    static ref NATIVE_ALIASES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("WETH", "ETH");
        m.insert("WETH.E", "ETH");
        m.insert("ETH.E", "ETH");
        m.insert("WMATIC", "MATIC");
        m.insert("WPOL", "POL");
        m.insert("WBNB", "BNB");
        m.insert("WAVAX", "AVAX");
        m.insert("WFTM", "FTM");
        m.insert("WSOL", "SOL");
        m.insert("WXDAI", "XDAI");
        m
    };

    /// Canonical symbol -> decimals (anything missing is 18)
    static ref TOKEN_DECIMALS: HashMap<&'static str, u8> = {
        let mut m = HashMap::new();
        // 6 decimals (stablecoins)
        m.insert("USDC", 6);
        m.insert("USDC.E", 6);
        m.insert("USDBC", 6);
        m.insert("USDT", 6);
        m.insert("PYUSD", 6);
        // 8 decimals
        m.insert("WBTC", 8);
        m.insert("BTC.B", 8);
        // 9 decimals
        m.insert("SOL", 9);
        m
    };
}

/// Default decimals for tokens not in the table
pub const DEFAULT_DECIMALS: u8 = 18;

/// Normalize a symbol for pair matching: trimmed, upper-case, wrapped native
/// assets mapped to the native symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    match NATIVE_ALIASES.get(upper.as_str()) {
        Some(native) => (*native).to_string(),
        None => upper,
    }
}

/// True when two symbols refer to the same asset after normalization
pub fn same_asset(a: &str, b: &str) -> bool {
    normalize_symbol(a) == normalize_symbol(b)
}

/// Decimals for a symbol (normalized lookup, 18 by default)
pub fn decimals_for(symbol: &str) -> u8 {
    let normalized = normalize_symbol(symbol);
    TOKEN_DECIMALS
        .get(normalized.as_str())
        .copied()
        .unwrap_or(DEFAULT_DECIMALS)
}
