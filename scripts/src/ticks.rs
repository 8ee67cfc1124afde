//! Uniswap V3 price and tick math used when creating pools and positions.
//!
//! Prices are `sqrt(amount1 / amount0)` in Q64.96 fixed point. Ticks are
//! powers of `sqrt(1.0001)`; a pool only accepts positions whose bounds are
//! multiples of its tick spacing.

use std::fmt::{self, Display};

use alloy::primitives::{U256, U512};
use serde::Deserialize;

use crate::errors::ScriptError;

/// The minimum tick that may be passed to [`get_sqrt_ratio_at_tick`]
pub const MIN_TICK: i32 = -887272;
/// The maximum tick that may be passed to [`get_sqrt_ratio_at_tick`]
pub const MAX_TICK: i32 = -MIN_TICK;

/// The sqrt ratio at [`MIN_TICK`]
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4295128739, 0, 0, 0]);

/// The per-bit multipliers of `sqrt(1.0001)^-(2^i)` in Q128.128, for `i` in `1..20`
const TICK_BIT_MULTIPLIERS: [u128; 19] = [
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

/// The multiplier for the lowest tick bit
const TICK_BIT_0_MULTIPLIER: u128 = 0xfffcb933bd6fad37aa2d162d1a594001;

/// The Uniswap V3 fee tiers and their tick spacings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum FeeTier {
    /// 0.01%, tick spacing 1
    Lowest,
    /// 0.05%, tick spacing 10
    Low,
    /// 0.3%, tick spacing 60
    Medium,
    /// 1%, tick spacing 200
    High,
}

impl FeeTier {
    /// The fee in hundredths of a bip, as passed to the factory
    pub fn fee(&self) -> u32 {
        match self {
            FeeTier::Lowest => 100,
            FeeTier::Low => 500,
            FeeTier::Medium => 3000,
            FeeTier::High => 10000,
        }
    }

    /// The tick spacing the factory assigns to pools of this tier
    pub fn tick_spacing(&self) -> i32 {
        match self {
            FeeTier::Lowest => 1,
            FeeTier::Low => 10,
            FeeTier::Medium => 60,
            FeeTier::High => 200,
        }
    }
}

impl TryFrom<u32> for FeeTier {
    type Error = ScriptError;

    fn try_from(fee: u32) -> Result<Self, Self::Error> {
        match fee {
            100 => Ok(FeeTier::Lowest),
            500 => Ok(FeeTier::Low),
            3000 => Ok(FeeTier::Medium),
            10000 => Ok(FeeTier::High),
            _ => Err(ScriptError::Configuration(format!(
                "unsupported fee tier {fee}, expected one of 100, 500, 3000, 10000"
            ))),
        }
    }
}

impl Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fee())
    }
}

/// A price expressed as `numerator / denominator` whole-token units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PriceRatio {
    /// The numerator of the price
    pub numerator: u64,
    /// The denominator of the price
    pub denominator: u64,
}

impl PriceRatio {
    /// A new price ratio
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// Encode `amount1 / amount0` as a Q64.96 sqrt price, rounding down
pub fn encode_sqrt_ratio_x96(amount1: U256, amount0: U256) -> Result<U256, ScriptError> {
    if amount0.is_zero() {
        return Err(ScriptError::PoolMath("price denominator is zero".to_string()));
    }
    // `amount1 << 192` needs up to 448 bits
    let ratio_x192: U512 = (U512::from(amount1) << 192) / U512::from(amount0);
    let root = ratio_x192.root(2);
    if root.bit_len() > 256 {
        return Err(ScriptError::PoolMath(format!(
            "sqrt price of {amount1} / {amount0} does not fit in 256 bits"
        )));
    }

    Ok(U256::from_limbs_slice(&root.as_limbs()[..4]))
}

/// The sqrt ratio at [`MAX_TICK`]
pub fn max_sqrt_ratio() -> U256 {
    // MAX_TICK is always in range
    sqrt_ratio_at_abs_tick(MAX_TICK.unsigned_abs(), true)
}

/// The Q64.96 sqrt price at the given tick, `sqrt(1.0001^tick) * 2^96`
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, ScriptError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK.unsigned_abs() {
        return Err(ScriptError::PoolMath(format!("tick {tick} out of range")));
    }

    Ok(sqrt_ratio_at_abs_tick(abs_tick, tick > 0))
}

/// Fixed-point evaluation of `sqrt(1.0001)^-abs_tick`, inverted for positive ticks
fn sqrt_ratio_at_abs_tick(abs_tick: u32, positive: bool) -> U256 {
    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(TICK_BIT_0_MULTIPLIER)
    } else {
        U256::from(1) << 128
    };

    for (bit, multiplier) in TICK_BIT_MULTIPLIERS.iter().enumerate() {
        if abs_tick & (1 << (bit + 1)) != 0 {
            ratio = (ratio * U256::from(*multiplier)) >> 128;
        }
    }

    if positive {
        ratio = U256::MAX / ratio;
    }

    // Round up when converting from Q128.128 to Q64.96
    let rounding = if (ratio & U256::from(u32::MAX)).is_zero() {
        U256::ZERO
    } else {
        U256::from(1)
    };
    (ratio >> 32) + rounding
}

/// The greatest tick whose sqrt ratio is at most `sqrt_price_x96`
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, ScriptError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= max_sqrt_ratio() {
        return Err(ScriptError::PoolMath(format!(
            "sqrt price {sqrt_price_x96} out of range"
        )));
    }

    // `get_sqrt_ratio_at_tick` is monotonic, so search for the last tick at or below the price
    let (mut low, mut high) = (MIN_TICK, MAX_TICK);
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Ok(low)
}

/// Round a tick to a multiple of the spacing, toward zero
pub fn round_tick_to_spacing(tick: i32, tick_spacing: i32) -> Result<i32, ScriptError> {
    if tick_spacing <= 0 {
        return Err(ScriptError::PoolMath(format!(
            "tick spacing must be positive, got {tick_spacing}"
        )));
    }
    Ok(tick - (tick % tick_spacing))
}

/// The sqrt price at which one whole unit of token0 trades for one whole unit of token1
pub fn unit_price_sqrt_ratio(
    token0_decimals: u8,
    token1_decimals: u8,
) -> Result<U256, ScriptError> {
    encode_sqrt_ratio_x96(unit(token1_decimals)?, unit(token0_decimals)?)
}

/// The tick of a whole-token price, rounded to the pool's spacing.
///
/// The ratio is `token1 / token0` in whole tokens; it is scaled by the token
/// decimals before being converted to a raw pool price.
pub fn tick_for_price(
    ratio: PriceRatio,
    token0_decimals: u8,
    token1_decimals: u8,
    tick_spacing: i32,
) -> Result<i32, ScriptError> {
    let amount1 = U256::from(ratio.numerator) * unit(token1_decimals)?;
    let amount0 = U256::from(ratio.denominator) * unit(token0_decimals)?;
    let sqrt_price = encode_sqrt_ratio_x96(amount1, amount0)?;
    let tick = get_tick_at_sqrt_ratio(sqrt_price)?;

    round_tick_to_spacing(tick, tick_spacing)
}

/// One whole token in base units
fn unit(decimals: u8) -> Result<U256, ScriptError> {
    U256::from(10)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| ScriptError::PoolMath(format!("{decimals} decimals out of range")))
}
