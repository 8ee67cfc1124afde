//! Calldata assembly for initializers and constructor-argument archives.
//!
//! The encodings produced here are archived in the deployment record so that
//! an operator can verify a contract or replay a call from a multisig; they
//! must be reproducible byte for byte from the same inputs.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{aliases::I24, aliases::U24, Address, Bytes, I256, U256},
    sol_types::{SolCall, SolValue},
};

use crate::{errors::ScriptError, solidity::IMuniLogic};

/// ABI-encode a parameter list the way a constructor receives it,
/// i.e. as a tuple without a selector
pub fn encode_params(values: &[DynSolValue]) -> Bytes {
    DynSolValue::Tuple(values.to_vec()).abi_encode_params().into()
}

/// The arguments of the MUNI logic's `initialize` method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuniInitParams {
    /// The owner of the MUNI position manager
    pub owner: Address,
    /// The Uniswap V3 pool the position is held in
    pub pool: Address,
    /// The pool's fee tier, in hundredths of a bip
    pub fee: u32,
    /// The lower tick of the position, a multiple of the pool's tick spacing
    pub lower_tick: i32,
    /// The upper tick of the position, a multiple of the pool's tick spacing
    pub upper_tick: i32,
}

impl MuniInitParams {
    /// The initializer arguments as dynamic values, in declaration order
    pub fn to_values(&self) -> Vec<DynSolValue> {
        vec![
            DynSolValue::Address(self.owner),
            DynSolValue::Address(self.pool),
            DynSolValue::Uint(U256::from(self.fee), 24),
            DynSolValue::Int(int256(self.lower_tick), 24),
            DynSolValue::Int(int256(self.upper_tick), 24),
        ]
    }

    /// The typed `initialize(address,address,uint24,int24,int24)` call
    pub fn initialize_call(&self) -> Result<IMuniLogic::initializeCall, ScriptError> {
        let fee = U24::try_from(self.fee)
            .map_err(|e| ScriptError::CalldataConstruction(format!("fee {}: {e}", self.fee)))?;
        let lower = int24(self.lower_tick)?;
        let upper = int24(self.upper_tick)?;

        Ok(IMuniLogic::initializeCall::new((self.owner, self.pool, fee, lower, upper)))
    }

    /// Calldata for `initialize(address,address,uint24,int24,int24)`
    pub fn initialize_calldata(&self) -> Result<Bytes, ScriptError> {
        Ok(self.initialize_call()?.abi_encode().into())
    }

    /// The archived form of the initializer arguments,
    /// encoded as `(address,address,uint256,int256,int256)`
    pub fn archive(&self) -> Bytes {
        (
            self.owner,
            self.pool,
            U256::from(self.fee),
            int256(self.lower_tick),
            int256(self.upper_tick),
        )
            .abi_encode_params()
            .into()
    }
}

/// Sign-extend a tick to a 256-bit integer
fn int256(tick: i32) -> I256 {
    I256::from_raw(U256::from_be_bytes(i256_be_bytes(tick)))
}

/// The big-endian two's complement encoding of a tick as a 256-bit word
fn i256_be_bytes(value: i32) -> [u8; 32] {
    let fill = if value < 0 { 0xff } else { 0x00 };
    let mut word = [fill; 32];
    word[28..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Narrow a tick to the `int24` Solidity type
fn int24(tick: i32) -> Result<I24, ScriptError> {
    I24::try_from(tick)
        .map_err(|e| ScriptError::CalldataConstruction(format!("tick {tick}: {e}")))
}
