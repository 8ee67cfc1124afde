//! Type definitions used throughout the scripts

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, TxHash, TxKind, U256},
};
use serde::Deserialize;

/// Overrides applied to a submitted transaction.
///
/// Any field left unset is filled in by the chain client (estimated gas,
/// network fee suggestion, zero value).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionOptions {
    /// The gas limit of the transaction
    pub gas_limit: Option<u64>,
    /// The maximum total fee per gas, in wei
    pub max_fee_per_gas: Option<u128>,
    /// The value sent along with the transaction, in wei
    pub value: Option<U256>,
}

impl TransactionOptions {
    /// Options with only a gas limit set
    pub fn with_gas_limit(gas_limit: u64) -> Self {
        Self {
            gas_limit: Some(gas_limit),
            ..Default::default()
        }
    }
}

/// A transaction handed to the chain client for signing and submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSubmission {
    /// Either a contract creation or a call to an existing address
    pub kind: TxKind,
    /// The creation code or the calldata
    pub input: Bytes,
    /// The overrides for this transaction
    pub options: TransactionOptions,
}

impl TransactionSubmission {
    /// A contract-creation transaction
    pub fn create(creation_code: Bytes, options: TransactionOptions) -> Self {
        Self {
            kind: TxKind::Create,
            input: creation_code,
            options,
        }
    }

    /// A call to the contract at `to`
    pub fn call(to: Address, calldata: Bytes, options: TransactionOptions) -> Self {
        Self {
            kind: TxKind::Call(to),
            input: calldata,
            options,
        }
    }
}

/// The outcome of a mined transaction, as reported by the chain client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedTransaction {
    /// The hash of the mined transaction
    pub tx_hash: TxHash,
    /// Whether the transaction executed successfully
    pub success: bool,
    /// The address of the created contract, for creation transactions
    pub contract_address: Option<Address>,
}

/// A request to deploy a single contract
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRequest {
    /// The name of the contract, used for logging
    contract_name: String,
    /// The constructor arguments, in declaration order
    constructor_args: Vec<DynSolValue>,
    /// The overrides for the creation transaction
    options: TransactionOptions,
}

impl DeploymentRequest {
    /// Build a new deployment request
    pub fn new(
        contract_name: impl Into<String>,
        constructor_args: Vec<DynSolValue>,
        options: TransactionOptions,
    ) -> Self {
        Self {
            contract_name: contract_name.into(),
            constructor_args,
            options,
        }
    }

    /// The name of the contract to deploy
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    /// The constructor arguments
    pub fn constructor_args(&self) -> &[DynSolValue] {
        &self.constructor_args
    }

    /// The transaction overrides
    pub fn options(&self) -> TransactionOptions {
        self.options
    }
}

/// A contract whose creation transaction has been confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    /// The name of the deployed contract
    pub contract_name: String,
    /// The address the contract was deployed to
    pub address: Address,
    /// The hash of the confirmed creation transaction
    pub tx_hash: TxHash,
}
