//! An in-memory chain and artifact fixtures for unit tests

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, TxHash, TxKind, B256, I256, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;

use crate::{
    artifacts::ContractArtifact,
    client::ChainClient,
    errors::ScriptError,
    types::{ConfirmedTransaction, TransactionSubmission},
};

/// The address the mock assigns to the `n`th created contract, `0xAA..AA0n`
pub fn mock_address(n: u8) -> Address {
    let mut bytes = [0xaa; 20];
    bytes[19] = n;
    Address::from(bytes)
}

/// The hash the mock assigns to the `n`th submitted transaction
pub fn mock_tx_hash(n: u8) -> TxHash {
    B256::with_last_byte(n)
}

/// The mutable state of the mock chain
#[derive(Default)]
struct MockState {
    /// Every transaction the client submitted, in order
    submissions: Vec<TransactionSubmission>,
    /// The receipts of accepted transactions
    receipts: HashMap<TxHash, ConfirmedTransaction>,
    /// The number of contracts created so far
    created: u8,
    /// Submission indices the node rejects outright
    rejected: HashSet<usize>,
    /// Submission indices that are mined but revert
    reverted: HashSet<usize>,
    /// Canned return data keyed by callee and selector
    responses: HashMap<(Address, [u8; 4]), Bytes>,
}

/// A chain that confirms every transaction immediately and assigns
/// sequential addresses to created contracts
pub struct MockChain {
    /// The signer address reported to the scripts
    sender: Address,
    /// The chain state
    state: Mutex<MockState>,
}

impl MockChain {
    /// A mock chain with no canned responses
    pub fn new() -> Self {
        Self {
            sender: Address::repeat_byte(0xde),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Reject the `index`th submission as underpriced
    pub fn reject_submission(mut self, index: usize) -> Self {
        self.state_mut().rejected.insert(index);
        self
    }

    /// Mine the `index`th submission with a failed status
    pub fn revert_submission(mut self, index: usize) -> Self {
        self.state_mut().reverted.insert(index);
        self
    }

    /// Answer calls of `T` on `to` with an address
    pub fn respond_address<T: SolCall>(self, to: Address, value: Address) -> Self {
        self.respond::<T>(to, DynSolValue::Address(value))
    }

    /// Answer calls of `T` on `to` with a signed integer
    pub fn respond_int<T: SolCall>(self, to: Address, value: i64) -> Self {
        let value = I256::try_from(value).unwrap();
        self.respond::<T>(to, DynSolValue::Int(value, 256))
    }

    /// Answer calls of `T` on `to` with an unsigned integer
    pub fn respond_uint<T: SolCall>(self, to: Address, value: U256) -> Self {
        self.respond::<T>(to, DynSolValue::Uint(value, 256))
    }

    /// Answer calls of `T` on `to` with the encoding of `value`
    fn respond<T: SolCall>(mut self, to: Address, value: DynSolValue) -> Self {
        self.state_mut()
            .responses
            .insert((to, T::SELECTOR), value.abi_encode().into());
        self
    }

    /// The submitted transactions, in order
    pub fn submissions(&self) -> Vec<TransactionSubmission> {
        self.state.lock().unwrap().submissions.clone()
    }

    /// The submitted calls, as `(to, selector)` pairs
    pub fn called_selectors(&self) -> Vec<(Address, [u8; 4])> {
        self.submissions()
            .into_iter()
            .filter_map(|tx| match tx.kind {
                TxKind::Call(to) => {
                    let selector: [u8; 4] = tx.input.get(..4)?.try_into().ok()?;
                    Some((to, selector))
                }
                TxKind::Create => None,
            })
            .collect()
    }

    /// Exclusive access to the state while building the mock
    fn state_mut(&mut self) -> &mut MockState {
        self.state.get_mut().unwrap()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn submit(&self, tx: TransactionSubmission) -> Result<TxHash, ScriptError> {
        let mut state = self.state.lock().unwrap();
        let index = state.submissions.len();
        let is_create = tx.kind == TxKind::Create;
        state.submissions.push(tx);

        if state.rejected.contains(&index) {
            return Err(ScriptError::TransactionFailure(
                "replacement transaction underpriced".to_string(),
            ));
        }

        let tx_hash = mock_tx_hash(index as u8 + 1);
        let success = !state.reverted.contains(&index);
        let contract_address = if is_create && success {
            state.created += 1;
            Some(mock_address(state.created))
        } else {
            None
        };

        state.receipts.insert(
            tx_hash,
            ConfirmedTransaction {
                tx_hash,
                success,
                contract_address,
            },
        );
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> Result<ConfirmedTransaction, ScriptError> {
        self.state
            .lock()
            .unwrap()
            .receipts
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| ScriptError::TransactionFailure(format!("unknown tx {tx_hash:#x}")))
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, ScriptError> {
        let selector: [u8; 4] = calldata
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ScriptError::ContractInteraction("calldata too short".to_string()))?;

        self.state
            .lock()
            .unwrap()
            .responses
            .get(&(to, selector))
            .cloned()
            .ok_or_else(|| {
                ScriptError::ContractInteraction(format!("no mock response for {to:#x}"))
            })
    }
}

// ------------
// | Fixtures |
// ------------

/// A minimal upgradable proxy artifact
pub const PROXY_ARTIFACT_JSON: &str = r#"{
    "abi": [
        {
            "type": "constructor",
            "inputs": [
                { "name": "_logic", "type": "address", "internalType": "address" },
                { "name": "_admin", "type": "address", "internalType": "address" },
                { "name": "_data", "type": "bytes", "internalType": "bytes" }
            ],
            "stateMutability": "payable"
        },
        {
            "type": "function",
            "name": "getAdmin",
            "inputs": [],
            "outputs": [{ "name": "", "type": "address", "internalType": "address" }],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "changeAdmin",
            "inputs": [{ "name": "newAdmin", "type": "address", "internalType": "address" }],
            "outputs": [],
            "stateMutability": "nonpayable"
        }
    ],
    "bytecode": { "object": "0x608060405260405161001057600080fd5b01" }
}"#;

/// A TWAP artifact taking its role admin in the constructor
pub const TWAP_ARTIFACT_JSON: &str = r#"{
    "abi": [
        {
            "type": "constructor",
            "inputs": [{ "name": "_admin", "type": "address", "internalType": "address" }],
            "stateMutability": "nonpayable"
        }
    ],
    "bytecode": { "object": "0x6080604052348015600f57600080fd5b02" }
}"#;

/// A stablecoin logic artifact with no constructor
pub const LOGIC_ARTIFACT_JSON: &str = r#"{
    "abi": [
        {
            "type": "function",
            "name": "initialize",
            "inputs": [
                { "name": "_name", "type": "string", "internalType": "string" },
                { "name": "_symbol", "type": "string", "internalType": "string" },
                { "name": "_admin", "type": "address", "internalType": "address" },
                { "name": "_feeRecipient", "type": "address", "internalType": "address" },
                { "name": "_mintBurnFee", "type": "uint256", "internalType": "uint256" },
                { "name": "_twap", "type": "address", "internalType": "address" },
                { "name": "_collateralRatio", "type": "uint256", "internalType": "uint256" },
                { "name": "_dfxRatio", "type": "uint256", "internalType": "uint256" },
                { "name": "_pokeRatioDelta", "type": "uint256", "internalType": "uint256" }
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        }
    ],
    "bytecode": { "object": "0x6080604052348015600f57600080fd5b03" }
}"#;

/// A MUNI logic artifact with no constructor
pub const MUNI_ARTIFACT_JSON: &str = r#"{
    "abi": [
        {
            "type": "function",
            "name": "initialize",
            "inputs": [
                { "name": "_owner", "type": "address", "internalType": "address" },
                { "name": "_pool", "type": "address", "internalType": "address" },
                { "name": "_fee", "type": "uint24", "internalType": "uint24" },
                { "name": "_lowerTick", "type": "int24", "internalType": "int24" },
                { "name": "_upperTick", "type": "int24", "internalType": "int24" }
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        }
    ],
    "bytecode": { "object": "0x6080604052348015600f57600080fd5b04" }
}"#;

/// A staking rewards artifact
pub const STAKING_ARTIFACT_JSON: &str = r#"{
    "abi": [
        {
            "type": "constructor",
            "inputs": [
                { "name": "_rewardsDistribution", "type": "address", "internalType": "address" },
                { "name": "_rewardsToken", "type": "address", "internalType": "address" },
                { "name": "_stakingToken", "type": "address", "internalType": "address" }
            ],
            "stateMutability": "nonpayable"
        }
    ],
    "bytecode": { "object": "0x6080604052348015600f57600080fd5b05" }
}"#;

/// The proxy fixture
pub fn proxy_artifact() -> ContractArtifact {
    ContractArtifact::from_json("ASCUpgradableProxy", PROXY_ARTIFACT_JSON).unwrap()
}

/// The TWAP fixture
pub fn twap_artifact() -> ContractArtifact {
    ContractArtifact::from_json("DfxCadTWAP", TWAP_ARTIFACT_JSON).unwrap()
}

/// The stablecoin logic fixture
pub fn logic_artifact() -> ContractArtifact {
    ContractArtifact::from_json("DfxCadcLogic", LOGIC_ARTIFACT_JSON).unwrap()
}

/// The MUNI logic fixture
pub fn muni_artifact() -> ContractArtifact {
    ContractArtifact::from_json("MUNILogicV1", MUNI_ARTIFACT_JSON).unwrap()
}

/// The staking rewards fixture
pub fn staking_artifact() -> ContractArtifact {
    ContractArtifact::from_json("StakingRewards", STAKING_ARTIFACT_JSON).unwrap()
}

/// Write every fixture into a forge-style `out/` directory
pub fn write_artifacts(root: &std::path::Path) {
    let fixtures = [
        ("ASCUpgradableProxy", PROXY_ARTIFACT_JSON),
        ("DfxCadTWAP", TWAP_ARTIFACT_JSON),
        ("DfxCadcLogic", LOGIC_ARTIFACT_JSON),
        ("MUNILogicV1", MUNI_ARTIFACT_JSON),
        ("StakingRewards", STAKING_ARTIFACT_JSON),
    ];
    for (name, json) in fixtures {
        let dir = root.join(format!("{name}.sol"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{name}.json")), json).unwrap();
    }
}
