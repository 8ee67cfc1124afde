//! The chain client used by the scripts to submit and observe transactions

use std::str::FromStr;

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, TxKind},
    providers::{DynProvider, PendingTransactionConfig, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    errors::ScriptError,
    types::{ConfirmedTransaction, TransactionSubmission},
};

/// The capabilities the scripts need from a chain node
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The address that signs submitted transactions
    fn sender(&self) -> Address;

    /// Sign and submit a transaction, returning its hash once the node accepts it
    async fn submit(&self, tx: TransactionSubmission) -> Result<TxHash, ScriptError>;

    /// Wait until the transaction with the given hash is mined
    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> Result<ConfirmedTransaction, ScriptError>;

    /// Execute a read-only call against the latest block
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, ScriptError>;
}

/// A [`ChainClient`] backed by an HTTP JSON-RPC node and a local private key
#[derive(Clone)]
pub struct RpcChainClient {
    /// The wallet-enabled provider
    provider: DynProvider,
    /// The address of the local signer
    sender: Address,
    /// The number of confirmations to wait for on every transaction
    confirmations: u64,
}

/// Sets up the client with which the scripts submit transactions, reading in
/// the private key and RPC url given on the command line
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
    confirmations: u64,
) -> Result<RpcChainClient, ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let sender = signer.address();

    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);
    let provider = DynProvider::new(provider);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    info!("connected to chain {chain_id} as {sender:#x}");

    Ok(RpcChainClient {
        provider,
        sender,
        confirmations,
    })
}

impl RpcChainClient {
    /// Convert a submission into a request the provider's fillers can complete
    async fn build_request(
        &self,
        tx: TransactionSubmission,
    ) -> Result<TransactionRequest, ScriptError> {
        let TransactionSubmission {
            kind,
            input,
            options,
        } = tx;

        let mut request = match kind {
            TxKind::Create => TransactionRequest::default().with_deploy_code(input),
            TxKind::Call(to) => TransactionRequest::default().with_to(to).with_input(input),
        };
        request = request.with_from(self.sender);

        if let Some(gas_limit) = options.gas_limit {
            request = request.with_gas_limit(gas_limit);
        }
        if let Some(value) = options.value {
            request = request.with_value(value);
        }
        if let Some(max_fee) = options.max_fee_per_gas {
            // The gas filler only leaves the fee fields alone when both are set
            let priority_fee = self
                .provider
                .get_max_priority_fee_per_gas()
                .await
                .map_err(|e| ScriptError::TransactionFailure(e.to_string()))?;
            request = request
                .with_max_fee_per_gas(max_fee)
                .with_max_priority_fee_per_gas(priority_fee.min(max_fee));
        }

        Ok(request)
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn submit(&self, tx: TransactionSubmission) -> Result<TxHash, ScriptError> {
        let request = self.build_request(tx).await?;
        debug!(
            "sending transaction: to={:?}, gas_limit={:?}, data_len={}",
            request.to,
            request.gas,
            request.input.input().map(|d| d.len()).unwrap_or(0),
        );

        let pending_tx = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| ScriptError::TransactionFailure(e.to_string()))?;

        Ok(*pending_tx.tx_hash())
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> Result<ConfirmedTransaction, ScriptError> {
        let config = PendingTransactionConfig::new(tx_hash)
            .with_required_confirmations(self.confirmations);

        let confirmed_hash = self
            .provider
            .watch_pending_transaction(config)
            .await
            .map_err(|e| ScriptError::TransactionFailure(e.to_string()))?
            .await
            .map_err(|e| ScriptError::TransactionFailure(e.to_string()))?;

        let receipt = self
            .provider
            .get_transaction_receipt(confirmed_hash)
            .await
            .map_err(|e| ScriptError::TransactionFailure(e.to_string()))?
            .ok_or_else(|| {
                ScriptError::TransactionFailure(format!("no receipt for {confirmed_hash:#x}"))
            })?;

        Ok(ConfirmedTransaction {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
            contract_address: receipt.contract_address,
        })
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, ScriptError> {
        let request = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_input(calldata);

        self.provider
            .call(request)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }
}
