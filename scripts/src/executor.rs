//! The deployment executor: one creation transaction in, one confirmed contract out

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, TxHash},
    sol_types::SolCall,
};
use tracing::{debug, info};

use crate::{
    artifacts::ContractArtifact,
    client::ChainClient,
    errors::ScriptError,
    types::{DeploymentRequest, DeploymentResult, TransactionOptions, TransactionSubmission},
};

/// A compiled contract bound to the client that signs its creation transaction
pub struct ContractFactory<'a, C: ChainClient> {
    /// The artifact to deploy
    artifact: &'a ContractArtifact,
    /// The client used to submit the creation transaction
    client: &'a C,
}

impl<'a, C: ChainClient> ContractFactory<'a, C> {
    /// Bind an artifact to a client
    pub fn new(artifact: &'a ContractArtifact, client: &'a C) -> Self {
        Self { artifact, client }
    }

    /// The artifact this factory deploys
    pub fn artifact(&self) -> &ContractArtifact {
        self.artifact
    }

    /// Deploy the contract with the given constructor arguments
    pub async fn deploy(
        &self,
        args: Vec<DynSolValue>,
        options: TransactionOptions,
    ) -> Result<DeploymentResult, ScriptError> {
        let request = DeploymentRequest::new(self.artifact.name.clone(), args, options);
        deploy_contract(self.client, self.artifact, &request).await
    }
}

/// Submit a contract-creation transaction and wait for it to be mined.
///
/// The returned address is only produced from a successful receipt, so a
/// caller never observes the address of a contract that failed to deploy.
pub async fn deploy_contract<C: ChainClient>(
    client: &C,
    artifact: &ContractArtifact,
    request: &DeploymentRequest,
) -> Result<DeploymentResult, ScriptError> {
    let name = request.contract_name();
    let creation_code = artifact.creation_code(request.constructor_args())?;

    debug!("deploying {name} ({} bytes of creation code)", creation_code.len());
    let submission = TransactionSubmission::create(creation_code, request.options());
    let tx_hash = client
        .submit(submission)
        .await
        .map_err(|e| with_context(e, &format!("deploying {name}")))?;

    let confirmed = client.wait_for_confirmation(tx_hash).await?;
    if !confirmed.success {
        return Err(ScriptError::TransactionFailure(format!(
            "creation of {name} reverted in {:#x}",
            confirmed.tx_hash
        )));
    }
    let address = confirmed.contract_address.ok_or_else(|| {
        ScriptError::TransactionFailure(format!(
            "receipt of {:#x} has no contract address for {name}",
            confirmed.tx_hash
        ))
    })?;

    info!(
        contract = name,
        tx_hash = %confirmed.tx_hash,
        "{name} deployed at {address:#x}"
    );

    Ok(DeploymentResult {
        contract_name: name.to_string(),
        address,
        tx_hash: confirmed.tx_hash,
    })
}

/// Send a state-changing call and wait for it to be mined successfully
pub async fn send_call<C: ChainClient, T: SolCall>(
    client: &C,
    to: Address,
    call: T,
    options: TransactionOptions,
) -> Result<TxHash, ScriptError> {
    let submission = TransactionSubmission::call(to, call.abi_encode().into(), options);
    let tx_hash = client
        .submit(submission)
        .await
        .map_err(|e| with_context(e, &format!("calling {} on {to:#x}", T::SIGNATURE)))?;

    let confirmed = client.wait_for_confirmation(tx_hash).await?;
    if !confirmed.success {
        return Err(ScriptError::TransactionFailure(format!(
            "{} on {to:#x} reverted in {:#x}",
            T::SIGNATURE,
            confirmed.tx_hash
        )));
    }

    debug!("{} on {to:#x} confirmed in {:#x}", T::SIGNATURE, confirmed.tx_hash);
    Ok(confirmed.tx_hash)
}

/// Execute a read-only call and decode its return value
pub async fn read<C: ChainClient, T: SolCall>(
    client: &C,
    to: Address,
    call: T,
) -> Result<T::Return, ScriptError> {
    let output = client.call(to, call.abi_encode().into()).await?;
    T::abi_decode_returns(&output).map_err(|e| {
        ScriptError::ContractInteraction(format!("decoding {} from {to:#x}: {e}", T::SIGNATURE))
    })
}

/// Prefix a transaction failure with what was being attempted
fn with_context(err: ScriptError, action: &str) -> ScriptError {
    match err {
        ScriptError::TransactionFailure(msg) => {
            ScriptError::TransactionFailure(format!("{action}: {msg}"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, TxKind};

    use super::*;
    use crate::{
        solidity::IUniswapV3Pool,
        test_helpers::{logic_artifact, mock_address, mock_tx_hash, twap_artifact, MockChain},
    };

    #[tokio::test]
    async fn test_deploy_returns_confirmed_address() {
        let chain = MockChain::new();
        let artifact = logic_artifact();
        let factory = ContractFactory::new(&artifact, &chain);

        let result = factory
            .deploy(vec![], TransactionOptions::with_gas_limit(3_040_761))
            .await
            .unwrap();

        assert_eq!(result.address, mock_address(1));
        assert_eq!(result.tx_hash, mock_tx_hash(1));
        assert_eq!(result.contract_name, "DfxCadcLogic");

        let submissions = chain.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].kind, TxKind::Create);
        assert_eq!(submissions[0].input, artifact.bytecode);
        assert_eq!(submissions[0].options.gas_limit, Some(3_040_761));
    }

    #[tokio::test]
    async fn test_rejected_deploy_fails() {
        let chain = MockChain::new().reject_submission(0);
        let artifact = logic_artifact();

        let err = ContractFactory::new(&artifact, &chain)
            .deploy(vec![], TransactionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::TransactionFailure(_)));
    }

    #[tokio::test]
    async fn test_reverted_deploy_fails() {
        let chain = MockChain::new().revert_submission(0);
        let artifact = logic_artifact();

        let err = ContractFactory::new(&artifact, &chain)
            .deploy(vec![], TransactionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::TransactionFailure(_)));
    }

    #[tokio::test]
    async fn test_bad_args_never_submitted() {
        let chain = MockChain::new();
        let artifact = twap_artifact();

        let err = ContractFactory::new(&artifact, &chain)
            .deploy(vec![], TransactionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::CalldataConstruction(_)));
        assert!(chain.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_read_decodes_return() {
        let pool = Address::repeat_byte(0x42);
        let chain = MockChain::new().respond_int::<IUniswapV3Pool::tickSpacingCall>(pool, 60);

        let spacing = read(&chain, pool, IUniswapV3Pool::tickSpacingCall {})
            .await
            .unwrap();
        assert_eq!(spacing.as_i32(), 60);
    }

    #[tokio::test]
    async fn test_reverted_call_fails() {
        let chain = MockChain::new().revert_submission(0);
        let pool = Address::repeat_byte(0x42);

        let err = send_call(
            &chain,
            pool,
            IUniswapV3Pool::increaseObservationCardinalityNextCall {
                observationCardinalityNext: 5,
            },
            TransactionOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ScriptError::TransactionFailure(_)));
    }
}
