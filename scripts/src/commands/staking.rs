//! Deployment of a staking rewards contract for MUNI LP tokens

use std::sync::Arc;

use super::{ScriptContext, ScriptOutput, TREASURY};
use crate::{
    client::ChainClient,
    constants::STAKING_REWARDS_KEY,
    errors::ScriptError,
    pipeline::{ArgSource, DeployStep, DeploymentPlan},
    record::DeploymentRecord,
};

/// Deploy `StakingRewards(rewardsDistribution, rewardsToken, stakingToken)`
pub async fn deploy_staking_rewards<C: ChainClient>(
    client: &C,
    ctx: &ScriptContext,
) -> Result<ScriptOutput, ScriptError> {
    let staking = ctx.config.staking_rewards()?;
    let artifact = Arc::new(ctx.artifacts.load(&staking.artifact)?);

    // Rewards are funded by the treasury unless another distributor is configured
    let (plan, distribution) = match staking.rewards_distribution {
        Some(distribution) => (DeploymentPlan::new(), ArgSource::address(distribution)),
        None => {
            let treasury = ctx.config.multisigs()?.treasury;
            (
                DeploymentPlan::new().with_external(TREASURY, treasury),
                ArgSource::external(TREASURY),
            )
        }
    };

    let outcome = plan
        .with_step(
            DeployStep::new(
                STAKING_REWARDS_KEY,
                artifact,
                vec![
                    distribution,
                    ArgSource::address(staking.rewards_token),
                    ArgSource::address(staking.staking_token),
                ],
            )
            .with_options(staking.gas),
        )
        .execute(client)
        .await?;

    let mut record = DeploymentRecord::new();
    outcome.record_into(&mut record);
    Ok((record, staking.record_suffix()))
}

#[cfg(test)]
mod tests {
    use alloy::{dyn_abi::DynSolValue, primitives::Address, sol_types::SolValue};

    use super::*;
    use crate::{
        artifacts::ArtifactStore,
        config::{tests::SAMPLE_CONFIG, DeploymentConfig},
        constants::STAKING_DEPLOY_GAS_LIMIT,
        test_helpers::{mock_address, staking_artifact, write_artifacts, MockChain},
    };

    #[tokio::test]
    async fn test_deploy_staking_rewards() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        let ctx = ScriptContext {
            config: DeploymentConfig::from_json(SAMPLE_CONFIG).unwrap(),
            artifacts: ArtifactStore::new(dir.path()),
        };
        let chain = MockChain::new();

        let (record, suffix) = deploy_staking_rewards(&chain, &ctx).await.unwrap();

        assert_eq!(suffix, "muni-dfxsgd_staking_rewards");
        assert_eq!(record.address(STAKING_REWARDS_KEY), Some(mock_address(1)));
        assert_eq!(chain.submissions()[0].options.gas_limit, Some(STAKING_DEPLOY_GAS_LIMIT));

        // Archived as `(treasury, rewardsToken, stakingToken)`
        let staking = ctx.config.staking_rewards().unwrap();
        let treasury = ctx.config.multisigs().unwrap().treasury;
        let (distribution, rewards, staked) = <(Address, Address, Address)>::abi_decode_params(
            record.calldata(STAKING_REWARDS_KEY).unwrap(),
        )
        .unwrap();
        assert_eq!(distribution, treasury);
        assert_eq!(rewards, staking.rewards_token);
        assert_eq!(staked, staking.staking_token);

        // The creation code is the bytecode followed by the archived arguments
        let args = [
            DynSolValue::Address(treasury),
            DynSolValue::Address(rewards),
            DynSolValue::Address(staked),
        ];
        let expected = staking_artifact().creation_code(&args).unwrap();
        assert_eq!(chain.submissions()[0].input, expected);
    }

    #[tokio::test]
    async fn test_missing_section_submits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        let ctx = ScriptContext {
            config: DeploymentConfig::default(),
            artifacts: ArtifactStore::new(dir.path()),
        };
        let chain = MockChain::new();

        let err = deploy_staking_rewards(&chain, &ctx).await.unwrap_err();
        assert!(matches!(err, ScriptError::Configuration(_)));
        assert!(chain.submissions().is_empty());
    }
}
