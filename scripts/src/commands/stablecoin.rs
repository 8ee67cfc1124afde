//! Deployment of the stablecoin: its TWAP oracle, logic, and proxy

use std::sync::Arc;

use alloy::sol_types::SolCall;
use tracing::info;

use super::{ScriptContext, ScriptOutput, ACCESS_CONTROLLER, GOVERNANCE, TREASURY};
use crate::{
    artifacts::ContractArtifact,
    cli::DeployLogicArgs,
    client::ChainClient,
    config::StablecoinGas,
    constants::{INITIALIZER_FUNCTION, LOGIC_KEY, PROXY_KEY, TWAP_KEY},
    errors::ScriptError,
    pipeline::{ArgSource, DeployStep, DeploymentPlan},
    record::DeploymentRecord,
    solidity::IStablecoinLogic,
};

/// Deploy the TWAP (unless one is configured), the logic, and a proxy that
/// initializes the logic in its constructor
pub async fn deploy_stablecoin<C: ChainClient>(
    client: &C,
    ctx: &ScriptContext,
) -> Result<ScriptOutput, ScriptError> {
    let multisigs = ctx.config.multisigs()?;
    let stablecoin = ctx.config.stablecoin()?;
    let ratios = stablecoin.ratios()?;

    let logic = Arc::new(ctx.artifacts.load(&stablecoin.logic_artifact)?);
    let proxy = Arc::new(ctx.artifacts.load(&stablecoin.proxy_artifact)?);

    let mut plan = DeploymentPlan::new()
        .with_external(GOVERNANCE, multisigs.governance)
        .with_external(ACCESS_CONTROLLER, multisigs.access_controller)
        .with_external(TREASURY, multisigs.treasury);

    // An existing TWAP is referenced from outside the plan, a new one is its first step
    let twap = match stablecoin.existing_twap {
        Some(existing) => {
            info!("reusing TWAP at {existing:#x}");
            plan = plan.with_external(TWAP_KEY, existing);
            ArgSource::external(TWAP_KEY)
        }
        None => {
            let twap_artifact = Arc::new(ctx.artifacts.load(&stablecoin.twap_artifact)?);
            let admin = ArgSource::external(ACCESS_CONTROLLER);
            plan = plan.with_step(
                DeployStep::new(TWAP_KEY, twap_artifact, vec![admin])
                    .with_options(stablecoin.gas.twap),
            );
            ArgSource::role(TWAP_KEY)
        }
    };

    let initializer_args = vec![
        ArgSource::string(&stablecoin.name),
        ArgSource::string(&stablecoin.symbol),
        ArgSource::external(ACCESS_CONTROLLER),
        ArgSource::external(TREASURY),
        ArgSource::uint(ratios.mint_burn_fee),
        twap,
        ArgSource::uint(ratios.collateral_ratio),
        ArgSource::uint(ratios.dfx_ratio),
        ArgSource::uint(ratios.poke_ratio_delta),
    ];
    check_initializer(&logic, initializer_args.len())?;

    let plan = plan
        .with_step(
            DeployStep::new(LOGIC_KEY, logic.clone(), vec![]).with_options(stablecoin.gas.logic),
        )
        .with_step(
            DeployStep::new(
                PROXY_KEY,
                proxy,
                vec![
                    ArgSource::role(LOGIC_KEY),
                    ArgSource::external(GOVERNANCE),
                    ArgSource::initializer(logic, INITIALIZER_FUNCTION, initializer_args),
                ],
            )
            .with_options(stablecoin.gas.proxy),
        );

    let outcome = plan.execute(client).await?;

    let mut record = DeploymentRecord::new();
    outcome.record_into(&mut record);
    if let Some(existing) = stablecoin.existing_twap {
        record.set_address(TWAP_KEY, existing);
    }

    info!(
        "{} deployed: proxy {:#x}",
        stablecoin.symbol,
        outcome.address(PROXY_KEY)?
    );
    Ok((record, stablecoin.record_suffix()))
}

/// Fail unless the logic's initializer is the stablecoin's
/// `initialize(string,string,address,address,uint256,address,uint256,uint256,uint256)`
fn check_initializer(logic: &ContractArtifact, arity: usize) -> Result<(), ScriptError> {
    let initialize = logic.function(INITIALIZER_FUNCTION, arity)?;
    if initialize.selector().0 != IStablecoinLogic::initializeCall::SELECTOR {
        return Err(ScriptError::Configuration(format!(
            "{} initializer is `{}`, expected `{}`",
            logic.name,
            initialize.signature(),
            IStablecoinLogic::initializeCall::SIGNATURE
        )));
    }
    Ok(())
}

/// Deploy a new logic implementation, to be installed behind an existing proxy
pub async fn deploy_logic<C: ChainClient>(
    args: DeployLogicArgs,
    client: &C,
    ctx: &ScriptContext,
) -> Result<ScriptOutput, ScriptError> {
    let configured = ctx.config.stablecoin().ok();
    let name = match (args.artifact, configured) {
        (Some(name), _) => name,
        (None, Some(stablecoin)) => stablecoin.logic_artifact.clone(),
        (None, None) => {
            return Err(ScriptError::Configuration(
                "no logic artifact given and no `stablecoin` section configured".to_string(),
            ))
        }
    };
    let options = configured.map(|s| s.gas.logic).unwrap_or(StablecoinGas::default().logic);

    let logic = Arc::new(ctx.artifacts.load(&name)?);
    let outcome = DeploymentPlan::new()
        .with_step(DeployStep::new(LOGIC_KEY, logic, vec![]).with_options(options))
        .execute(client)
        .await?;

    let mut record = DeploymentRecord::new();
    outcome.record_into(&mut record);
    Ok((record, format!("deployed_{}", name.to_lowercase())))
}
