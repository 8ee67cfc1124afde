//! Implementations of the various deploy scripts

mod liquidity;
mod muni;
mod proxy_admin;
mod stablecoin;
mod staking;

pub use liquidity::provide_liquidity;
pub use muni::{deploy_muni_pool, initialize_muni_logic};
pub use proxy_admin::transfer_proxy_admin;
pub use stablecoin::{deploy_logic, deploy_stablecoin};
pub use staking::deploy_staking_rewards;

use crate::{artifacts::ArtifactStore, config::DeploymentConfig, record::DeploymentRecord};

/// The name under which the governance multisig is supplied to a plan
const GOVERNANCE: &str = "governance";
/// The name under which the access controller multisig is supplied to a plan
const ACCESS_CONTROLLER: &str = "accessController";
/// The name under which the treasury multisig is supplied to a plan
const TREASURY: &str = "treasury";

/// Everything a script reads besides the chain
pub struct ScriptContext {
    /// The deployment configuration
    pub config: DeploymentConfig,
    /// The compiled contracts
    pub artifacts: ArtifactStore,
}

/// The record a script produced and the suffix of the file it is written to
pub type ScriptOutput = (DeploymentRecord, String);
