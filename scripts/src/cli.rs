//! Definitions of CLI arguments and commands for deploy scripts

use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};

use crate::{
    client::ChainClient,
    commands::{
        deploy_logic, deploy_muni_pool, deploy_stablecoin, deploy_staking_rewards,
        initialize_muni_logic, provide_liquidity, transfer_proxy_admin, ScriptContext,
    },
    constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_CONFIRMATIONS, DEFAULT_RPC_URL},
    errors::ScriptError,
};

/// Deploy the stablecoin contracts and their Uniswap V3 liquidity
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = "PKEY", hide_env_values = true)]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Path to the deployment configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// The directory forge writes compiled artifacts to
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// The directory deployment records are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// The number of confirmations to wait for on each transaction
    #[arg(long, default_value_t = DEFAULT_CONFIRMATIONS)]
    pub confirmations: u64,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

/// The deploy scripts
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the stablecoin's TWAP, logic and proxy
    DeployStablecoin,
    /// Deploy a new stablecoin logic implementation
    DeployLogic(DeployLogicArgs),
    /// Create and initialize the Uniswap V3 pool, then deploy MUNI behind a proxy
    DeployMuniPool,
    /// Initialize a bare MUNI logic contract against an existing pool
    InitializeMuniLogic(InitializeMuniLogicArgs),
    /// Deploy a staking rewards contract
    DeployStakingRewards,
    /// Hand a proxy's admin rights to a new account
    TransferProxyAdmin(TransferProxyAdminArgs),
    /// Mint MUNI LP tokens from the deployer's balances
    ProvideLiquidity(ProvideLiquidityArgs),
}

impl Command {
    /// Run the script, then write its deployment record into `output_dir`.
    ///
    /// The record is only written once every transaction of the script has
    /// been confirmed.
    pub async fn run<C: ChainClient>(
        self,
        client: &C,
        ctx: &ScriptContext,
        output_dir: &Path,
    ) -> Result<PathBuf, ScriptError> {
        let (record, suffix) = match self {
            Command::DeployStablecoin => deploy_stablecoin(client, ctx).await?,
            Command::DeployLogic(args) => deploy_logic(args, client, ctx).await?,
            Command::DeployMuniPool => deploy_muni_pool(client, ctx).await?,
            Command::InitializeMuniLogic(args) => initialize_muni_logic(args, client, ctx).await?,
            Command::DeployStakingRewards => deploy_staking_rewards(client, ctx).await?,
            Command::TransferProxyAdmin(args) => transfer_proxy_admin(args, client, ctx).await?,
            Command::ProvideLiquidity(args) => provide_liquidity(args, client, ctx).await?,
        };

        record.write(output_dir, &suffix)
    }
}

/// Deploy a new logic implementation for an existing proxy
#[derive(Args)]
pub struct DeployLogicArgs {
    /// The artifact to deploy, the configured stablecoin logic if unset
    #[arg(short, long)]
    pub artifact: Option<String>,
}

/// Initialize a MUNI logic contract deployed without a proxy
#[derive(Args)]
pub struct InitializeMuniLogicArgs {
    /// The MUNI logic contract
    #[arg(short, long)]
    pub muni_logic: Address,

    /// The Uniswap V3 pool the position is held in
    #[arg(short, long)]
    pub pool: Address,
}

/// Change the admin of an upgradable proxy
#[derive(Args)]
pub struct TransferProxyAdminArgs {
    /// The proxy whose admin is changed
    #[arg(short, long)]
    pub proxy: Address,

    /// The new admin, the governance multisig if unset
    #[arg(short, long)]
    pub new_admin: Option<Address>,
}

/// Mint MUNI LP tokens
#[derive(Args)]
pub struct ProvideLiquidityArgs {
    /// The MUNI proxy
    #[arg(short, long)]
    pub muni_proxy: Address,

    /// The amount of LP tokens to mint, in whole tokens
    #[arg(short, long)]
    pub amount: String,
}
