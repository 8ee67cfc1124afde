//! The Uniswap V3 pool and the MUNI contract managing a position in it

use std::sync::Arc;

use alloy::primitives::{aliases::U160, aliases::U24, Address, U256};
use tracing::{info, warn};

use super::{ScriptContext, ScriptOutput};
use crate::{
    artifacts::ContractArtifact,
    calldata::MuniInitParams,
    cli::InitializeMuniLogicArgs,
    client::ChainClient,
    config::MuniPoolConfig,
    constants::{
        INITIALIZER_FUNCTION, LOWER_TICK_KEY, MUNI_CALLDATA_KEY, MUNI_LOGIC_KEY, MUNI_PROXY_KEY,
        POOL_KEY, UPPER_TICK_KEY,
    },
    errors::ScriptError,
    executor::{read, send_call},
    pipeline::{ArgSource, DeployStep, DeploymentPlan},
    record::DeploymentRecord,
    solidity::{IUniswapV3Factory, IUniswapV3Pool, IERC20},
    ticks::{get_tick_at_sqrt_ratio, tick_for_price, unit_price_sqrt_ratio},
    types::TransactionOptions,
};

/// Stands in for the pool address while the MUNI plan is checked, before the pool exists
const UNCREATED_POOL: Address = Address::repeat_byte(0xff);

/// The decimals of the pool's tokens in pool order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PoolDecimals {
    /// The decimals of token0
    token0: u8,
    /// The decimals of token1
    token1: u8,
}

/// Create and initialize the pool, then deploy MUNI behind a proxy that
/// initializes it with a position around the configured price range
pub async fn deploy_muni_pool<C: ChainClient>(
    client: &C,
    ctx: &ScriptContext,
) -> Result<ScriptOutput, ScriptError> {
    let multisigs = ctx.config.multisigs()?;
    let pool_cfg = ctx.config.muni_pool()?;
    let muni = Arc::new(ctx.artifacts.load(&pool_cfg.muni_artifact)?);
    let proxy = Arc::new(ctx.artifacts.load(&pool_cfg.proxy_artifact)?);

    let owner = pool_cfg.owner.unwrap_or(multisigs.governance);
    let proxy_admin = pool_cfg.proxy_admin.unwrap_or_else(|| client.sender());
    let fee = pool_cfg.fee_tier;
    let fee_u24 = U24::try_from(fee.fee())
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

    // Check the MUNI deployment with the tier's spacing before the pool is created
    let expected_decimals = sorted_decimals(pool_cfg);
    let (lower, upper) = position_ticks(pool_cfg, expected_decimals, fee.tick_spacing())?;
    let expected_params = MuniInitParams {
        owner,
        pool: UNCREATED_POOL,
        fee: fee.fee(),
        lower_tick: lower,
        upper_tick: upper,
    };
    muni_plan(&muni, &proxy, &expected_params, proxy_admin, pool_cfg.gas.muni).validate()?;

    log_balances(client, pool_cfg).await?;

    info!("creating Uniswap V3 {} pool at fee tier {fee}", pool_cfg.pair_name);
    let create_pool = IUniswapV3Factory::createPoolCall {
        tokenA: pool_cfg.stablecoin.address,
        tokenB: pool_cfg.collateral.address,
        fee: fee_u24,
    };
    send_call(client, pool_cfg.factory, create_pool, pool_cfg.gas.create_pool).await?;

    let get_pool = IUniswapV3Factory::getPoolCall {
        tokenA: pool_cfg.stablecoin.address,
        tokenB: pool_cfg.collateral.address,
        fee: fee_u24,
    };
    let pool = read(client, pool_cfg.factory, get_pool).await?;
    if pool.is_zero() {
        return Err(ScriptError::ContractInteraction(
            "factory returned no pool after creation".to_string(),
        ));
    }
    info!("pool created at {pool:#x}");

    // One whole token0 for one whole token1
    let decimals = pool_decimals(client, pool, pool_cfg).await?;
    let sqrt_price = unit_price_sqrt_ratio(decimals.token0, decimals.token1)?;
    let initial_tick = get_tick_at_sqrt_ratio(sqrt_price)?;
    info!("initializing pool at sqrt price {sqrt_price} (tick {initial_tick})");
    let initialize = IUniswapV3Pool::initializeCall {
        sqrtPriceX96: to_u160(sqrt_price)?,
    };
    send_call(client, pool, initialize, pool_cfg.gas.pool_setup).await?;

    let cardinality = IUniswapV3Pool::increaseObservationCardinalityNextCall {
        observationCardinalityNext: pool_cfg.observation_cardinality,
    };
    send_call(client, pool, cardinality, pool_cfg.gas.pool_setup).await?;

    let spacing = read_tick_spacing(client, pool).await?;
    if spacing != fee.tick_spacing() {
        warn!(
            "pool tick spacing {spacing} differs from the {} expected for fee tier {fee}",
            fee.tick_spacing()
        );
    }
    let (lower_tick, upper_tick) = position_ticks(pool_cfg, decimals, spacing)?;
    info!("MUNI position ticks: [{lower_tick}, {upper_tick}]");

    let params = MuniInitParams {
        owner,
        pool,
        fee: fee.fee(),
        lower_tick,
        upper_tick,
    };
    let outcome = muni_plan(&muni, &proxy, &params, proxy_admin, pool_cfg.gas.muni)
        .execute(client)
        .await?;

    let mut record = DeploymentRecord::new();
    record.set_address(POOL_KEY, pool);
    outcome.record_into(&mut record);
    record
        .set_value(LOWER_TICK_KEY, lower_tick)
        .set_value(UPPER_TICK_KEY, upper_tick)
        .set_calldata(MUNI_CALLDATA_KEY, params.archive());

    Ok((record, pool_cfg.record_suffix()))
}

/// Initialize a MUNI logic contract deployed without a proxy against an existing pool
pub async fn initialize_muni_logic<C: ChainClient>(
    args: InitializeMuniLogicArgs,
    client: &C,
    ctx: &ScriptContext,
) -> Result<ScriptOutput, ScriptError> {
    let multisigs = ctx.config.multisigs()?;
    let pool_cfg = ctx.config.muni_pool()?;
    for (address, name) in [(args.muni_logic, "MUNI logic"), (args.pool, "pool")] {
        if address.is_zero() {
            return Err(ScriptError::Configuration(format!("{name} is the zero address")));
        }
    }

    let decimals = pool_decimals(client, args.pool, pool_cfg).await?;
    let spacing = read_tick_spacing(client, args.pool).await?;
    let (lower_tick, upper_tick) = position_ticks(pool_cfg, decimals, spacing)?;

    let params = MuniInitParams {
        owner: pool_cfg.owner.unwrap_or(multisigs.governance),
        pool: args.pool,
        fee: pool_cfg.fee_tier.fee(),
        lower_tick,
        upper_tick,
    };
    send_call(
        client,
        args.muni_logic,
        params.initialize_call()?,
        TransactionOptions::default(),
    )
    .await?;
    info!(
        "MUNI logic {:#x} initialized with ticks [{lower_tick}, {upper_tick}]",
        args.muni_logic
    );

    let mut record = DeploymentRecord::new();
    record
        .set_address(MUNI_LOGIC_KEY, args.muni_logic)
        .set_address(POOL_KEY, args.pool)
        .set_value(LOWER_TICK_KEY, lower_tick)
        .set_value(UPPER_TICK_KEY, upper_tick)
        .set_calldata(MUNI_CALLDATA_KEY, params.archive());

    Ok((
        record,
        format!("initialized_muni_{}", pool_cfg.pair_name.to_lowercase()),
    ))
}

/// The MUNI logic followed by a proxy that calls its initializer
fn muni_plan(
    muni: &Arc<ContractArtifact>,
    proxy: &Arc<ContractArtifact>,
    params: &MuniInitParams,
    proxy_admin: Address,
    options: TransactionOptions,
) -> DeploymentPlan {
    let initializer_args = params.to_values().into_iter().map(ArgSource::Value).collect();

    DeploymentPlan::new()
        .with_step(DeployStep::new(MUNI_LOGIC_KEY, muni.clone(), vec![]).with_options(options))
        .with_step(
            DeployStep::new(
                MUNI_PROXY_KEY,
                proxy.clone(),
                vec![
                    ArgSource::role(MUNI_LOGIC_KEY),
                    ArgSource::address(proxy_admin),
                    ArgSource::initializer(muni.clone(), INITIALIZER_FUNCTION, initializer_args),
                ],
            )
            .with_options(options),
        )
}

/// The lower and upper ticks of the configured price range
fn position_ticks(
    pool_cfg: &MuniPoolConfig,
    decimals: PoolDecimals,
    spacing: i32,
) -> Result<(i32, i32), ScriptError> {
    let lower = tick_for_price(pool_cfg.lower_price, decimals.token0, decimals.token1, spacing)?;
    let upper = tick_for_price(pool_cfg.upper_price, decimals.token0, decimals.token1, spacing)?;
    if lower >= upper {
        return Err(ScriptError::PoolMath(format!(
            "price range rounds to an empty tick range [{lower}, {upper}] at spacing {spacing}"
        )));
    }
    Ok((lower, upper))
}

/// The decimals in the order the factory sorts the tokens, lower address first
fn sorted_decimals(pool_cfg: &MuniPoolConfig) -> PoolDecimals {
    let (stable, collateral) = (pool_cfg.stablecoin, pool_cfg.collateral);
    if stable.address < collateral.address {
        PoolDecimals {
            token0: stable.decimals,
            token1: collateral.decimals,
        }
    } else {
        PoolDecimals {
            token0: collateral.decimals,
            token1: stable.decimals,
        }
    }
}

/// The decimals of the pool's tokens, ordered by the pool's own `token0`
async fn pool_decimals<C: ChainClient>(
    client: &C,
    pool: Address,
    pool_cfg: &MuniPoolConfig,
) -> Result<PoolDecimals, ScriptError> {
    let token0 = read(client, pool, IUniswapV3Pool::token0Call {}).await?;
    let (stable, collateral) = (pool_cfg.stablecoin, pool_cfg.collateral);

    if token0 == stable.address {
        Ok(PoolDecimals {
            token0: stable.decimals,
            token1: collateral.decimals,
        })
    } else if token0 == collateral.address {
        Ok(PoolDecimals {
            token0: collateral.decimals,
            token1: stable.decimals,
        })
    } else {
        Err(ScriptError::ContractInteraction(format!(
            "pool {pool:#x} token0 {token0:#x} is not a configured token"
        )))
    }
}

/// The tick spacing of a pool
async fn read_tick_spacing<C: ChainClient>(client: &C, pool: Address) -> Result<i32, ScriptError> {
    let spacing = read(client, pool, IUniswapV3Pool::tickSpacingCall {}).await?;
    Ok(spacing.as_i32())
}

/// Log the deployer's balance of both pool tokens, which also checks that both tokens exist
async fn log_balances<C: ChainClient>(
    client: &C,
    pool_cfg: &MuniPoolConfig,
) -> Result<(), ScriptError> {
    for token in [pool_cfg.stablecoin, pool_cfg.collateral] {
        let balance = read(
            client,
            token.address,
            IERC20::balanceOfCall {
                account: client.sender(),
            },
        )
        .await?;
        info!(
            "deployer balance of {:#x}: {balance} ({} decimals)",
            token.address, token.decimals
        );
    }
    Ok(())
}

/// Narrow a sqrt price to the `uint160` the pool takes
fn to_u160(sqrt_price: U256) -> Result<U160, ScriptError> {
    if sqrt_price.bit_len() > 160 {
        return Err(ScriptError::PoolMath(format!(
            "sqrt price {sqrt_price} does not fit in 160 bits"
        )));
    }
    Ok(sqrt_price.to::<U160>())
}
