//! Minting MUNI LP tokens from the deployer's stablecoin and collateral

use alloy::primitives::{
    utils::{format_units, parse_units, ParseUnits},
    U256,
};
use tracing::info;

use super::{ScriptContext, ScriptOutput};
use crate::{
    cli::ProvideLiquidityArgs,
    client::ChainClient,
    constants::{LP_BALANCE_KEY, LP_MINTED_KEY, MUNI_PROXY_KEY, RATIO_DECIMALS},
    errors::ScriptError,
    executor::{read, send_call},
    record::DeploymentRecord,
    solidity::{IMuniLogic, IERC20},
    types::TransactionOptions,
};

/// Approve both pool tokens to the MUNI proxy, mint LP tokens to the deployer,
/// and record the resulting LP balance
pub async fn provide_liquidity<C: ChainClient>(
    args: ProvideLiquidityArgs,
    client: &C,
    ctx: &ScriptContext,
) -> Result<ScriptOutput, ScriptError> {
    let pool_cfg = ctx.config.muni_pool()?;
    if args.muni_proxy.is_zero() {
        return Err(ScriptError::Configuration("MUNI proxy is the zero address".to_string()));
    }
    let mint_amount = parse_lp_amount(&args.amount)?;
    let sender = client.sender();

    for token in [pool_cfg.stablecoin.address, pool_cfg.collateral.address] {
        let approve = IERC20::approveCall {
            spender: args.muni_proxy,
            value: U256::MAX,
        };
        send_call(client, token, approve, TransactionOptions::default()).await?;
    }

    let mint = IMuniLogic::mintCall {
        mintAmount: mint_amount,
        receiver: sender,
    };
    send_call(client, args.muni_proxy, mint, TransactionOptions::default()).await?;

    let balance = read(
        client,
        args.muni_proxy,
        IMuniLogic::balanceOfCall { account: sender },
    )
    .await?;
    let formatted = format_units(balance, RATIO_DECIMALS)
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    info!("MUNI LP balance: {formatted}");

    let mut record = DeploymentRecord::new();
    record
        .set_address(MUNI_PROXY_KEY, args.muni_proxy)
        .set_value(LP_MINTED_KEY, args.amount.trim())
        .set_value(LP_BALANCE_KEY, formatted);

    Ok((
        record,
        format!("provide_liquidity_{}", pool_cfg.pair_name.to_lowercase()),
    ))
}

/// Parse a positive LP amount given in whole tokens
fn parse_lp_amount(amount: &str) -> Result<U256, ScriptError> {
    match parse_units(amount.trim(), RATIO_DECIMALS) {
        Ok(ParseUnits::U256(value)) if !value.is_zero() => Ok(value),
        Ok(_) => Err(ScriptError::Configuration(format!(
            "LP amount `{amount}` must be positive"
        ))),
        Err(e) => Err(ScriptError::Configuration(format!("LP amount `{amount}`: {e}"))),
    }
}
