//! Transfer of an upgradable proxy's admin rights

use tracing::info;

use super::{ScriptContext, ScriptOutput};
use crate::{
    cli::TransferProxyAdminArgs,
    client::ChainClient,
    constants::{NEW_ADMIN_KEY, OLD_ADMIN_KEY, PROXY_KEY},
    errors::ScriptError,
    executor::{read, send_call},
    record::DeploymentRecord,
    solidity::IAscUpgradableProxy,
    types::TransactionOptions,
};

/// Change the admin of a proxy, typically from the deployer to the governance multisig
pub async fn transfer_proxy_admin<C: ChainClient>(
    args: TransferProxyAdminArgs,
    client: &C,
    ctx: &ScriptContext,
) -> Result<ScriptOutput, ScriptError> {
    let new_admin = match args.new_admin {
        Some(admin) => admin,
        None => ctx.config.multisigs()?.governance,
    };
    if args.proxy.is_zero() || new_admin.is_zero() {
        return Err(ScriptError::Configuration(
            "proxy and new admin must be non-zero addresses".to_string(),
        ));
    }

    let old_admin = read(client, args.proxy, IAscUpgradableProxy::getAdminCall {}).await?;
    send_call(
        client,
        args.proxy,
        IAscUpgradableProxy::changeAdminCall {
            newAdmin: new_admin,
        },
        TransactionOptions::default(),
    )
    .await?;

    let current_admin = read(client, args.proxy, IAscUpgradableProxy::getAdminCall {}).await?;
    if current_admin != new_admin {
        return Err(ScriptError::ContractInteraction(format!(
            "proxy {:#x} reports admin {current_admin:#x} after changing it to {new_admin:#x}",
            args.proxy
        )));
    }
    info!("proxy admin updated from {old_admin:#x} -> {current_admin:#x}");

    let mut record = DeploymentRecord::new();
    record
        .set_address(PROXY_KEY, args.proxy)
        .set_address(OLD_ADMIN_KEY, old_admin)
        .set_address(NEW_ADMIN_KEY, current_admin);

    Ok((record, format!("proxy_admin_{:#x}", args.proxy)))
}
