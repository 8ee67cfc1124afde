//! The deployment configuration file.
//!
//! Every address, ratio and price target a script needs is read from a JSON
//! file passed with `--config`; the scripts themselves carry no deployment
//! content. Sections are optional so that a script only requires the parts
//! of the file it actually uses.

use std::{fs, path::Path};

use alloy::primitives::{
    utils::{parse_units, ParseUnits},
    Address, U256,
};
use serde::Deserialize;

use crate::{
    constants::{
        CREATE_POOL_GAS_LIMIT, DEFAULT_MUNI_ARTIFACT, DEFAULT_OBSERVATION_CARDINALITY,
        DEFAULT_PROXY_ARTIFACT, DEFAULT_STAKING_ARTIFACT, LOGIC_DEPLOY_GAS_LIMIT,
        MUNI_DEPLOY_GAS_LIMIT, POOL_SETUP_GAS_LIMIT, PROXY_DEPLOY_GAS_LIMIT, RATIO_DECIMALS,
        STAKING_DEPLOY_GAS_LIMIT, TWAP_DEPLOY_GAS_LIMIT,
    },
    errors::ScriptError,
    ticks::{FeeTier, PriceRatio},
    types::TransactionOptions,
};

/// The full deployment configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DeploymentConfig {
    /// The multisigs that administer the deployed contracts
    multisigs: Option<Multisigs>,
    /// The stablecoin deployed by `deploy-stablecoin`
    stablecoin: Option<StablecoinConfig>,
    /// The pool and MUNI position manager
    muni_pool: Option<MuniPoolConfig>,
    /// The staking rewards contract
    staking_rewards: Option<StakingRewardsConfig>,
}

impl DeploymentConfig {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ScriptError::ReadFile(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Parse and validate a configuration from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ScriptError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every present section
    pub fn validate(&self) -> Result<(), ScriptError> {
        if let Some(multisigs) = &self.multisigs {
            multisigs.validate()?;
        }
        if let Some(stablecoin) = &self.stablecoin {
            stablecoin.validate()?;
        }
        if let Some(pool) = &self.muni_pool {
            pool.validate()?;
        }
        if let Some(staking) = &self.staking_rewards {
            staking.validate()?;
        }
        Ok(())
    }

    /// The multisigs section
    pub fn multisigs(&self) -> Result<&Multisigs, ScriptError> {
        section(&self.multisigs, "multisigs")
    }

    /// The stablecoin section
    pub fn stablecoin(&self) -> Result<&StablecoinConfig, ScriptError> {
        section(&self.stablecoin, "stablecoin")
    }

    /// The pool section
    pub fn muni_pool(&self) -> Result<&MuniPoolConfig, ScriptError> {
        section(&self.muni_pool, "muniPool")
    }

    /// The staking rewards section
    pub fn staking_rewards(&self) -> Result<&StakingRewardsConfig, ScriptError> {
        section(&self.staking_rewards, "stakingRewards")
    }
}

/// A required section of the configuration
fn section<'a, T>(value: &'a Option<T>, name: &str) -> Result<&'a T, ScriptError> {
    value
        .as_ref()
        .ok_or_else(|| ScriptError::Configuration(format!("missing `{name}` section")))
}

/// Reject the zero address for a named field
fn non_zero(address: Address, field: &str) -> Result<(), ScriptError> {
    if address.is_zero() {
        return Err(ScriptError::Configuration(format!("`{field}` is the zero address")));
    }
    Ok(())
}

/// Reject an empty string for a named field
fn non_empty(value: &str, field: &str) -> Result<(), ScriptError> {
    if value.trim().is_empty() {
        return Err(ScriptError::Configuration(format!("`{field}` is empty")));
    }
    Ok(())
}

// -------------
// | Multisigs |
// -------------

/// The multisigs that end up administering the deployment
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Multisigs {
    /// Governance; admin of every proxy and owner of the MUNI position
    pub governance: Address,
    /// Manages roles on the stablecoin and its TWAP
    pub access_controller: Address,
    /// Receives mint/burn fees and distributes staking rewards
    pub treasury: Address,
}

impl Multisigs {
    /// Check that no multisig is the zero address
    fn validate(&self) -> Result<(), ScriptError> {
        non_zero(self.governance, "multisigs.governance")?;
        non_zero(self.access_controller, "multisigs.accessController")?;
        non_zero(self.treasury, "multisigs.treasury")
    }
}

// --------------
// | Stablecoin |
// --------------

/// The stablecoin token, its logic, and its TWAP oracle
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StablecoinConfig {
    /// The ERC20 name
    pub name: String,
    /// The ERC20 symbol
    pub symbol: String,
    /// The artifact of the logic contract
    pub logic_artifact: String,
    /// The artifact of the TWAP oracle
    pub twap_artifact: String,
    /// The artifact of the upgradable proxy
    #[serde(default = "default_proxy_artifact")]
    pub proxy_artifact: String,
    /// An already deployed TWAP to reuse instead of deploying a new one
    #[serde(default)]
    pub existing_twap: Option<Address>,
    /// The mint/burn fee, as a decimal fraction such as `"0.005"`
    pub mint_burn_fee: String,
    /// The share of collateral backing each token, e.g. `"0.95"`
    pub collateral_ratio: String,
    /// The share of DFX backing each token, e.g. `"0.05"`
    pub dfx_ratio: String,
    /// The step by which a poke moves the ratios, e.g. `"0.005"`
    pub poke_ratio_delta: String,
    /// Overrides for the creation transactions
    #[serde(default)]
    pub gas: StablecoinGas,
}

/// The stablecoin's ratios as 18-decimal fixed point values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StablecoinRatios {
    /// The mint/burn fee
    pub mint_burn_fee: U256,
    /// The collateral ratio
    pub collateral_ratio: U256,
    /// The DFX ratio
    pub dfx_ratio: U256,
    /// The poke ratio delta
    pub poke_ratio_delta: U256,
}

impl StablecoinConfig {
    /// The ratios parsed to fixed point
    pub fn ratios(&self) -> Result<StablecoinRatios, ScriptError> {
        Ok(StablecoinRatios {
            mint_burn_fee: parse_ratio(&self.mint_burn_fee, "stablecoin.mintBurnFee")?,
            collateral_ratio: parse_ratio(&self.collateral_ratio, "stablecoin.collateralRatio")?,
            dfx_ratio: parse_ratio(&self.dfx_ratio, "stablecoin.dfxRatio")?,
            poke_ratio_delta: parse_ratio(&self.poke_ratio_delta, "stablecoin.pokeRatioDelta")?,
        })
    }

    /// The suffix of the record written after deployment
    pub fn record_suffix(&self) -> String {
        format!("deployed_{}", self.symbol.to_lowercase())
    }

    /// Check names, artifacts and ratios
    fn validate(&self) -> Result<(), ScriptError> {
        non_empty(&self.name, "stablecoin.name")?;
        non_empty(&self.symbol, "stablecoin.symbol")?;
        non_empty(&self.logic_artifact, "stablecoin.logicArtifact")?;
        non_empty(&self.twap_artifact, "stablecoin.twapArtifact")?;
        non_empty(&self.proxy_artifact, "stablecoin.proxyArtifact")?;
        if let Some(twap) = self.existing_twap {
            non_zero(twap, "stablecoin.existingTwap")?;
        }
        self.ratios().map(|_| ())
    }
}

/// Parse a decimal fraction in `[0, 1]` into an 18-decimal fixed point value
pub fn parse_ratio(value: &str, field: &str) -> Result<U256, ScriptError> {
    let parsed = parse_units(value.trim(), RATIO_DECIMALS)
        .map_err(|e| ScriptError::Configuration(format!("`{field}` = `{value}`: {e}")))?;
    let ratio = match parsed {
        ParseUnits::U256(ratio) => ratio,
        ParseUnits::I256(_) => {
            return Err(ScriptError::Configuration(format!("`{field}` is negative")));
        }
    };

    let one = U256::from(10).pow(U256::from(RATIO_DECIMALS));
    if ratio > one {
        return Err(ScriptError::Configuration(format!(
            "`{field}` = `{value}` exceeds 1"
        )));
    }
    Ok(ratio)
}

/// Overrides for the stablecoin's creation transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StablecoinGas {
    /// The TWAP deployment
    pub twap: TransactionOptions,
    /// The logic deployment
    pub logic: TransactionOptions,
    /// The proxy deployment
    pub proxy: TransactionOptions,
}

impl Default for StablecoinGas {
    fn default() -> Self {
        Self {
            twap: TransactionOptions::with_gas_limit(TWAP_DEPLOY_GAS_LIMIT),
            logic: TransactionOptions::with_gas_limit(LOGIC_DEPLOY_GAS_LIMIT),
            proxy: TransactionOptions::with_gas_limit(PROXY_DEPLOY_GAS_LIMIT),
        }
    }
}

// --------
// | Pool |
// --------

/// A token in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// The token contract
    pub address: Address,
    /// The token's decimals
    pub decimals: u8,
}

/// The Uniswap V3 pool pairing the stablecoin with its collateral, and the
/// MUNI contract managing a position in it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MuniPoolConfig {
    /// The Uniswap V3 factory
    pub factory: Address,
    /// The stablecoin
    pub stablecoin: TokenConfig,
    /// The collateral token
    pub collateral: TokenConfig,
    /// The pool's fee tier
    pub fee_tier: FeeTier,
    /// The lower bound of the position, as a `token1 / token0` price
    pub lower_price: PriceRatio,
    /// The upper bound of the position, as a `token1 / token0` price
    pub upper_price: PriceRatio,
    /// The number of observations the pool is asked to store
    #[serde(default = "default_observation_cardinality")]
    pub observation_cardinality: u16,
    /// The pair name used in the record suffix, e.g. `dfxsgd-xsgd`
    pub pair_name: String,
    /// The artifact of the MUNI logic contract
    #[serde(default = "default_muni_artifact")]
    pub muni_artifact: String,
    /// The artifact of the upgradable proxy
    #[serde(default = "default_proxy_artifact")]
    pub proxy_artifact: String,
    /// The owner of the MUNI position, governance if unset
    #[serde(default)]
    pub owner: Option<Address>,
    /// The admin of the MUNI proxy, the deployer if unset
    #[serde(default)]
    pub proxy_admin: Option<Address>,
    /// Overrides for the pool transactions
    #[serde(default)]
    pub gas: PoolGas,
}

impl MuniPoolConfig {
    /// The suffix of the record written after deployment
    pub fn record_suffix(&self) -> String {
        format!("uniswapv3_{}", self.pair_name.to_lowercase())
    }

    /// Check addresses and the price range
    fn validate(&self) -> Result<(), ScriptError> {
        non_zero(self.factory, "muniPool.factory")?;
        non_zero(self.stablecoin.address, "muniPool.stablecoin.address")?;
        non_zero(self.collateral.address, "muniPool.collateral.address")?;
        if self.stablecoin.address == self.collateral.address {
            return Err(ScriptError::Configuration(
                "muniPool stablecoin and collateral are the same token".to_string(),
            ));
        }
        non_empty(&self.pair_name, "muniPool.pairName")?;
        non_empty(&self.muni_artifact, "muniPool.muniArtifact")?;
        non_empty(&self.proxy_artifact, "muniPool.proxyArtifact")?;
        if let Some(owner) = self.owner {
            non_zero(owner, "muniPool.owner")?;
        }
        if let Some(admin) = self.proxy_admin {
            non_zero(admin, "muniPool.proxyAdmin")?;
        }
        if self.observation_cardinality == 0 {
            return Err(ScriptError::Configuration(
                "muniPool.observationCardinality must be positive".to_string(),
            ));
        }

        for (price, field) in [
            (self.lower_price, "muniPool.lowerPrice"),
            (self.upper_price, "muniPool.upperPrice"),
        ] {
            if price.numerator == 0 || price.denominator == 0 {
                return Err(ScriptError::Configuration(format!("`{field}` has a zero term")));
            }
        }
        // lower.n / lower.d < upper.n / upper.d
        let (lower_price, upper_price) = (self.lower_price, self.upper_price);
        let lower = u128::from(lower_price.numerator) * u128::from(upper_price.denominator);
        let upper = u128::from(upper_price.numerator) * u128::from(lower_price.denominator);
        if lower >= upper {
            return Err(ScriptError::Configuration(
                "muniPool.lowerPrice must be below muniPool.upperPrice".to_string(),
            ));
        }

        Ok(())
    }
}

/// Overrides for the pool and MUNI transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PoolGas {
    /// The factory's `createPool`
    pub create_pool: TransactionOptions,
    /// Pool initialization and cardinality calls
    pub pool_setup: TransactionOptions,
    /// The MUNI logic and proxy deployments
    pub muni: TransactionOptions,
}

impl Default for PoolGas {
    fn default() -> Self {
        Self {
            create_pool: TransactionOptions::with_gas_limit(CREATE_POOL_GAS_LIMIT),
            pool_setup: TransactionOptions::with_gas_limit(POOL_SETUP_GAS_LIMIT),
            muni: TransactionOptions::with_gas_limit(MUNI_DEPLOY_GAS_LIMIT),
        }
    }
}

// -------------------
// | Staking Rewards |
// -------------------

/// A staking rewards contract paying out in `rewardsToken` for staking `stakingToken`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StakingRewardsConfig {
    /// The name used in the record suffix, e.g. `muni-dfxsgd`
    pub name: String,
    /// The account allowed to fund rewards, the treasury if unset
    #[serde(default)]
    pub rewards_distribution: Option<Address>,
    /// The token rewards are paid in
    pub rewards_token: Address,
    /// The token that is staked, usually a MUNI LP token
    pub staking_token: Address,
    /// The artifact of the staking contract
    #[serde(default = "default_staking_artifact")]
    pub artifact: String,
    /// Overrides for the creation transaction
    #[serde(default = "default_staking_gas")]
    pub gas: TransactionOptions,
}

impl StakingRewardsConfig {
    /// The suffix of the record written after deployment
    pub fn record_suffix(&self) -> String {
        format!("{}_staking_rewards", self.name.to_lowercase())
    }

    /// Check names and addresses
    fn validate(&self) -> Result<(), ScriptError> {
        non_empty(&self.name, "stakingRewards.name")?;
        non_empty(&self.artifact, "stakingRewards.artifact")?;
        non_zero(self.rewards_token, "stakingRewards.rewardsToken")?;
        non_zero(self.staking_token, "stakingRewards.stakingToken")?;
        if let Some(distribution) = self.rewards_distribution {
            non_zero(distribution, "stakingRewards.rewardsDistribution")?;
        }
        Ok(())
    }
}

/// Serde default for proxy artifacts
fn default_proxy_artifact() -> String {
    DEFAULT_PROXY_ARTIFACT.to_string()
}

/// Serde default for the MUNI artifact
fn default_muni_artifact() -> String {
    DEFAULT_MUNI_ARTIFACT.to_string()
}

/// Serde default for the staking artifact
fn default_staking_artifact() -> String {
    DEFAULT_STAKING_ARTIFACT.to_string()
}

/// Serde default for the observation cardinality
fn default_observation_cardinality() -> u16 {
    DEFAULT_OBSERVATION_CARDINALITY
}

/// Serde default for the staking deployment
fn default_staking_gas() -> TransactionOptions {
    TransactionOptions::with_gas_limit(STAKING_DEPLOY_GAS_LIMIT)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A configuration covering every section
    pub(crate) const SAMPLE_CONFIG: &str = r#"{
        "multisigs": {
            "governance": "0x27E843260c71443b4CC8cB6bF226C3f77b9695AF",
            "accessController": "0xc9f05fa7049b32712c5d6675ebded167150475c4",
            "treasury": "0x26f539A0fE189A7f228D7982BF10Bc294FA9070c"
        },
        "stablecoin": {
            "name": "dfxCADC",
            "symbol": "DFXCADC",
            "logicArtifact": "DfxCadcLogic",
            "twapArtifact": "DfxCadTWAP",
            "mintBurnFee": "0.005",
            "collateralRatio": "0.95",
            "dfxRatio": "0.05",
            "pokeRatioDelta": "0.005"
        },
        "muniPool": {
            "factory": "0x1F98431c8aD98523631AE4a59f267346ea31F984",
            "stablecoin": { "address": "0x52dDdA10eb0abdb34528329C4aF16d218AB95bD1", "decimals": 18 },
            "collateral": { "address": "0x70e8dE73cE538DA2bEEd35d14187F6959a8ecA96", "decimals": 6 },
            "feeTier": 100,
            "lowerPrice": { "numerator": 980, "denominator": 1000 },
            "upperPrice": { "numerator": 1020, "denominator": 1000 },
            "pairName": "dfxSGD-XSGD"
        },
        "stakingRewards": {
            "name": "muni-dfxsgd",
            "rewardsToken": "0x888888435fde8e7d4c54cab67f206e4199454c60",
            "stakingToken": "0x9b4e383192a089C8177f5E1293FC037956Cfd884"
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = DeploymentConfig::from_json(SAMPLE_CONFIG).unwrap();

        let stablecoin = config.stablecoin().unwrap();
        assert_eq!(stablecoin.proxy_artifact, DEFAULT_PROXY_ARTIFACT);
        assert_eq!(stablecoin.gas, StablecoinGas::default());
        assert_eq!(stablecoin.record_suffix(), "deployed_dfxcadc");

        let pool = config.muni_pool().unwrap();
        assert_eq!(pool.fee_tier, FeeTier::Lowest);
        assert_eq!(pool.observation_cardinality, DEFAULT_OBSERVATION_CARDINALITY);
        assert_eq!(pool.record_suffix(), "uniswapv3_dfxsgd-xsgd");

        let staking = config.staking_rewards().unwrap();
        assert_eq!(staking.artifact, DEFAULT_STAKING_ARTIFACT);
        assert_eq!(staking.gas.gas_limit, Some(STAKING_DEPLOY_GAS_LIMIT));
    }

    #[test]
    fn test_ratios_parsed_to_fixed_point() {
        let config = DeploymentConfig::from_json(SAMPLE_CONFIG).unwrap();
        let ratios = config.stablecoin().unwrap().ratios().unwrap();

        let e15 = U256::from(10).pow(U256::from(15));
        assert_eq!(ratios.mint_burn_fee, U256::from(5) * e15);
        assert_eq!(ratios.collateral_ratio, U256::from(950) * e15);
        assert_eq!(ratios.dfx_ratio, U256::from(50) * e15);
    }

    #[test]
    fn test_bad_ratios_rejected() {
        assert!(parse_ratio("1.5", "r").is_err());
        assert!(parse_ratio("-0.1", "r").is_err());
        assert!(parse_ratio("five percent", "r").is_err());
        assert_eq!(parse_ratio("1", "r").unwrap(), U256::from(10).pow(U256::from(18)));
    }

    #[test]
    fn test_missing_section() {
        let config = DeploymentConfig::from_json("{}").unwrap();
        assert!(matches!(config.multisigs(), Err(ScriptError::Configuration(_))));
        assert!(matches!(config.stablecoin(), Err(ScriptError::Configuration(_))));
    }

    #[test]
    fn test_zero_multisig_rejected() {
        let json = SAMPLE_CONFIG.replace(
            "0x26f539A0fE189A7f228D7982BF10Bc294FA9070c",
            "0x0000000000000000000000000000000000000000",
        );
        assert!(matches!(
            DeploymentConfig::from_json(&json),
            Err(ScriptError::Configuration(_))
        ));
    }

    #[test]
    fn test_unsupported_fee_tier_rejected() {
        let json = SAMPLE_CONFIG.replace("\"feeTier\": 100", "\"feeTier\": 250");
        assert!(matches!(
            DeploymentConfig::from_json(&json),
            Err(ScriptError::Configuration(_))
        ));
    }

    #[test]
    fn test_inverted_price_range_rejected() {
        let json = SAMPLE_CONFIG.replace("\"numerator\": 1020", "\"numerator\": 900");
        assert!(matches!(
            DeploymentConfig::from_json(&json),
            Err(ScriptError::Configuration(_))
        ));
    }
}
