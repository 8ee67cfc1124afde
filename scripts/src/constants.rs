//! Constants used in the deploy scripts

// -------------
// | Artifacts |
// -------------

/// The extension of compiled artifact files
pub const ARTIFACT_EXTENSION: &str = "json";

/// The extension of the source directories forge nests artifacts under
pub const SOLIDITY_EXTENSION: &str = "sol";

/// The placeholder solc leaves in bytecode that references unlinked libraries
pub const UNLINKED_LIBRARY_MARKER: &str = "__$";

/// The name of the upgradable proxy contract
pub const DEFAULT_PROXY_ARTIFACT: &str = "ASCUpgradableProxy";

/// The name of the MUNI logic contract
pub const DEFAULT_MUNI_ARTIFACT: &str = "MUNILogicV1";

/// The name of the staking rewards contract
pub const DEFAULT_STAKING_ARTIFACT: &str = "StakingRewards";

/// The name of the initializer called through the proxy constructor
pub const INITIALIZER_FUNCTION: &str = "initialize";

// -------------
// | Gas usage |
// -------------

/// The gas limit for deploying the TWAP oracle
pub const TWAP_DEPLOY_GAS_LIMIT: u64 = 2_017_090;

/// The gas limit for deploying a stablecoin logic contract
pub const LOGIC_DEPLOY_GAS_LIMIT: u64 = 3_040_761;

/// The gas limit for deploying the upgradable proxy
pub const PROXY_DEPLOY_GAS_LIMIT: u64 = 1_667_809;

/// The gas limit for pool creation and initialization calls
pub const POOL_SETUP_GAS_LIMIT: u64 = 500_000;

/// The gas limit for the pool factory's `createPool`
pub const CREATE_POOL_GAS_LIMIT: u64 = 5_000_000;

/// The gas limit for deploying the MUNI logic and its proxy
pub const MUNI_DEPLOY_GAS_LIMIT: u64 = 5_000_000;

/// The gas limit for deploying the staking rewards contract
pub const STAKING_DEPLOY_GAS_LIMIT: u64 = 2_000_000;

// --------
// | Pool |
// --------

/// The number of price observations the pool is asked to store
pub const DEFAULT_OBSERVATION_CARDINALITY: u16 = 5;

/// The decimals used for the stablecoin's fixed-point ratios
pub const RATIO_DECIMALS: u8 = 18;

// -----------
// | Records |
// -----------

/// The record key of the TWAP oracle
pub const TWAP_KEY: &str = "twap";

/// The record key of a logic contract
pub const LOGIC_KEY: &str = "logic";

/// The record key of a proxy contract
pub const PROXY_KEY: &str = "proxy";

/// The record key of a Uniswap V3 pool
pub const POOL_KEY: &str = "pool";

/// The record key of the MUNI logic contract
pub const MUNI_LOGIC_KEY: &str = "muniLogic";

/// The record key of the MUNI proxy
pub const MUNI_PROXY_KEY: &str = "muniProxy";

/// The record key of the calldata archive of the MUNI initializer
pub const MUNI_CALLDATA_KEY: &str = "muni";

/// The record key of the staking rewards contract
pub const STAKING_REWARDS_KEY: &str = "stakingRewards";

/// The record key of the lower tick of a MUNI position
pub const LOWER_TICK_KEY: &str = "lowerTick";

/// The record key of the upper tick of a MUNI position
pub const UPPER_TICK_KEY: &str = "upperTick";

/// The record key of a proxy's previous admin
pub const OLD_ADMIN_KEY: &str = "oldAdmin";

/// The record key of a proxy's new admin
pub const NEW_ADMIN_KEY: &str = "newAdmin";

/// The record key of the MUNI LP tokens held after minting
pub const LP_BALANCE_KEY: &str = "lpBalance";

/// The record key of the MUNI LP tokens minted
pub const LP_MINTED_KEY: &str = "lpMinted";

/// The indentation of a written record
pub const RECORD_INDENT: &[u8] = b"    ";

// -------
// | CLI |
// -------

/// The RPC endpoint used when none is given
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The directory forge writes artifacts to
pub const DEFAULT_ARTIFACTS_DIR: &str = "out";

/// The default number of confirmations to wait for on each transaction
pub const DEFAULT_CONFIRMATIONS: u64 = 1;
