//! Definitions of Solidity functions called during deployment

use alloy::sol;

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function approve(address spender, uint256 value) external returns (bool);
    }

    interface IUniswapV3Factory {
        function createPool(address tokenA, address tokenB, uint24 fee)
            external
            returns (address pool);
        function getPool(address tokenA, address tokenB, uint24 fee)
            external
            view
            returns (address pool);
    }

    interface IUniswapV3Pool {
        function initialize(uint160 sqrtPriceX96) external;
        function increaseObservationCardinalityNext(uint16 observationCardinalityNext) external;
        function tickSpacing() external view returns (int24);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }

    interface IStablecoinLogic {
        function initialize(
            string name,
            string symbol,
            address admin,
            address feeRecipient,
            uint256 mintBurnFee,
            address twap,
            uint256 collateralRatio,
            uint256 dfxRatio,
            uint256 pokeRatioDelta
        ) external;
    }

    interface IMuniLogic {
        function initialize(
            address owner,
            address pool,
            uint24 fee,
            int24 lowerTick,
            int24 upperTick
        ) external;
        function mint(uint256 mintAmount, address receiver)
            external
            returns (uint256 amount0, uint256 amount1, uint128 liquidityMinted);
        function balanceOf(address account) external view returns (uint256);
    }

    interface IAscUpgradableProxy {
        function getAdmin() external view returns (address);
        function changeAdmin(address newAdmin) external;
    }
}
