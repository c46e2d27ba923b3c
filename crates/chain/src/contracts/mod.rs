//! Contract bindings for the lending market.
//!
//! Read-only contracts (price oracles, pool directory, comptroller,
//! flywheels) are bound with `sol!` for typed calls. The liquidator contract
//! is addressed by method name through [`ContractInterface`], since callers
//! hand the submitter a method name plus argument list.

mod interface;

pub use interface::{ContractInterface, SAFE_LIQUIDATOR_ABI};

use alloy::sol;

// Price oracles
sol! {
    /// Chain-wide price router ("master price oracle").
    #[sol(rpc)]
    interface IMasterPriceOracle {
        function price(address underlying) external view returns (uint256);
        function oracles(address underlying) external view returns (address);
    }

    /// Interface shared by every individual price oracle of the market.
    #[sol(rpc)]
    interface IBasePriceOracle {
        function price(address underlying) external view returns (uint256);
    }
}

// Pool directory and comptroller
sol! {
    /// Registered pool entry
    #[derive(Debug)]
    struct FusePool {
        string name;
        address creator;
        address comptroller;
        uint256 blockPosted;
        uint256 timestampPosted;
    }

    #[sol(rpc)]
    interface IFusePoolDirectory {
        function getAllPools() external view returns (FusePool[] memory);
    }

    #[sol(rpc)]
    interface IComptroller {
        function getAllMarkets() external view returns (address[] memory);
        function oracle() external view returns (address);
        function getRewardsDistributors() external view returns (address[] memory);
    }
}

// Reward flywheels
sol! {
    #[sol(rpc)]
    interface IFlywheel {
        function rewardToken() external view returns (address);
        function rewardsAccrued(address user) external view returns (uint256);
    }
}
