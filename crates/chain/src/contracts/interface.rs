//! Method-name based call encoding.

use crate::error::ChainError;
use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, Bytes};
use std::sync::Arc;

/// Liquidator contract methods the bot may invoke.
///
/// `safeLiquidate` is overloaded: the 9-argument form repays in an ERC20,
/// the 8-argument form repays in the native currency sent as value.
pub const SAFE_LIQUIDATOR_ABI: &[&str] = &[
    "function safeLiquidate(address borrower, uint256 repayAmount, address cErc20, address cTokenCollateral, uint256 minOutputAmount, address exchangeSeizedTo, address uniswapV2Router, address[] redemptionStrategies, bytes[] strategyData) returns (uint256)",
    "function safeLiquidate(address borrower, address cEther, address cErc20Collateral, uint256 minOutputAmount, address exchangeSeizedTo, address uniswapV2Router, address[] redemptionStrategies, bytes[] strategyData) returns (uint256)",
    "function safeLiquidateToTokensWithFlashLoan(address borrower, uint256 repayAmount, address cErc20, address cTokenCollateral, uint256 minProfitAmount, address exchangeProfitTo, address uniswapV2RouterForBorrow, address uniswapV2RouterForCollateral, address[] redemptionStrategies, bytes[] strategyData, uint256 ethToCoinbase, address[] fundingStrategies, bytes[] fundingDatas) returns (uint256)",
    "function safeLiquidateToEthWithFlashLoan(address borrower, uint256 repayAmount, address cEther, address cErc20Collateral, uint256 minProfitAmount, address exchangeProfitTo, address uniswapV2RouterForCollateral, address[] redemptionStrategies, bytes[] strategyData, uint256 ethToCoinbase) returns (uint256)",
];

/// A deployed contract plus the ABI used to encode calls to it.
#[derive(Debug, Clone)]
pub struct ContractInterface {
    name: &'static str,
    address: Address,
    abi: Arc<JsonAbi>,
}

impl ContractInterface {
    /// Build from human-readable function signatures.
    pub fn new(name: &'static str, address: Address, signatures: &[&str]) -> Result<Self, ChainError> {
        let abi = JsonAbi::parse(signatures.iter().copied()).map_err(|e| ChainError::Encoding {
            method: name.to_string(),
            reason: format!("invalid ABI: {e}"),
        })?;

        Ok(Self {
            name,
            address,
            abi: Arc::new(abi),
        })
    }

    /// The liquidator contract at `address`.
    pub fn safe_liquidator(address: Address) -> Result<Self, ChainError> {
        Self::new("FuseSafeLiquidator", address, SAFE_LIQUIDATOR_ABI)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.abi.function(method).is_some()
    }

    /// Resolve `method` to a function, picking the overload by argument count.
    pub fn function(&self, method: &str, arg_count: usize) -> Result<&Function, ChainError> {
        let overloads = self.abi.function(method).ok_or_else(|| ChainError::Encoding {
            method: method.to_string(),
            reason: format!("{} has no such method", self.name),
        })?;

        overloads
            .iter()
            .find(|f| f.inputs.len() == arg_count)
            .ok_or_else(|| ChainError::Encoding {
                method: method.to_string(),
                reason: format!("no overload takes {arg_count} arguments"),
            })
    }

    /// Encode selector and arguments for `method(args)`.
    pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> Result<Bytes, ChainError> {
        let function = self.function(method, args.len())?;
        let data = function
            .abi_encode_input(args)
            .map_err(|e| ChainError::Encoding {
                method: method.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    fn liquidator() -> ContractInterface {
        ContractInterface::safe_liquidator(Address::repeat_byte(0x11)).unwrap()
    }

    fn native_repay_args() -> Vec<DynSolValue> {
        vec![
            DynSolValue::Address(Address::repeat_byte(0x01)),
            DynSolValue::Address(Address::repeat_byte(0x02)),
            DynSolValue::Address(Address::repeat_byte(0x03)),
            DynSolValue::Uint(U256::ZERO, 256),
            DynSolValue::Address(Address::ZERO),
            DynSolValue::Address(Address::ZERO),
            DynSolValue::Array(vec![]),
            DynSolValue::Array(vec![]),
        ]
    }

    #[test]
    fn test_liquidator_abi_parses() {
        let contract = liquidator();
        assert!(contract.has_method("safeLiquidate"));
        assert!(contract.has_method("safeLiquidateToTokensWithFlashLoan"));
        assert!(!contract.has_method("withdraw"));
    }

    #[test]
    fn test_overload_selected_by_arg_count() {
        let contract = liquidator();
        let native = contract.function("safeLiquidate", 8).unwrap();
        let token = contract.function("safeLiquidate", 9).unwrap();
        assert_ne!(native.selector(), token.selector());
    }

    #[test]
    fn test_encode_call_prefixes_selector() {
        let contract = liquidator();
        let data = contract.encode_call("safeLiquidate", &native_repay_args()).unwrap();
        let selector = contract.function("safeLiquidate", 8).unwrap().selector();
        assert_eq!(&data[..4], selector.as_slice());
        // 6 static words + 2 offsets + 2 empty array lengths
        assert_eq!(data.len(), 4 + 32 * 10);
    }

    #[test]
    fn test_unknown_method_is_encoding_error() {
        let err = liquidator().encode_call("drain", &[]).unwrap_err();
        assert!(matches!(err, ChainError::Encoding { ref method, .. } if method == "drain"));
    }

    #[test]
    fn test_wrong_argument_type_is_encoding_error() {
        let mut args = native_repay_args();
        args[0] = DynSolValue::Bool(true);
        let err = liquidator().encode_call("safeLiquidate", &args).unwrap_err();
        assert!(matches!(err, ChainError::Encoding { .. }));
    }
}
