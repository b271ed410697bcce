//! Gas defaults and per-transaction gas resolution.
//!
//! Transactions are always legacy (single gas price). A zero in the caller's
//! options means "use the manager default"; the defaults themselves are fixed
//! when the manager is built.

/// Gas limit used for contract calls and creations when none is given.
pub const DEFAULT_GAS_LIMIT: u64 = 2_000_000;

/// Intrinsic cost of a plain value transfer.
pub const TRANSFER_GAS: u64 = 21_000;

const ZERO_BYTE_GAS: u64 = 4;
const NON_ZERO_BYTE_GAS: u64 = 16;

/// Intrinsic calldata cost of `data`.
pub fn calldata_gas(data: &[u8]) -> u64 {
    data.iter()
        .map(|b| if *b == 0 { ZERO_BYTE_GAS } else { NON_ZERO_BYTE_GAS })
        .sum()
}

/// Gas limit for a value transfer carrying `data`.
pub fn transfer_gas_with_data(data: &[u8]) -> u64 {
    TRANSFER_GAS + calldata_gas(data)
}

/// Gas parameters of one transaction after defaults have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxGas {
    pub gas_price: u128,
    pub gas_limit: u64,
}

impl TxGas {
    /// Substitute `defaults` for zero fields of the request.
    pub fn resolve(gas_price: u128, gas_limit: u64, defaults: TxGas) -> Self {
        let resolved = Self {
            gas_price: if gas_price == 0 {
                defaults.gas_price
            } else {
                gas_price
            },
            gas_limit: if gas_limit == 0 {
                defaults.gas_limit
            } else {
                gas_limit
            },
        };

        if resolved != (TxGas { gas_price, gas_limit }) {
            tracing::trace!(
                requested_gas_price = gas_price,
                requested_gas_limit = gas_limit,
                gas_price = resolved.gas_price,
                gas_limit = resolved.gas_limit,
                "applied gas defaults"
            );
        }
        resolved
    }

    /// Upper bound on the fee this transaction can burn, in wei.
    pub fn max_fee(&self) -> u128 {
        self.gas_price.saturating_mul(self.gas_limit as u128)
    }
}
