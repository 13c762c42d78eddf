//! Execution cost model: slippage, entry fee, exit fee.

pub mod fees;

pub use fees::{
    cost_after_entry_fee, execution_price, exit_execution_price, net_return,
    proceeds_after_exit_fee, EntryCost, FeeModel,
};
