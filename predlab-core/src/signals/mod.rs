//! Signal detection over point-in-time price prefixes.
//!
//! Rules never see the resolution outcome or any quote after the one being
//! evaluated. That boundary is enforced by the types: a rule only ever
//! receives a `PricePrefix`.

pub mod detector;
pub mod prefix;
pub mod rule;

pub use detector::{EntryMode, EntrySignal, SignalDetector};
pub use prefix::PricePrefix;
pub use rule::{EntryCondition, ExitPolicy, SideSelector, SignalRule, StrategyRule};
