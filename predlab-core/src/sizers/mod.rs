//! Position sizing.

pub mod kelly;

pub use kelly::{half_kelly, kelly_fraction, quarter_kelly, KellySizing};
