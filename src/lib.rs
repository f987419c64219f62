//! Double-entry ledger: typed accounts with per-currency balances and an
//! append-only log of transactions whose postings balance to zero per currency.
#[macro_use]
extern crate log;

mod features;

pub use features::*;
