mod ledger;

pub use ledger::{SelectionEntry, SelectionLedger};
