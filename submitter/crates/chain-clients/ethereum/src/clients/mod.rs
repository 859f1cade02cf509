pub mod interfaces;

pub use interfaces::usage_ledger_interface::UsageLedgerContract;
