pub mod usage_ledger_interface;
