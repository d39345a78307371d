pub mod account;
pub(crate) mod common;
pub mod currency;
pub mod import;
pub mod reconcile;
pub mod rule;
pub mod transactions;
