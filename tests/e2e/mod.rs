#![allow(dead_code)]

mod harness;
pub use harness::*;

mod ledger_workflow_tests;
mod multi_user_isolation_tests;
mod persistence_tests;
