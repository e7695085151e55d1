//! Scenario-based tests for the rebuilder

mod failure_handling;
mod success_chain;
