//! Domain models for the crypto app

pub mod account;
