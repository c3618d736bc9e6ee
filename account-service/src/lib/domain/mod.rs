pub mod account;
pub mod authorization;
