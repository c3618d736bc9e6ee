pub mod errors;
pub mod gate;
pub mod models;
pub mod policy;
