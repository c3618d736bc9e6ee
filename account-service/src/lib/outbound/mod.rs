pub mod events;
pub mod repositories;
