pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod server;

pub use domain::account;
pub use domain::authorization;
pub use outbound::repositories;

pub mod proto {
    tonic::include_proto!("account");
}
