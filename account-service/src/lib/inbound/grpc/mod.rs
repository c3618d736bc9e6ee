pub mod grpc_account_server;
pub mod handlers;

pub use grpc_account_server::AccountGrpcService;
