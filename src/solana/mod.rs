pub mod rpc;

pub use rpc::{RpcBroadcaster, TransactionBroadcaster};
