//! UDP transport for multi-tier audio packets

pub mod receiver;
pub mod sender;
pub mod udp;

pub use receiver::{PacketReceiver, ReceiverStats};
pub use sender::{PacketSender, SenderStats};
pub use udp::{bind_listener, bind_sender};
