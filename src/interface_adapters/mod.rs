// Interface adapters: wire protocol, agent channels and network handling.

pub mod agent_channel;
pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;
