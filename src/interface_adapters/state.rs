use crate::interface_adapters::net::BattleSummary;
use crate::use_cases::BattleHandle;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    // Channels of the battle being served.
    pub battle: BattleHandle,
    // Tick and survivor count of the latest world update.
    pub summary_rx: watch::Receiver<BattleSummary>,
}
