use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Ticks};
use crate::id::NetworkId;

/// Events emitted by [`NetworkIndex::tick`](crate::index::NetworkIndex::tick).
///
/// Fire only on state transitions, not every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KineticEvent {
    /// Stress rose above capacity.
    Overstressed {
        network_id: NetworkId,
        stress: Fixed64,
        capacity: Fixed64,
        tick: Ticks,
    },
    /// Stress dropped back to or below capacity.
    StressRelieved { network_id: NetworkId, tick: Ticks },
    /// Overstress decay brought a spinning network to a standstill.
    Stalled { network_id: NetworkId, tick: Ticks },
}

impl KineticEvent {
    pub fn network_id(&self) -> NetworkId {
        match self {
            KineticEvent::Overstressed { network_id, .. }
            | KineticEvent::StressRelieved { network_id, .. }
            | KineticEvent::Stalled { network_id, .. } => *network_id,
        }
    }
}
