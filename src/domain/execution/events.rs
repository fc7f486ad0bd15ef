//! Router notifications

use serde::Serialize;
use tracing::info;

use crate::domain::protection::OperationId;
use crate::shared::types::{Address, Amount, MevConfig, RiskParameters};
use crate::shared::utils::serde_helpers::{serialize_address, serialize_amount};

/// Notifications emitted by successful router operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RouterEvent {
    SwapExecuted {
        #[serde(serialize_with = "serialize_address")]
        initiator: Address,
        path_length: usize,
        #[serde(serialize_with = "serialize_amount")]
        amount_in: Amount,
        #[serde(serialize_with = "serialize_amount")]
        amount_out: Amount,
        price_impact: u64,
    },
    RiskParamsUpdated {
        params: RiskParameters,
    },
    PoolBlacklistUpdated {
        #[serde(serialize_with = "serialize_address")]
        pool: Address,
        blacklisted: bool,
    },
    MevProtectionUpdated {
        config: MevConfig,
    },
    PauseStateChanged {
        paused: bool,
    },
    OwnershipTransferred {
        #[serde(serialize_with = "serialize_address")]
        previous_owner: Address,
        #[serde(serialize_with = "serialize_address")]
        new_owner: Address,
    },
    OperatorUpdated {
        #[serde(serialize_with = "serialize_address")]
        operator: Address,
        enabled: bool,
    },
    CooldownUpdated {
        operation: OperationId,
        seconds: u64,
    },
    EmergencyRecovery {
        #[serde(serialize_with = "serialize_address")]
        token: Address,
        #[serde(serialize_with = "serialize_address")]
        to: Address,
        #[serde(serialize_with = "serialize_amount")]
        amount: Amount,
    },
}

/// Append-only event buffer drained by the host
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<RouterEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: RouterEvent) {
        info!("Event: {:?}", event);
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop events emitted after `mark`, used when an operation aborts
    pub fn truncate(&mut self, mark: usize) {
        self.events.truncate(mark);
    }

    pub fn events(&self) -> &[RouterEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<RouterEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_and_drain() {
        let mut log = EventLog::new();
        log.emit(RouterEvent::PauseStateChanged { paused: true });
        let mark = log.len();
        log.emit(RouterEvent::PauseStateChanged { paused: false });
        log.truncate(mark);
        assert_eq!(log.events(), &[RouterEvent::PauseStateChanged { paused: true }]);
        assert_eq!(log.drain().len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_swap_event_json() {
        let event = RouterEvent::SwapExecuted {
            initiator: Address::from_low_u64_be(0xab),
            path_length: 3,
            amount_in: Amount::from(100u64),
            amount_out: Amount::from(98u64),
            price_impact: 20_100,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "swap_executed");
        assert_eq!(json["amount_out"], "98");
        assert_eq!(json["initiator"], "0x00000000000000000000000000000000000000ab");
    }
}
