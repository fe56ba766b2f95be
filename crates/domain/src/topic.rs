//! Transport topic layout.
//!
//! Sensors publish on `farm/sensors/{id}/uplink`, valves report on
//! `farm/valves/{id}/status` and receive commands on
//! `farm/valves/{id}/downlink`.

/// Subscription filter for sensor uplinks.
pub const SENSOR_UPLINK_FILTER: &str = "farm/sensors/+/uplink";

/// Subscription filter for valve status reports.
pub const VALVE_STATUS_FILTER: &str = "farm/valves/+/status";

/// Topic a valve listens on for commands.
#[must_use]
pub fn valve_downlink(valve_id: &str) -> String {
    format!("farm/valves/{valve_id}/downlink")
}

/// What an inbound topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    SensorUplink,
    ValveStatus,
}

/// Classify an inbound topic, `None` for anything the core does not handle.
#[must_use]
pub fn classify(topic: &str) -> Option<TopicKind> {
    if topic.contains("/sensors/") && topic.ends_with("/uplink") {
        Some(TopicKind::SensorUplink)
    } else if topic.contains("/valves/") && topic.ends_with("/status") {
        Some(TopicKind::ValveStatus)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_downlink_topic() {
        assert_eq!(valve_downlink("V1"), "farm/valves/V1/downlink");
    }

    #[test]
    fn should_classify_inbound_topics() {
        assert_eq!(classify("farm/sensors/S1/uplink"), Some(TopicKind::SensorUplink));
        assert_eq!(classify("farm/valves/V1/status"), Some(TopicKind::ValveStatus));
        assert_eq!(classify("farm/valves/V1/downlink"), None);
        assert_eq!(classify("other/thing"), None);
    }
}
