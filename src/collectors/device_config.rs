//! Feature Flag Collector
//!
//! Reads `Shelly.GetConfig` and reports which optional components are
//! enabled.
//!
//! # Metrics Produced
//! - `shelly_bluetooth_state` - `ble.enable`
//! - `shelly_cloud_state` - `cloud.enable`
//! - `shelly_mqtt_state` - `mqtt.enable`

use super::ObservationSet;
use crate::error::Result;
use crate::shelly::Document;

const FLAGS: [(&str, &str); 3] = [
    ("bluetooth_state", "ble.enable"),
    ("cloud_state", "cloud.enable"),
    ("mqtt_state", "mqtt.enable"),
];

pub fn extract(doc: &Document<'_>, observations: &mut ObservationSet) -> Result<()> {
    for (key, path) in FLAGS {
        observations.insert_flag(key, doc.bool(path)?);
    }
    Ok(())
}
