//! Live Status Collector
//!
//! Reads `Shelly.GetStatus`: the first switch channel, system counters and
//! the WiFi station.
//!
//! # Metrics Produced
//! - `shelly_output_state` - relay output (1=on, 0=off)
//! - `shelly_apower`, `shelly_voltage`, `shelly_current`
//! - `shelly_temperature` - from the nested `switch:0.temperature.tC`
//! - `shelly_uptime`, `shelly_ram_size`, `shelly_ram_free`, `shelly_fs_size`, `shelly_fs_free`
//! - `shelly_wifi_rssi`
//!
//! # Labels Produced
//! - `wifi_ip` - station IP address (`wifi.sta_ip`)

use super::{LabelSet, ObservationSet};
use crate::error::Result;
use crate::metrics::LABEL_WIFI_IP;
use crate::shelly::Document;

const READINGS: [(&str, &str); 10] = [
    ("apower", "switch:0.apower"),
    ("voltage", "switch:0.voltage"),
    ("current", "switch:0.current"),
    ("temperature", "switch:0.temperature.tC"),
    ("uptime", "sys.uptime"),
    ("ram_size", "sys.ram_size"),
    ("ram_free", "sys.ram_free"),
    ("fs_size", "sys.fs_size"),
    ("fs_free", "sys.fs_free"),
    ("wifi_rssi", "wifi.rssi"),
];

pub fn extract(
    doc: &Document<'_>,
    labels: &mut LabelSet,
    observations: &mut ObservationSet,
) -> Result<()> {
    observations.insert_flag("output_state", doc.bool("switch:0.output")?);

    for (key, path) in READINGS {
        observations.insert(key, doc.number(path)?);
    }

    labels.insert(LABEL_WIFI_IP, doc.label("wifi.sta_ip")?);
    Ok(())
}
