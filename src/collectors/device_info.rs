//! Device Identity Collector
//!
//! Reads `Shelly.GetDeviceInfo`.
//!
//! # Labels Produced
//! - `model` - application name reported by the firmware (`app`, e.g. `PlusPlugS`)
//! - `firmware` - firmware version (`ver`)

use super::LabelSet;
use crate::error::Result;
use crate::metrics::{LABEL_FIRMWARE, LABEL_MODEL};
use crate::shelly::Document;

pub fn extract(doc: &Document<'_>, labels: &mut LabelSet) -> Result<()> {
    labels.insert(LABEL_MODEL, doc.label("app")?);
    labels.insert(LABEL_FIRMWARE, doc.label("ver")?);
    Ok(())
}
