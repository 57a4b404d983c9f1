// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{self, Display};

use crate::{Error, Result};

/// Sequence programming model of an AWG family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Waveforms are stored as named resources and assigned to table cells
    /// per channel (Tektronix AWG5000/7000).
    SlotTable,
    /// Both channels of a segment are sent in one call (Tabor WX series).
    CombinedSend,
}

/// Device specific traits for sequence loading
pub struct DeviceTraits {
    /// Waveform lengths must be a multiple of this many samples.
    pub sample_multiple: usize,
}

pub const SLOT_TABLE_TRAITS: DeviceTraits = DeviceTraits {
    sample_multiple: 64,
};

pub const COMBINED_SEND_TRAITS: DeviceTraits = DeviceTraits {
    sample_multiple: 4,
};

impl BackendKind {
    pub const fn traits(&self) -> &'static DeviceTraits {
        match self {
            BackendKind::SlotTable => &SLOT_TABLE_TRAITS,
            BackendKind::CombinedSend => &COMBINED_SEND_TRAITS,
        }
    }

    /// Select the programming model from the instrument's device type string.
    pub fn from_device_type(device_type: &str) -> Result<Self> {
        if device_type.contains("Tektronix") {
            Ok(BackendKind::SlotTable)
        } else if device_type.contains("Tabor") {
            Ok(BackendKind::CombinedSend)
        } else {
            Err(Error::configuration(format!(
                "AWG type not known: '{device_type}'. Supported are Tektronix and Tabor instruments."
            )))
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            BackendKind::SlotTable => "slot table",
            BackendKind::CombinedSend => "combined send",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_from_device_type() {
        assert_eq!(
            BackendKind::from_device_type("Tektronix_AWG7062").unwrap(),
            BackendKind::SlotTable
        );
        assert_eq!(
            BackendKind::from_device_type("Tabor_WX1284C").unwrap(),
            BackendKind::CombinedSend
        );
        let err = BackendKind::from_device_type("Keysight_M8190").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_sample_multiple() {
        assert_eq!(BackendKind::SlotTable.traits().sample_multiple, 64);
        assert_eq!(BackendKind::CombinedSend.traits().sample_multiple, 4);
    }
}
