// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{self, Display};

use crate::device::Channel;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error category of a failed sequence load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid request: unknown backend, malformed markers, misaligned buffers.
    Configuration,
    /// A caller supplied waveform source, IQ converter or marker function failed.
    Source,
    /// The device refused a command.
    Device,
}

/// Position in the sequence at which a load failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub slot: usize,
    pub channel: Option<Channel>,
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel {
            Some(channel) => write!(f, "slot {}, channel {}", self.slot, channel.number()),
            None => write!(f, "slot {}", self.slot),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Configuration(String),
    #[error("Caller supplied function failed")]
    Source(#[source] anyhow::Error),
    #[error("Device command failed")]
    Device(#[source] anyhow::Error),
    #[error("Sequence load failed at {location}")]
    At {
        location: Location,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn configuration<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Configuration(msg.to_string())
    }

    /// Attach the slot (and channel) being processed when the error occurred.
    ///
    /// An error that already carries a location keeps the innermost one.
    pub fn at(self, slot: usize, channel: Option<Channel>) -> Self {
        match self {
            Error::At { .. } => self,
            other => Error::At {
                location: Location { slot, channel },
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Source(_) => ErrorKind::Source,
            Error::Device(_) => ErrorKind::Device,
            Error::At { source, .. } => source.kind(),
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Error::At { location, .. } => Some(location),
            _ => None,
        }
    }

    /// The underlying cause raised by the caller's code or the device, if any.
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Error::Configuration(_) => None,
            Error::Source(e) | Error::Device(e) => Some(e),
            Error::At { source, .. } => source.cause(),
        }
    }
}
