// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the control point.
//!
//! The hierarchy mirrors where a failure originates: the collaborator
//! protocol layer ([`ProtocolError`]), malformed documents or event payloads
//! ([`ParseError`]), and lookups against the device registry (the not-found
//! variants of [`Error`]).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A call into the protocol layer failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A description document or event payload could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// No device with this UDN is registered.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// No device exists at this 1-based list position.
    #[error("no device at position {position} ({count} known)")]
    PositionOutOfRange {
        /// The requested 1-based position.
        position: usize,
        /// The number of devices at lookup time.
        count: usize,
    },

    /// The device has no service at this index.
    #[error("service {index} not available on device")]
    ServiceNotFound {
        /// The requested service index.
        index: usize,
    },

    /// An argument was rejected before any lookup happened.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Returns true for the not-found family (unknown UDN, position out of
    /// range, missing service).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound(_) | Self::PositionOutOfRange { .. } | Self::ServiceNotFound { .. }
        )
    }
}

/// Errors reported by the collaborator protocol layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The protocol layer returned a non-success code.
    #[error("{operation} failed with code {code}")]
    CallFailed {
        /// The operation that failed (`subscribe`, `search`, ...).
        operation: &'static str,
        /// The numeric code returned by the protocol layer.
        code: i32,
    },

    /// The remote endpoint could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// An internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors raised while parsing description documents and event payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML is not well formed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The XML does not have the expected structure.
    #[error("XML deserialization error: {0}")]
    XmlDeserialize(#[from] quick_xml::DeError),

    /// A required element is missing.
    #[error("missing field: {0}")]
    MissingField(String),

    /// A URL could not be resolved.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A value could not be interpreted.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_failed_display() {
        let err = ProtocolError::CallFailed {
            operation: "subscribe",
            code: -301,
        };
        assert_eq!(err.to_string(), "subscribe failed with code -301");
    }

    #[test]
    fn position_out_of_range_display() {
        let err = Error::PositionOutOfRange {
            position: 4,
            count: 2,
        };
        assert_eq!(err.to_string(), "no device at position 4 (2 known)");
    }

    #[test]
    fn not_found_family() {
        assert!(Error::DeviceNotFound("uuid:x".to_string()).is_not_found());
        assert!(
            Error::PositionOutOfRange {
                position: 0,
                count: 0
            }
            .is_not_found()
        );
        assert!(Error::ServiceNotFound { index: 3 }.is_not_found());
        assert!(!Error::InvalidArgument("position 0".to_string()).is_not_found());
    }

    #[test]
    fn error_from_protocol_error() {
        let err: Error = ProtocolError::ConnectionFailed("refused".to_string()).into();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ConnectionFailed(_))
        ));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("UDN".to_string());
        assert_eq!(err.to_string(), "missing field: UDN");
    }
}
