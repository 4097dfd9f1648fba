// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound protocol events.

use std::fmt;
use std::time::Duration;

use crate::model::Udn;

/// Result code attached to a protocol event. Zero means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    /// The success code.
    pub const SUCCESS: Self = Self(0);

    /// Returns true for the success code.
    #[must_use]
    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

/// Everything the protocol layer can report to the control point.
///
/// The set is closed; the dispatcher matches it exhaustively. The three
/// `*Request` kinds belong to the device role and are ignored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpnpEvent {
    /// A device announced itself.
    AdvertisementAlive {
        location: String,
        expires: Duration,
        error_code: ErrorCode,
    },
    /// A device answered a search.
    SearchResult {
        location: String,
        expires: Duration,
        error_code: ErrorCode,
    },
    /// A device announced its departure.
    AdvertisementByeBye { udn: Udn, error_code: ErrorCode },
    /// A search window closed.
    SearchTimeout,
    /// A control action finished.
    ActionComplete {
        control_url: String,
        action: String,
        error_code: ErrorCode,
    },
    /// A state variable query finished.
    VariableQueryComplete {
        control_url: String,
        var_name: String,
        value: String,
        error_code: ErrorCode,
    },
    /// A change notification arrived for a subscription.
    EventReceived {
        sid: String,
        event_key: u32,
        changed_variables: String,
    },
    /// A subscribe request completed.
    SubscribeComplete {
        event_url: String,
        sid: String,
        timeout: Duration,
        error_code: ErrorCode,
    },
    /// An unsubscribe request completed.
    UnsubscribeComplete {
        event_url: String,
        sid: String,
        error_code: ErrorCode,
    },
    /// A renewal completed.
    RenewalComplete {
        event_url: String,
        sid: String,
        timeout: Duration,
        error_code: ErrorCode,
    },
    /// Automatic renewal of a subscription failed.
    AutoRenewalFailed {
        event_url: String,
        sid: String,
        error_code: ErrorCode,
    },
    /// A subscription expired.
    SubscriptionExpired {
        event_url: String,
        sid: String,
        error_code: ErrorCode,
    },
    /// Device role: a subscription request from a control point.
    SubscriptionRequest,
    /// Device role: a state variable request.
    VariableRequest,
    /// Device role: an action request.
    ActionRequest,
}

impl UpnpEvent {
    /// Short name of the event kind for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdvertisementAlive { .. } => "advertisement_alive",
            Self::SearchResult { .. } => "search_result",
            Self::AdvertisementByeBye { .. } => "advertisement_byebye",
            Self::SearchTimeout => "search_timeout",
            Self::ActionComplete { .. } => "action_complete",
            Self::VariableQueryComplete { .. } => "variable_query_complete",
            Self::EventReceived { .. } => "event_received",
            Self::SubscribeComplete { .. } => "subscribe_complete",
            Self::UnsubscribeComplete { .. } => "unsubscribe_complete",
            Self::RenewalComplete { .. } => "renewal_complete",
            Self::AutoRenewalFailed { .. } => "auto_renewal_failed",
            Self::SubscriptionExpired { .. } => "subscription_expired",
            Self::SubscriptionRequest => "subscription_request",
            Self::VariableRequest => "variable_request",
            Self::ActionRequest => "action_request",
        }
    }

    /// Returns `true` for announcements and search answers, whose handling
    /// starts with a description fetch.
    #[must_use]
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            Self::AdvertisementAlive { .. } | Self::SearchResult { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_code() {
        assert!(ErrorCode::SUCCESS.is_success());
        assert!(!ErrorCode::from(-301).is_success());
        assert_eq!(ErrorCode(-301).to_string(), "-301");
    }

    #[test]
    fn kind_names() {
        assert_eq!(UpnpEvent::SearchTimeout.kind(), "search_timeout");
        let event = UpnpEvent::AdvertisementByeBye {
            udn: Udn::new("uuid:x"),
            error_code: ErrorCode::SUCCESS,
        };
        assert_eq!(event.kind(), "advertisement_byebye");
        assert!(!event.is_discovery());
        assert!(
            UpnpEvent::SearchResult {
                location: "http://10.0.0.1/description.xml".to_string(),
                expires: std::time::Duration::from_secs(100),
                error_code: ErrorCode::SUCCESS,
            }
            .is_discovery()
        );
    }
}
