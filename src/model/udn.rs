// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unique device name type.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;

/// Unique Device Name, the primary key of the device registry.
///
/// UDNs are opaque strings announced by devices (usually `uuid:...`).
/// Comparison is exact.
///
/// # Examples
///
/// ```
/// use cctv_ctrlpt::model::Udn;
///
/// let udn = Udn::new("uuid:cctv-0001");
/// assert_eq!(udn.as_str(), "uuid:cctv-0001");
/// assert_eq!(udn.to_string(), "uuid:cctv-0001");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Udn(String);

impl Udn {
    /// Creates a UDN from any string.
    #[must_use]
    pub fn new(udn: impl Into<String>) -> Self {
        Self(udn.into())
    }

    /// Returns the UDN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Udn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Udn({})", self.0)
    }
}

impl fmt::Display for Udn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Udn {
    fn from(udn: &str) -> Self {
        Self(udn.to_string())
    }
}

impl From<String> for Udn {
    fn from(udn: String) -> Self {
        Self(udn)
    }
}

impl AsRef<str> for Udn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Udn {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Udn {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Udn {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
