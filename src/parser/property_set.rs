// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event property set parsing.
//!
//! A change notification carries a document of the form:
//!
//! ```xml
//! <e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
//!   <e:property><Power>1</Power></e:property>
//!   <e:property><Temperature>41</Temperature></e:property>
//! </e:propertyset>
//! ```
//!
//! Parsing is lenient: namespace prefixes are ignored, a property whose
//! value cannot be decoded is skipped, and a structural error stops parsing
//! while keeping the properties already read.

use quick_xml::Reader;
use quick_xml::events::Event;

/// One `name = value` pair taken from a property set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    /// The state variable name.
    pub name: String,
    /// The new value.
    pub value: String,
}

/// The result of parsing a property set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    changes: Vec<PropertyChange>,
    skipped: usize,
    truncated: bool,
}

impl PropertySet {
    /// Parses a change notification payload.
    ///
    /// Never fails; problems are counted in [`skipped`](Self::skipped) and
    /// [`is_truncated`](Self::is_truncated).
    #[must_use]
    pub fn parse(payload: &str) -> Self {
        let mut set = Self::default();
        let mut reader = Reader::from_str(payload);
        reader.trim_text(true);

        let mut depth = 0usize;
        let mut property_depth: Option<usize> = None;
        let mut pending: Option<Pending> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    depth += 1;
                    let local = start.local_name();
                    match property_depth {
                        None if local.as_ref() == b"property" => property_depth = Some(depth),
                        Some(level) if depth == level + 1 => {
                            pending = Some(Pending::new(local.as_ref()));
                        }
                        _ => {}
                    }
                }
                Ok(Event::Empty(empty)) => {
                    if property_depth == Some(depth) {
                        set.changes.push(PropertyChange {
                            name: String::from_utf8_lossy(empty.local_name().as_ref())
                                .into_owned(),
                            value: String::new(),
                        });
                    }
                }
                Ok(Event::Text(text)) => {
                    if let Some(current) = pending.as_mut()
                        && property_depth.map(|level| level + 1) == Some(depth)
                    {
                        match text.unescape() {
                            Ok(value) => current.value.push_str(&value),
                            Err(e) => {
                                tracing::debug!(variable = %current.name, error = %e, "Undecodable property value");
                                current.malformed = true;
                            }
                        }
                    }
                }
                Ok(Event::CData(cdata)) => {
                    if let Some(current) = pending.as_mut()
                        && property_depth.map(|level| level + 1) == Some(depth)
                    {
                        current
                            .value
                            .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                    }
                }
                Ok(Event::End(_)) => {
                    match property_depth {
                        Some(level) if depth == level + 1 => {
                            if let Some(done) = pending.take() {
                                if done.malformed {
                                    set.skipped += 1;
                                } else {
                                    set.changes.push(done.into_change());
                                }
                            }
                        }
                        Some(level) if depth == level => property_depth = None,
                        _ => {}
                    }
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    tracing::debug!(
                        position = reader.buffer_position(),
                        error = %e,
                        "Property set parsing stopped"
                    );
                    if pending.is_some() {
                        set.skipped += 1;
                    }
                    set.truncated = true;
                    break;
                }
                Ok(_) => {}
            }
        }

        set
    }

    /// The decoded changes in document order.
    #[must_use]
    pub fn changes(&self) -> &[PropertyChange] {
        &self.changes
    }

    /// Number of properties dropped because their value was undecodable.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns true if a structural error cut the document short.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl IntoIterator for PropertySet {
    type Item = PropertyChange;
    type IntoIter = std::vec::IntoIter<PropertyChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

struct Pending {
    name: String,
    value: String,
    malformed: bool,
}

impl Pending {
    fn new(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            value: String::new(),
            malformed: false,
        }
    }

    fn into_change(self) -> PropertyChange {
        PropertyChange {
            name: self.name,
            value: self.value,
        }
    }
}
