// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device description document parsing.
//!
//! Only the root device is read. Relative URLs are resolved against
//! `URLBase` when present, otherwise against the location the document was
//! fetched from.

use serde::Deserialize;
use url::Url;

use crate::error::ParseError;
use crate::model::Udn;

/// The identity and services extracted from a description document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescription {
    /// Unique device name.
    pub udn: Udn,
    /// Device type URN.
    pub device_type: String,
    /// Friendly name; empty if absent.
    pub friendly_name: String,
    /// Absolute presentation URL; empty if absent.
    pub presentation_url: String,
    /// Services in document order.
    pub services: Vec<ServiceDescription>,
}

/// One `<service>` entry with absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescription {
    /// Service type URN.
    pub service_type: String,
    /// Service id.
    pub service_id: String,
    /// Absolute control URL.
    pub control_url: String,
    /// Absolute event subscription URL.
    pub event_url: String,
}

impl DeviceDescription {
    /// Parses a description document fetched from `location`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the XML is malformed, the device has no
    /// UDN or device type, or the base or presentation URL is invalid. A
    /// service whose own URLs cannot be resolved is skipped.
    pub fn parse(xml: &str, location: &str) -> Result<Self, ParseError> {
        let root: RootXml = quick_xml::de::from_str(xml)?;
        let device = root.device;

        let udn = device.udn.trim();
        if udn.is_empty() {
            return Err(ParseError::MissingField("UDN".to_string()));
        }
        let device_type = device.device_type.trim();
        if device_type.is_empty() {
            return Err(ParseError::MissingField("deviceType".to_string()));
        }

        let base = match root.url_base.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => Url::parse(base)?,
            _ => Url::parse(location)?,
        };

        let presentation_url = match device.presentation_url.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => resolve(&base, path)?,
            _ => String::new(),
        };

        // A service with unusable URLs is left out; the rest still count.
        let services = device
            .service_list
            .services
            .into_iter()
            .filter_map(|service| {
                let service_type = service.service_type.trim().to_string();
                let urls = resolve(&base, &service.control_url)
                    .and_then(|control| Ok((control, resolve(&base, &service.event_sub_url)?)));
                match urls {
                    Ok((control_url, event_url)) => Some(ServiceDescription {
                        service_type,
                        service_id: service.service_id.trim().to_string(),
                        control_url,
                        event_url,
                    }),
                    Err(e) => {
                        tracing::debug!(udn, service_type = %service_type, error = %e, "Skipping service");
                        None
                    }
                }
            })
            .collect();

        Ok(Self {
            udn: Udn::new(udn),
            device_type: device_type.to_string(),
            friendly_name: device.friendly_name.trim().to_string(),
            presentation_url,
            services,
        })
    }

    /// Returns the first service of the given type.
    #[must_use]
    pub fn service(&self, service_type: &str) -> Option<&ServiceDescription> {
        self.services.iter().find(|s| s.service_type == service_type)
    }
}

fn resolve(base: &Url, reference: &str) -> Result<String, ParseError> {
    Ok(base.join(reference.trim())?.to_string())
}

#[derive(Deserialize)]
struct RootXml {
    #[serde(rename = "URLBase", default)]
    url_base: Option<String>,
    device: DeviceXml,
}

#[derive(Deserialize)]
struct DeviceXml {
    #[serde(rename = "deviceType", default)]
    device_type: String,
    #[serde(rename = "friendlyName", default)]
    friendly_name: String,
    #[serde(rename = "UDN", default)]
    udn: String,
    #[serde(rename = "presentationURL", default)]
    presentation_url: Option<String>,
    #[serde(rename = "serviceList", default)]
    service_list: ServiceListXml,
}

#[derive(Deserialize, Default)]
struct ServiceListXml {
    #[serde(rename = "service", default)]
    services: Vec<ServiceXml>,
}

#[derive(Deserialize)]
struct ServiceXml {
    #[serde(rename = "serviceType", default)]
    service_type: String,
    #[serde(rename = "serviceId", default)]
    service_id: String,
    #[serde(rename = "controlURL", default)]
    control_url: String,
    #[serde(rename = "eventSubURL", default)]
    event_sub_url: String,
}
