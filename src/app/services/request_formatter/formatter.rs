//! Record to request formatting

use crate::app::models::{ApiKey, Record, mask_credential};
use crate::app::services::field_mapping::{FieldMap, FieldSpec};
use crate::app::services::units::UnitConverter;
use crate::constants::{API_KEY_HEADER, DATETIME_FIELD, DATETIME_FORMAT, USER_AGENT};
use crate::{Error, Result};
use chrono::DateTime;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// A fully formatted update request, ready for the transport
///
/// The write key only appears in the header list. `Debug` and `Display`
/// mask it.
#[derive(Clone, PartialEq)]
pub struct UploadRequest {
    /// Endpoint URL including the encoded query string
    pub url: Url,
    /// Request headers as name/value pairs
    pub headers: Vec<(&'static str, String)>,
}

impl UploadRequest {
    /// Decoded value of a query parameter
    pub fn param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Value of a request header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn masked_headers(&self) -> Vec<(&'static str, String)> {
        self.headers
            .iter()
            .map(|(name, value)| {
                if *name == API_KEY_HEADER {
                    (*name, mask_credential(value))
                } else {
                    (*name, value.clone())
                }
            })
            .collect()
    }
}

impl fmt::Display for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GET {}", self.url)?;
        for (name, value) in self.masked_headers() {
            write!(f, " [{name}: {value}]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("url", &self.url.as_str())
            .field("headers", &self.masked_headers())
            .finish()
    }
}

/// Builds update requests from records
///
/// Holds the resolved field table, the unit adapter, the endpoint and the
/// write key. Cheap to clone.
#[derive(Clone)]
pub struct RequestFormatter {
    fields: Arc<FieldMap>,
    converter: Arc<dyn UnitConverter>,
    server_url: Url,
    api_key: ApiKey,
}

impl RequestFormatter {
    /// Create a formatter
    ///
    /// # Arguments
    ///
    /// * `fields` - Resolved channel field table
    /// * `converter` - Unit adapter for per-field unit overrides
    /// * `server_url` - Update endpoint, e.g. `http://api.thingspeak.com/update`
    /// * `api_key` - Channel write key
    ///
    /// # Returns
    ///
    /// The formatter, or a configuration error when the URL does not parse
    pub fn new(
        fields: Arc<FieldMap>,
        converter: Arc<dyn UnitConverter>,
        server_url: &str,
        api_key: ApiKey,
    ) -> Result<Self> {
        let server_url = Url::parse(server_url).map_err(|e| {
            Error::configuration(format!("Invalid server_url '{server_url}': {e}"))
        })?;
        Ok(Self {
            fields,
            converter,
            server_url,
            api_key,
        })
    }

    /// The resolved field table
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Endpoint the requests are sent to
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Format one record into an update request
    ///
    /// Fields whose observation is absent, null, non-numeric or not
    /// convertible to the requested unit are left out of the query. The
    /// `datetime` parameter is always present.
    ///
    /// # Returns
    ///
    /// The request, or a decoding error when the timestamp is out of range
    pub fn format(&self, record: &Record) -> Result<UploadRequest> {
        let mut url = self.server_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(DATETIME_FIELD, &format_timestamp(record.date_time)?);
            for (key, spec) in self.fields.iter() {
                if let Some(value) = self.field_value(record, spec) {
                    query.append_pair(key, &spec.format.apply(value));
                }
            }
        }

        Ok(UploadRequest {
            url,
            headers: vec![
                (API_KEY_HEADER, self.api_key.expose().to_string()),
                ("User-Agent", USER_AGENT.to_string()),
            ],
        })
    }

    fn field_value(&self, record: &Record, spec: &FieldSpec) -> Option<f64> {
        let value = record.get_f64(&spec.obs)?;
        let Some(target) = spec.units else {
            return Some(value);
        };

        let Some(source) = self.converter.native_unit(&spec.obs, record.us_units) else {
            debug!("No unit known for {}, omitting it", spec.obs);
            return None;
        };
        if source == target {
            return Some(value);
        }

        match self.converter.convert(value, source, target) {
            Ok(converted) => Some(converted),
            Err(e) => {
                debug!("Omitting {}: {}", spec.obs, e);
                None
            }
        }
    }
}

impl fmt::Debug for RequestFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestFormatter")
            .field("fields", &self.fields)
            .field("server_url", &self.server_url.as_str())
            .field("api_key", &self.api_key)
            .finish()
    }
}

/// Format epoch seconds as the UTC `datetime` parameter
///
/// # Examples
///
/// ```rust
/// use thingspeak_uplink::app::services::request_formatter::format_timestamp;
///
/// assert_eq!(format_timestamp(1_700_000_000).unwrap(), "2023-11-14T22:13:20Z");
/// ```
pub fn format_timestamp(epoch_seconds: i64) -> Result<String> {
    DateTime::from_timestamp(epoch_seconds, 0)
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        .ok_or_else(|| {
            Error::record_decoding(format!("Timestamp {epoch_seconds} is out of range"), None)
        })
}
