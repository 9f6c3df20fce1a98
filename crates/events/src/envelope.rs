//! The CloudEvents envelope: context attributes, extension attributes and
//! data, independent of any transport.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use courier_core::{ContentType, EnvelopeError, EnvelopeResult, Uri, new_event_id};

use crate::attributes::{self, SPEC_VERSION};
use crate::binding::{Binding, default_binding};

/// Event payload: text or raw bytes, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    String(String),
    Binary(Vec<u8>),
}

impl Data {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s),
            Data::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Data::String(s) => s.as_bytes(),
            Data::Binary(b) => b,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Data::Binary(_))
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::String(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::String(value.to_string())
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Data::Binary(value)
    }
}

impl From<&[u8]> for Data {
    fn from(value: &[u8]) -> Self {
        Data::Binary(value.to_vec())
    }
}

/// Deserialized view of `data`, kept until `data` changes.
#[derive(Clone)]
struct CachedData(Arc<dyn Any + Send + Sync>);

impl core::fmt::Debug for CachedData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("CachedData(..)")
    }
}

/// A CloudEvents 1.0 envelope: context attributes plus payload.
///
/// The envelope is independent of the transport carrying it:
/// - **Well-known attributes** have typed accessors. `id` and `time` are
///   defaulted lazily on first read (a fresh UUIDv7, the current UTC instant)
///   and the generated value is kept.
/// - **Extension attributes** live in a name → string map.
/// - **Data** is either text or bytes; replacing it drops the cached typed view.
///
/// Mutation needs `&mut self`; share instances across threads only behind
/// external synchronization.
#[derive(Debug, Clone)]
pub struct CloudEvent {
    id: OnceLock<String>,
    source: Option<Uri>,
    event_type: Option<String>,
    data_content_type: Option<ContentType>,
    data_schema: Option<Uri>,
    subject: Option<String>,
    time: OnceLock<DateTime<Utc>>,

    attributes: BTreeMap<String, String>,

    data: Option<Data>,
    cached: Option<CachedData>,

    binding: Binding,
}

impl Default for CloudEvent {
    fn default() -> Self {
        Self::with_binding(default_binding())
    }
}

impl PartialEq for CloudEvent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.source == other.source
            && self.event_type == other.event_type
            && self.data_content_type == other.data_content_type
            && self.data_schema == other.data_schema
            && self.subject == other.subject
            && self.time == other.time
            && self.attributes == other.attributes
            && self.data == other.data
            && self.binding == other.binding
    }
}

impl CloudEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binding(binding: Binding) -> Self {
        Self {
            id: OnceLock::new(),
            source: None,
            event_type: None,
            data_content_type: None,
            data_schema: None,
            subject: None,
            time: OnceLock::new(),
            attributes: BTreeMap::new(),
            data: None,
            cached: None,
            binding,
        }
    }

    /// New envelope carrying `source`'s attributes.
    ///
    /// Copies every attribute except `id` and `time` (the copy gets fresh
    /// ones); `data` is never copied.
    pub fn derive_from(source: &CloudEvent) -> Self {
        Self {
            source: source.source.clone(),
            event_type: source.event_type.clone(),
            data_content_type: source.data_content_type.clone(),
            data_schema: source.data_schema.clone(),
            subject: source.subject.clone(),
            attributes: source.attributes.clone(),
            ..Self::with_binding(source.binding)
        }
    }

    pub fn id(&self) -> &str {
        self.id.get_or_init(new_event_id)
    }

    /// Whether `id` was set or already defaulted.
    pub fn has_id(&self) -> bool {
        self.id.get().is_some()
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> EnvelopeResult<()> {
        let id = id.into();
        if id.is_empty() {
            return Err(EnvelopeError::InvalidArgument("id"));
        }
        self.id = OnceLock::from(id);
        Ok(())
    }

    pub fn source(&self) -> Option<&Uri> {
        self.source.as_ref()
    }

    pub fn set_source(&mut self, source: Uri) {
        self.source = Some(source);
    }

    /// Always `"1.0"`.
    pub fn spec_version(&self) -> &'static str {
        SPEC_VERSION
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    pub fn set_event_type(&mut self, event_type: impl Into<String>) {
        self.event_type = Some(event_type.into());
    }

    pub fn data_content_type(&self) -> Option<&ContentType> {
        self.data_content_type.as_ref()
    }

    pub fn set_data_content_type(&mut self, content_type: Option<ContentType>) {
        self.data_content_type = content_type;
    }

    pub fn data_schema(&self) -> Option<&Uri> {
        self.data_schema.as_ref()
    }

    pub fn set_data_schema(&mut self, schema: Option<Uri>) {
        self.data_schema = schema;
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn set_subject(&mut self, subject: Option<String>) {
        self.subject = subject;
    }

    pub fn time(&self) -> DateTime<Utc> {
        *self.time.get_or_init(Utc::now)
    }

    pub fn has_time(&self) -> bool {
        self.time.get().is_some()
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.time = OnceLock::from(time);
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set an extension attribute. Well-known names and the structured-mode
    /// payload members are rejected.
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> EnvelopeResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(EnvelopeError::InvalidArgument("attribute name"));
        }
        if attributes::is_reserved(&name) {
            return Err(EnvelopeError::validation(format!(
                "'{name}' cannot be used as an extension attribute"
            )));
        }
        self.attributes.insert(name, value.into());
        Ok(())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// Insert an extension attribute whose name is known not to be reserved.
    pub(crate) fn insert_attribute(&mut self, name: &str, value: String) {
        self.attributes.insert(name.to_string(), value);
    }

    /// Lazily defaulted extension attribute (used by the extensions).
    pub(crate) fn attribute_or_insert_with(
        &mut self,
        name: &str,
        default: impl FnOnce() -> String,
    ) -> &str {
        self.attributes
            .entry(name.to_string())
            .or_insert_with(default)
            .as_str()
    }

    pub fn data(&self) -> Option<&Data> {
        self.data.as_ref()
    }

    /// Replace the payload. Setting an equal value keeps the cached typed view.
    pub fn set_data(&mut self, data: impl Into<Data>) {
        let data = data.into();
        if self.data.as_ref() == Some(&data) {
            return;
        }
        self.data = Some(data);
        self.cached = None;
    }

    pub fn clear_data(&mut self) {
        if self.data.take().is_some() {
            self.cached = None;
        }
    }

    /// Typed view of `data`: XML when `datacontenttype` is an XML media type,
    /// JSON otherwise.
    ///
    /// The first successful call caches the value; later calls return the
    /// cached value and fail with [`EnvelopeError::Cast`] when a different type
    /// is requested. Deserialization errors are returned as-is.
    pub fn data_as<T>(&mut self) -> EnvelopeResult<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        if let Some(CachedData(cached)) = &self.cached {
            return cached
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(EnvelopeError::cast::<T>);
        }

        let data = self.data.as_ref().ok_or(EnvelopeError::MissingData)?;
        let value: T = if self.is_xml() {
            let text = core::str::from_utf8(data.as_bytes()).map_err(EnvelopeError::xml)?;
            quick_xml::de::from_str(text).map_err(EnvelopeError::xml)?
        } else {
            match data {
                Data::String(s) => serde_json::from_str(s)?,
                Data::Binary(b) => serde_json::from_slice(b)?,
            }
        };
        self.cached = Some(CachedData(Arc::new(value.clone())));
        Ok(value)
    }

    /// Like [`CloudEvent::data_as`], but any failure yields `None`.
    pub fn try_data_as<T>(&mut self) -> Option<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.data_as().ok()
    }

    /// Serialize `value` into `data` (XML or JSON, as for
    /// [`CloudEvent::data_as`]) and cache it.
    pub fn set_data_as<T>(&mut self, value: T) -> EnvelopeResult<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let text = if self.is_xml() {
            quick_xml::se::to_string(&value).map_err(EnvelopeError::xml)?
        } else {
            serde_json::to_string(&value)?
        };
        self.set_data(text);
        self.cached = Some(CachedData(Arc::new(value)));
        Ok(())
    }

    fn is_xml(&self) -> bool {
        self.data_content_type.as_ref().is_some_and(ContentType::is_xml)
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn set_binding(&mut self, binding: Binding) {
        self.binding = binding;
    }

    pub fn with_source(mut self, source: Uri) -> Self {
        self.set_source(source);
        self
    }

    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.set_event_type(event_type);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.set_subject(Some(subject.into()));
        self
    }

    pub fn with_data(mut self, data: impl Into<Data>) -> Self {
        self.set_data(data);
        self
    }
}
