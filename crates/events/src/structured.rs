//! Structured-mode codec: the whole envelope as one JSON document.
//!
//! ```text
//! { "specversion": "1.0", "id": "...", "source": "...", "type": "...",
//!   "time": "2024-01-01T00:00:00.0000000Z", "<extension>": "<string>",
//!   "data": <any JSON> | "data_base64": "<base64>" }
//! ```

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use courier_core::{
    ContentType, EnvelopeError, EnvelopeResult, Uri, format_round_trip, parse_instant,
};

use crate::attributes::{
    DATA, DATA_BASE64, DATACONTENTTYPE, DATASCHEMA, ID, SOURCE, SPEC_VERSION, SPECVERSION, SUBJECT,
    TIME, TYPE,
};
use crate::binding::{Binding, default_binding};
use crate::envelope::{CloudEvent, Data};

/// Media type announcing a structured-mode message.
pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json; charset=utf-8";

/// Serializes envelopes to JSON documents and parses them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredCodec {
    binding: Binding,
    pretty: bool,
}

impl Default for StructuredCodec {
    fn default() -> Self {
        Self::new(default_binding())
    }
}

impl StructuredCodec {
    /// Compact output; decoded envelopes carry `binding`.
    pub fn new(binding: Binding) -> Self {
        Self {
            binding,
            pretty: false,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Render `event` as a JSON document.
    ///
    /// Text data that is itself JSON is embedded verbatim (number precision
    /// and key order survive); any other text is embedded as a JSON string.
    /// Binary data goes to `data_base64`.
    pub fn encode(&self, event: &CloudEvent) -> EnvelopeResult<String> {
        let data = match event.data() {
            Some(Data::String(text)) => Some(
                serde_json::from_str::<&RawValue>(text)
                    .map(DataMember::Json)
                    .unwrap_or(DataMember::Text(text)),
            ),
            _ => None,
        };
        let document = Document {
            members: self.members(event),
            data,
        };

        let text = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        debug!(id = event.id(), bytes = text.len(), "encoded structured-mode event");
        Ok(text)
    }

    fn members(&self, event: &CloudEvent) -> Map<String, JsonValue> {
        let mut map = Map::new();
        map.insert(SPECVERSION.into(), SPEC_VERSION.into());
        map.insert(ID.into(), event.id().into());
        if let Some(source) = event.source() {
            map.insert(SOURCE.into(), source.as_str().into());
        }
        if let Some(event_type) = event.event_type() {
            map.insert(TYPE.into(), event_type.into());
        }
        if let Some(content_type) = event.data_content_type() {
            map.insert(DATACONTENTTYPE.into(), content_type.as_str().into());
        }
        if let Some(schema) = event.data_schema() {
            map.insert(DATASCHEMA.into(), schema.as_str().into());
        }
        if let Some(subject) = event.subject() {
            map.insert(SUBJECT.into(), subject.into());
        }
        map.insert(TIME.into(), format_round_trip(&event.time()).into());

        for (name, value) in event.attributes() {
            map.insert(name.clone(), value.as_str().into());
        }

        if let Some(Data::Binary(bytes)) = event.data() {
            map.insert(DATA_BASE64.into(), STANDARD.encode(bytes).into());
        }

        map
    }

    /// Parse a JSON document into an envelope.
    ///
    /// `data` keeps its original text: a JSON string member yields its
    /// unquoted value, anything else the member's raw JSON.
    pub fn decode(&self, json: &str) -> EnvelopeResult<CloudEvent> {
        if json.trim().is_empty() {
            return Err(EnvelopeError::InvalidArgument("json"));
        }
        let mut members: BTreeMap<String, &RawValue> =
            serde_json::from_str(json).map_err(|e| {
                if serde_json::from_str::<&RawValue>(json).is_ok() {
                    EnvelopeError::validation("structured event must be a JSON object")
                } else {
                    EnvelopeError::validation(format!("malformed structured event: {e}"))
                }
            })?;

        if let Some(version) = members.remove(SPECVERSION) {
            if string_member(version).as_deref() != Some(SPEC_VERSION) {
                return Err(EnvelopeError::validation(format!(
                    "unsupported specversion {version} (expected '{SPEC_VERSION}')"
                )));
            }
        }

        let binary = match members.remove(DATA_BASE64) {
            None => None,
            Some(raw) => {
                let encoded = string_member(raw).ok_or_else(|| {
                    EnvelopeError::validation("'data_base64' member must have a string value")
                })?;
                Some(STANDARD.decode(encoded).map_err(|_| {
                    EnvelopeError::validation(
                        "'data_base64' member must have a valid base-64 encoded binary value",
                    )
                })?)
            }
        };

        let data = members.remove(DATA);
        if binary.is_some() && data.is_some() {
            return Err(EnvelopeError::validation(
                "'data' and 'data_base64' members cannot both have values",
            ));
        }

        let mut event = CloudEvent::with_binding(self.binding);
        for (name, raw) in members {
            let Some(text) = string_member(raw) else {
                return Err(EnvelopeError::validation(format!(
                    "Invalid value for '{name}' member"
                )));
            };
            apply_member(&mut event, &name, text)?;
        }

        match (binary, data) {
            (Some(bytes), _) => event.set_data(bytes),
            (None, Some(raw)) => {
                event.set_data(string_member(raw).unwrap_or_else(|| raw.get().to_string()))
            }
            (None, None) => {}
        }

        debug!(attributes = event.attributes().len(), "decoded structured-mode event");
        Ok(event)
    }
}

/// Document layout: attribute members first, then `data`.
#[derive(Serialize)]
struct Document<'a> {
    #[serde(flatten)]
    members: Map<String, JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<DataMember<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum DataMember<'a> {
    Json(&'a RawValue),
    Text(&'a str),
}

fn string_member(raw: &RawValue) -> Option<String> {
    serde_json::from_str(raw.get()).ok()
}

fn apply_member(event: &mut CloudEvent, name: &str, text: String) -> EnvelopeResult<()> {
    let invalid = || EnvelopeError::validation(format!("Invalid value for '{name}' member"));
    match name {
        ID => event.set_id(text).map_err(|_| invalid()),
        SOURCE => {
            event.set_source(Uri::parse(text).map_err(|_| invalid())?);
            Ok(())
        }
        TYPE => {
            event.set_event_type(text);
            Ok(())
        }
        DATACONTENTTYPE => {
            event.set_data_content_type(Some(ContentType::parse(text).map_err(|_| invalid())?));
            Ok(())
        }
        DATASCHEMA => {
            event.set_data_schema(Some(Uri::parse(text).map_err(|_| invalid())?));
            Ok(())
        }
        SUBJECT => {
            event.set_subject(Some(text));
            Ok(())
        }
        TIME => {
            event.set_time(parse_instant(&text).ok_or_else(invalid)?);
            Ok(())
        }
        _ => event.set_attribute(name, text),
    }
}
