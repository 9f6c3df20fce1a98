//! Codec configuration.
//!
//! Values come from the environment (or any lookup function in tests):
//! - `COURIER_BINDING`: `default`, `amqp`, `http`, `kafka`, `mqtt`
//! - `COURIER_CONTENT_MODE`: `binary` or `structured`
//! - `COURIER_JSON_PRETTY`: `true`/`false` (also `1`/`0`)
//!
//! Unset variables keep their defaults; the binding default is the
//! process-wide default binding.

use courier_core::{EnvelopeError, EnvelopeResult};

use crate::binding::{Binding, default_binding};
use crate::codec::ContentMode;
use crate::envelope::CloudEvent;

pub const BINDING_VAR: &str = "COURIER_BINDING";
pub const CONTENT_MODE_VAR: &str = "COURIER_CONTENT_MODE";
pub const JSON_PRETTY_VAR: &str = "COURIER_JSON_PRETTY";

/// How envelopes are put on (and read from) the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Header naming scheme.
    pub binding: Binding,
    /// Binary or structured framing for outgoing messages.
    pub mode: ContentMode,
    /// Pretty-print structured JSON.
    pub pretty: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            binding: default_binding(),
            mode: ContentMode::default(),
            pretty: false,
        }
    }
}

impl CodecConfig {
    /// Defaults, with the binding taken from `event`.
    pub fn for_event(event: &CloudEvent) -> Self {
        Self::default().with_binding(event.binding())
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_mode(mut self, mode: ContentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> EnvelopeResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through `lookup` (variable name → value).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> EnvelopeResult<Self> {
        let mut config = Self::default();

        if let Some(binding) = lookup(BINDING_VAR) {
            config.binding = binding
                .parse()
                .map_err(|e| EnvelopeError::config(format!("{BINDING_VAR}: {e}")))?;
        }
        if let Some(mode) = lookup(CONTENT_MODE_VAR) {
            config.mode = mode
                .parse()
                .map_err(|e| EnvelopeError::config(format!("{CONTENT_MODE_VAR}: {e}")))?;
        }
        if let Some(pretty) = lookup(JSON_PRETTY_VAR) {
            config.pretty = parse_flag(&pretty).ok_or_else(|| {
                EnvelopeError::config(format!(
                    "{JSON_PRETTY_VAR}: expected a boolean, got '{pretty}'"
                ))
            })?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
