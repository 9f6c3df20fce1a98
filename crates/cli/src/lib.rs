//! `courier` command line: inspect and convert structured-mode events.
//!
//! Every command reads one structured-mode JSON event on stdin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use courier_core::EnvelopeResult;
use courier_events::message::CONTENT_TYPE;
use courier_events::structured::STRUCTURED_CONTENT_TYPE;
use courier_events::{
    Binding, CloudEvent, CodecConfig, ContentMode, Headers, ReceivedMessage, StructuredCodec,
    encode_message, registry,
};

#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(about = "Validate and convert CloudEvents envelopes read from stdin")]
pub struct Cli {
    /// Protocol binding (overrides COURIER_BINDING)
    #[arg(short, long, global = true)]
    pub binding: Option<Binding>,

    /// Pretty-print JSON output (overrides COURIER_JSON_PRETTY)
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Decode and validate the event, then print it normalized
    Validate {
        /// Envelope kind whose rules apply (see `Registry::tags`)
        #[arg(short, long, default_value = "cloudevent")]
        kind: String,
    },
    /// Print the binary-mode projection (`headers` + `payload`)
    Binary,
    /// Re-encode as structured-mode JSON
    Structured,
}

impl Cli {
    /// Environment configuration with command line overrides applied.
    pub fn config(&self) -> EnvelopeResult<CodecConfig> {
        CodecConfig::from_env().map(|config| self.apply(config))
    }

    fn apply(&self, mut config: CodecConfig) -> CodecConfig {
        if let Some(binding) = self.binding {
            config = config.with_binding(binding);
        }
        if self.pretty {
            config = config.with_pretty(true);
        }
        config
    }
}

/// Run `command` over the JSON document `input`, returning what to print.
pub fn run(command: &Command, input: &str, config: CodecConfig) -> Result<String> {
    let structured = StructuredCodec::new(config.binding).pretty(config.pretty);

    match command {
        Command::Validate { kind } => {
            let headers = Headers::from_iter([(CONTENT_TYPE, STRUCTURED_CONTENT_TYPE)]);
            let message = ReceivedMessage::new(input, headers);
            let event = registry::global()
                .decode(kind, message, Some(config.binding))
                .with_context(|| format!("event is not a valid '{kind}' envelope"))?;
            info!(kind = %kind, id = event.id(), "event is valid");
            Ok(structured.encode(&event)?)
        }
        Command::Binary => {
            let event = parse(&structured, input)?;
            let message = encode_message(&event, &config.with_mode(ContentMode::Binary))?;
            let rendered = if config.pretty {
                serde_json::to_string_pretty(&message)
            } else {
                serde_json::to_string(&message)
            };
            Ok(rendered.context("failed to render binary-mode message")?)
        }
        Command::Structured => {
            let event = parse(&structured, input)?;
            Ok(structured.encode(&event)?)
        }
    }
}

fn parse(codec: &StructuredCodec, input: &str) -> Result<CloudEvent> {
    codec
        .decode(input)
        .context("stdin is not a structured-mode CloudEvent")
}
