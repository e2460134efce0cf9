//! JSON exchange format for whole graphs.
//!
//! The payload holds a `%TYPES` section (optional), every record under
//! `%FEATURE_STRUCTURES` and index membership under `%VIEWS`. Reading is
//! all-or-nothing: the payload is loaded into an empty graph bound to the
//! target's type system, which replaces the target only once everything,
//! references and indexes included, has been read.

mod deserializer;
pub mod names;
mod serializer;

use crate::cas::Cas;
use crate::core::config::CodecConfig;
use crate::core::error::{Result, SerializationError};
use crate::system::metrics::{Metrics, Timer};
use std::io::{Read, Write};
use tracing::debug;

/// Serializer and deserializer for the JSON exchange format
#[derive(Debug, Clone, Default)]
pub struct JsonCasCodec {
    config: CodecConfig,
}

impl JsonCasCodec {
    /// Create a codec with the given settings
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Codec settings
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Build the payload as a JSON value
    pub fn to_value(&self, cas: &Cas) -> Result<serde_json::Value> {
        serializer::write(cas, &self.config)
    }

    /// Serialize a graph to a string
    pub fn serialize(&self, cas: &Cas) -> Result<String> {
        let timer = Timer::start(Metrics::global().codec.duration.clone());
        let payload = self.to_value(cas)?;
        let text = if self.config.pretty {
            serde_json::to_string_pretty(&payload)
        } else {
            serde_json::to_string(&payload)
        }
        .map_err(SerializationError::from)?;

        Metrics::global().codec.payloads_serialized.inc();
        timer.finish();
        debug!(records = cas.len(), bytes = text.len(), "graph serialized");
        Ok(text)
    }

    /// Serialize a graph into a writer
    pub fn serialize_to_writer<W: Write>(&self, cas: &Cas, mut writer: W) -> Result<()> {
        let timer = Timer::start(Metrics::global().codec.duration.clone());
        let payload = self.to_value(cas)?;
        if self.config.pretty {
            serde_json::to_writer_pretty(&mut writer, &payload)
        } else {
            serde_json::to_writer(&mut writer, &payload)
        }
        .map_err(SerializationError::from)?;
        writer.flush()?;

        Metrics::global().codec.payloads_serialized.inc();
        timer.finish();
        debug!(records = cas.len(), "graph serialized to writer");
        Ok(())
    }

    /// Replace the content of `cas` with the graph in `payload`.
    ///
    /// On error `cas` is left exactly as it was.
    pub fn deserialize(&self, cas: &mut Cas, payload: &str) -> Result<()> {
        let parsed: Result<serde_json::Value> =
            serde_json::from_str(payload).map_err(|e| SerializationError::Json(e).into());
        self.load(cas, parsed)
    }

    /// [`deserialize`](Self::deserialize) from a reader
    pub fn deserialize_from_reader<R: Read>(&self, cas: &mut Cas, reader: R) -> Result<()> {
        let parsed: Result<serde_json::Value> =
            serde_json::from_reader(reader).map_err(|e| SerializationError::Json(e).into());
        self.load(cas, parsed)
    }

    /// [`deserialize`](Self::deserialize) from an already parsed value
    pub fn deserialize_value(&self, cas: &mut Cas, payload: serde_json::Value) -> Result<()> {
        self.load(cas, Ok(payload))
    }

    fn load(&self, cas: &mut Cas, parsed: Result<serde_json::Value>) -> Result<()> {
        let metrics = &Metrics::global().codec;
        let timer = Timer::start(metrics.duration.clone());

        let mut fresh = cas.new_instance();
        let outcome = parsed.and_then(|payload| deserializer::read(&mut fresh, payload));
        timer.finish();

        match outcome {
            Ok(()) => {
                *cas = fresh;
                metrics.payloads_deserialized.inc();
                debug!(records = cas.len(), views = cas.views().count(), "graph deserialized");
                Ok(())
            }
            Err(e) => {
                metrics.deserialize_failures.inc();
                debug!(error = %e, "payload rejected");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::tests::sample_type_system;
    use crate::core::error::Error;
    use crate::types::builtin::INITIAL_VIEW_NAME;

    #[test]
    fn test_round_trip_through_writer() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "Hello world").unwrap();
        let token = cas.type_system().type_by_name("example.Token").unwrap();
        let id = cas.create_instance(token).unwrap();
        cas.set_value(id, "end", 5).unwrap();
        cas.set_value(id, "pos", "UH").unwrap();
        cas.add_to_indexes(id, INITIAL_VIEW_NAME).unwrap();

        let codec = JsonCasCodec::new(CodecConfig {
            pretty: true,
            ..CodecConfig::default()
        });
        let mut buffer = Vec::new();
        codec.serialize_to_writer(&cas, &mut buffer).unwrap();

        let mut copy = cas.new_instance();
        codec.deserialize_from_reader(&mut copy, buffer.as_slice()).unwrap();
        let tokens = copy.select(INITIAL_VIEW_NAME, token);
        assert_eq!(tokens.len(), 1);
        assert_eq!(copy.covered_text(tokens[0]).unwrap(), "Hello");
        assert_eq!(copy.get_value(tokens[0], "pos").unwrap().as_str(), Some("UH"));
    }

    #[test]
    fn test_syntax_error_leaves_target() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "kept").unwrap();
        let before = cas.len();

        let err = JsonCasCodec::default().deserialize(&mut cas, "{ not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(SerializationError::Json(_))));
        assert_eq!(cas.len(), before);
        assert_eq!(cas.document_text(INITIAL_VIEW_NAME), Some("kept"));
    }

    #[test]
    fn test_deserialize_replaces_content() {
        let mut source = Cas::new(sample_type_system()).unwrap();
        source.set_document_text(INITIAL_VIEW_NAME, "new").unwrap();
        let codec = JsonCasCodec::default();
        let payload = codec.serialize(&source).unwrap();

        let mut target = source.new_instance();
        target.set_document_text(INITIAL_VIEW_NAME, "old text").unwrap();
        target.create_view("scratch");
        codec.deserialize(&mut target, &payload).unwrap();

        assert_eq!(target.document_text(INITIAL_VIEW_NAME), Some("new"));
        assert!(target.view("scratch").is_none());
    }
}
