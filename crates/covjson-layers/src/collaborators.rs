//! Interfaces to the host that displays layers.
//!
//! The pipeline never shows dialogs or touches a map canvas itself; the
//! host implements these traits and [`load_layers`] drives them.

use covjson::CoverageJsonReader;
use tracing::info;

use crate::error::LayerResult;
use crate::layer::{LayerMaterializer, MapLayer};

/// Asks the user whether to continue with a large document.
pub trait SizeConfirmation {
    /// Show `message` and return the user's answer.
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> SizeConfirmation for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Receives finished layers.
pub trait LayerSink {
    /// Add `layers` to the host under a group called `group_name`.
    ///
    /// # Arguments
    /// * `layers` - Layers in the order they were materialized
    /// * `group_name` - Name of the group, usually the file name
    fn register(&mut self, layers: Vec<MapLayer>, group_name: &str) -> LayerResult<()>;
}

/// Progress and status messages for the user.
pub trait StatusSink {
    fn notify(&mut self, message: &str);
}

/// Status sink that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentStatus;

impl StatusSink for SilentStatus {
    fn notify(&mut self, _message: &str) {}
}

/// Result of [`load_layers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Number of layers handed to the sink.
    Loaded(usize),
    /// The user declined to load a large document.
    Declined,
}

/// Materialize a document and register its layers.
///
/// Large documents (see [`crate::SizeGuard`]) are only loaded after
/// `confirmation` agrees.
pub fn load_layers(
    reader: &CoverageJsonReader,
    materializer: &LayerMaterializer,
    group_name: &str,
    confirmation: &mut dyn SizeConfirmation,
    sink: &mut dyn LayerSink,
    status: &mut dyn StatusSink,
) -> LayerResult<LoadOutcome> {
    let guard = materializer.config().size_guard;
    if guard.requires_confirmation(reader) && !confirmation.confirm(&guard.prompt(reader)) {
        status.notify("File not loaded.");
        return Ok(LoadOutcome::Declined);
    }

    status.notify(&format!("Parsing '{}' CoverageJSON ...", group_name));
    let layers = materializer.map_layers(reader)?;
    let count = layers.len();
    status.notify("CoverageJSON parsed successfully.");

    sink.register(layers, group_name)?;
    info!(group = group_name, layers = count, "registered layers");

    Ok(LoadOutcome::Loaded(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayerConfig, SizeGuard};
    use test_utils::GridFixture;

    #[derive(Default)]
    struct RecordingSink {
        groups: Vec<(String, Vec<String>)>,
    }

    impl LayerSink for RecordingSink {
        fn register(&mut self, layers: Vec<MapLayer>, group_name: &str) -> LayerResult<()> {
            let names = layers.iter().map(|l| l.name().to_string()).collect();
            self.groups.push((group_name.to_string(), names));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingStatus(Vec<String>);

    impl StatusSink for RecordingStatus {
        fn notify(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    fn reader() -> CoverageJsonReader {
        let doc = GridFixture::new(4, 3).with_parameter("TMP", Some("K")).build();
        CoverageJsonReader::from_str(&doc.to_string()).unwrap()
    }

    #[test]
    fn test_small_document_loads_without_asking() {
        let materializer = LayerMaterializer::new(LayerConfig::default());
        let mut asked = false;
        let mut confirm = |_: &str| {
            asked = true;
            false
        };
        let mut sink = RecordingSink::default();
        let mut status = RecordingStatus::default();

        let outcome = load_layers(&reader(), &materializer, "grid.covjson", &mut confirm, &mut sink, &mut status)
            .unwrap();

        assert_eq!(outcome, LoadOutcome::Loaded(1));
        assert!(!asked);
        assert_eq!(sink.groups.len(), 1);
        assert_eq!(sink.groups[0].0, "grid.covjson");
        assert_eq!(status.0.last().map(String::as_str), Some("CoverageJSON parsed successfully."));
    }

    #[test]
    fn test_declined_document_registers_nothing() {
        let config = LayerConfig {
            size_guard: SizeGuard {
                max_coverages: 0,
                max_size_mb: 0.0,
            },
            ..LayerConfig::default()
        };
        let materializer = LayerMaterializer::new(config);
        let mut prompts = Vec::new();
        let mut confirm = |msg: &str| {
            prompts.push(msg.to_string());
            false
        };
        let mut sink = RecordingSink::default();

        let outcome = load_layers(&reader(), &materializer, "big", &mut confirm, &mut sink, &mut SilentStatus)
            .unwrap();

        assert_eq!(outcome, LoadOutcome::Declined);
        assert!(sink.groups.is_empty());
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Do you want to continue?"));
    }
}
