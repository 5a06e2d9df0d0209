//! Terminal implementations of the layer pipeline collaborators.

use std::io::{self, BufRead, Write};

use covjson_layers::{LayerResult, LayerSink, LayerSummary, MapLayer, SizeConfirmation, StatusSink};
use tracing::info;

/// Asks on stderr and reads a y/n answer from stdin.
///
/// With `assume_yes` set the question is logged and answered yes.
pub struct TerminalConfirmation {
    pub assume_yes: bool,
}

impl SizeConfirmation for TerminalConfirmation {
    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            info!("{}", message.replace('\n', " "));
            return true;
        }

        eprint!("{} [y/N] ", message);
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Keeps layer summaries grouped by name for the final report.
#[derive(Debug, Default)]
pub struct SummarySink {
    pub group: Option<String>,
    pub layers: Vec<LayerSummary>,
    /// Vector layers kept whole for GeoJSON export.
    pub vectors: Vec<MapLayer>,
}

impl LayerSink for SummarySink {
    fn register(&mut self, layers: Vec<MapLayer>, group_name: &str) -> LayerResult<()> {
        self.group = Some(group_name.to_string());
        for layer in layers {
            self.layers.push(layer.summary());
            if layer.as_vector().is_some() {
                self.vectors.push(layer);
            }
        }
        Ok(())
    }
}

/// Status messages go to the log.
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn notify(&mut self, message: &str) {
        info!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covjson::CoverageJsonReader;
    use covjson_layers::{LayerConfig, LayerMaterializer};
    use test_utils::{point_series, GridFixture};

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
    }

    #[test]
    fn test_assume_yes_confirms() {
        let mut confirmation = TerminalConfirmation { assume_yes: true };
        assert!(confirmation.confirm("Large file.\nDo you want to continue?"));
    }

    #[test]
    fn test_summary_sink_keeps_vectors() {
        let materializer = LayerMaterializer::new(LayerConfig::default());
        let mut sink = SummarySink::default();

        let grid = GridFixture::new(2, 2).with_parameter("P", None).build();
        let reader = CoverageJsonReader::from_str(&grid.to_string()).unwrap();
        sink.register(materializer.map_layers(&reader).unwrap(), "grid").unwrap();

        let series = CoverageJsonReader::from_str(&point_series(3).to_string()).unwrap();
        sink.register(materializer.map_layers(&series).unwrap(), "series").unwrap();

        assert_eq!(sink.group.as_deref(), Some("series"));
        assert_eq!(sink.layers.len(), 2);
        assert_eq!(sink.vectors.len(), 1);
    }
}
