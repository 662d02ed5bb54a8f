//! Output sinks for the daemon.

use std::io::Write;

use fundwatch_market_data::{CycleSummary, FetchResult, ResultSink};
use serde::Serialize;

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum OutputRecord<'a> {
    Result(&'a FetchResult),
    CycleSummary(&'a CycleSummary),
}

/// Writes one JSON object per line on stdout.
#[derive(Clone, Default)]
pub struct JsonLinesSink;

impl JsonLinesSink {
    fn write(&self, record: OutputRecord<'_>) {
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to serialize output record: {}", e);
                return;
            }
        };
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line) {
            tracing::warn!("Failed to write output record: {}", e);
        }
    }
}

impl ResultSink for JsonLinesSink {
    fn on_result(&self, result: FetchResult) {
        self.write(OutputRecord::Result(&result));
    }

    fn on_cycle_summary(&self, summary: CycleSummary) {
        self.write(OutputRecord::CycleSummary(&summary));
    }
}
