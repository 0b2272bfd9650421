//! Parsing of read-command output into key/value attributes.

use crate::observer::{Event, Observer};
use crate::types::Outputs;

/// Parse `key=value` lines.
///
/// Empty lines are skipped. Lines without `=` are reported to the observer
/// and skipped; read commands may print diagnostics alongside their values.
/// Only the first `=` splits, so values may contain `=`. A repeated key
/// keeps its last value.
pub fn parse(raw: &str, observer: &dyn Observer) -> Outputs {
    let mut outputs = Outputs::new();

    for line in raw.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        observer.notify(&Event::OutputLine { line });

        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            observer.notify(&Event::LineIgnored { line });
            continue;
        };

        observer.notify(&Event::OutputValue { key, value });
        outputs.insert(key.to_string(), value.to_string());
    }

    outputs
}
