use std::io::Write;

use harvest_engine::{HarvestEvent, LocationOutcome, ProgressSink};

/// Prints one line per finished location to stdout.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn emit(&self, event: HarvestEvent) {
        match event {
            HarvestEvent::LocationStarted {
                index,
                total,
                location,
            } => {
                print!("[{}/{}] {}: ", index + 1, total, location);
                let _ = std::io::stdout().flush();
            }
            HarvestEvent::LocationFinished(report) => println!("{}", describe(&report.outcome)),
        }
    }
}

pub fn describe(outcome: &LocationOutcome) -> String {
    match outcome {
        LocationOutcome::Extracted { found, new_events } => {
            format!("{found} events ({new_events} new)")
        }
        LocationOutcome::NoMarkup => "no event markup found".to_string(),
        LocationOutcome::Empty => "no events listed".to_string(),
        LocationOutcome::Blocked => "blocked, skipped".to_string(),
        LocationOutcome::AcquisitionFailed(kind) => format!("failed ({kind})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_engine::FailureKind;

    #[test]
    fn outcomes_read_as_short_phrases() {
        assert_eq!(
            describe(&LocationOutcome::Extracted {
                found: 4,
                new_events: 1
            }),
            "4 events (1 new)"
        );
        assert_eq!(
            describe(&LocationOutcome::AcquisitionFailed(FailureKind::HttpStatus(502))),
            "failed (http status 502)"
        );
    }
}
