/// Events emitted by long-running workflows for a front end to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// An input left out of a batch without being attempted.
    Skipped { item: String, reason: String },
    /// An input that failed while the rest of the batch carried on.
    Failed { item: String, reason: String },
    /// A one-line summary shown once a workflow has finished.
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `f` between a `PhaseStart`/`PhaseFinish` pair.
    pub fn phase<T>(&self, name: &'static str, f: impl FnOnce() -> T) -> T {
        self.report(Progress::PhaseStart { name });
        let result = f();
        self.report(Progress::PhaseFinish);
        result
    }

    pub fn skipped(&self, item: impl ToString, reason: impl ToString) {
        self.report(Progress::Skipped {
            item: item.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn failed(&self, item: impl ToString, reason: impl ToString) {
        self.report(Progress::Failed {
            item: item.to_string(),
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording() -> (Arc<Mutex<Vec<Progress>>>, ProgressReporter<'static>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p| {
            sink.lock().unwrap().push(p);
        }));
        (events, reporter)
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::TaskIncrement);
        reporter.failed("a.pdb", "timeout");
        assert_eq!(reporter.phase("noop", || 7), 7);
    }

    #[test]
    fn phase_wraps_closure_with_start_and_finish() {
        let (events, reporter) = recording();

        reporter.phase("Loading", || reporter.report(Progress::TaskIncrement));

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                Progress::PhaseStart { name: "Loading" },
                Progress::TaskIncrement,
                Progress::PhaseFinish,
            ]
        );
    }

    #[test]
    fn skipped_and_failed_carry_item_and_reason() {
        let (events, reporter) = recording();

        reporter.skipped("notes.txt", "not a .pdb file");
        reporter.failed("model.pdb", "HTTP error 500");

        let events = events.lock().unwrap();
        assert_eq!(
            events[0],
            Progress::Skipped {
                item: "notes.txt".to_string(),
                reason: "not a .pdb file".to_string(),
            }
        );
        assert!(matches!(&events[1], Progress::Failed { item, .. } if item == "model.pdb"));
    }
}
