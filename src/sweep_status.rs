use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct SweepStatus {
    inner: Arc<Mutex<SweepStatusData>>,
}

#[derive(Default)]
struct SweepStatusData {
    phase: String,
    total_points: usize,
    completed_points: usize,
    invalid_points: usize,
    insufficient_points: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepStatusSnapshot {
    pub phase: String,
    pub total_points: usize,
    pub completed_points: usize,
    pub invalid_points: usize,
    pub insufficient_points: usize,
}

impl SweepStatusSnapshot {
    pub fn skipped_points(&self) -> usize {
        self.invalid_points + self.insufficient_points
    }
}

impl SweepStatus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SweepStatusData {
                phase: "Initializing".to_string(),
                ..Default::default()
            })),
        }
    }

    pub fn set_phase<S: Into<String>>(&self, phase: S) {
        if let Ok(mut data) = self.inner.lock() {
            data.phase = phase.into();
        }
    }

    /// Start a new run: set the total and zero every counter.
    pub fn reset(&self, total_points: usize) {
        if let Ok(mut data) = self.inner.lock() {
            data.total_points = total_points;
            data.completed_points = 0;
            data.invalid_points = 0;
            data.insufficient_points = 0;
        }
    }

    pub fn record_completed(&self) {
        if let Ok(mut data) = self.inner.lock() {
            data.completed_points += 1;
        }
    }

    pub fn record_invalid(&self) {
        if let Ok(mut data) = self.inner.lock() {
            data.invalid_points += 1;
        }
    }

    pub fn record_insufficient(&self) {
        if let Ok(mut data) = self.inner.lock() {
            data.insufficient_points += 1;
        }
    }

    pub fn snapshot(&self) -> SweepStatusSnapshot {
        if let Ok(data) = self.inner.lock() {
            SweepStatusSnapshot {
                phase: data.phase.clone(),
                total_points: data.total_points,
                completed_points: data.completed_points,
                invalid_points: data.invalid_points,
                insufficient_points: data.insufficient_points,
            }
        } else {
            SweepStatusSnapshot {
                phase: "Status unavailable".to_string(),
                total_points: 0,
                completed_points: 0,
                invalid_points: 0,
                insufficient_points: 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let status = SweepStatus::new();
        let worker = status.clone();
        status.reset(3);
        worker.record_completed();
        worker.record_invalid();
        worker.record_insufficient();
        let snapshot = status.snapshot();
        assert_eq!(snapshot.phase, "Initializing");
        assert_eq!(snapshot.completed_points, 1);
        assert_eq!(snapshot.skipped_points(), 2);
    }

    #[test]
    fn reset_clears_previous_counts() {
        let status = SweepStatus::new();
        status.reset(2);
        status.record_completed();
        status.record_invalid();
        status.reset(5);
        let snapshot = status.snapshot();
        assert_eq!(snapshot.total_points, 5);
        assert_eq!(snapshot.completed_points, 0);
        assert_eq!(snapshot.skipped_points(), 0);
    }
}
