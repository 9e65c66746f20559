use crate::Scalar;

/// Pipeline stages with their fixed shares of overall progress. The shares
/// sum to 100, so completing every stage in order drives a tracker from 0
/// to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Analysis buffer preparation.
    Prepare,
    /// Density field computation.
    Density,
    /// Point sampling.
    Points,
    /// Incremental triangulation.
    Triangulation,
    /// Artifact rendering.
    Rendering,
}

impl PipelineStage {
    /// Returns the stage's share of the overall progress, in percent.
    pub fn weight(self) -> Scalar {
        match self {
            Self::Prepare => 5.0,
            Self::Density => 20.0,
            Self::Points => 25.0,
            Self::Triangulation => 40.0,
            Self::Rendering => 10.0,
        }
    }
}

/// Accumulates per-stage progress and reports it as a non-decreasing
/// integer percentage in `[0, 100]` through an optional callback.
pub struct ProgressTracker<F>
where
    F: FnMut(u32),
{
    current: Scalar,
    reported: u32,
    callback: Option<F>,
}

impl<F> ProgressTracker<F>
where
    F: FnMut(u32),
{
    /// Create new tracker at zero progress.
    pub fn new(callback: Option<F>) -> Self {
        Self {
            current: 0.0,
            reported: 0,
            callback,
        }
    }

    /// Mark a stage as completed, advancing the accumulated progress by its
    /// full weight.
    pub fn complete(&mut self, stage: PipelineStage) {
        self.current = (self.current + stage.weight()).min(100.0);
        let value = self.current;
        self.report(value);
    }

    /// Report partial progress within a stage without advancing the
    /// accumulator; `fraction` is clamped to `[0, 1]`.
    pub fn partial(&mut self, stage: PipelineStage, fraction: Scalar) {
        let value = self.current + stage.weight() * fraction.clamp(0.0, 1.0);
        self.report(value);
    }

    fn report(&mut self, value: Scalar) {
        let percent = (value.floor() as u32).min(100);
        if percent >= self.reported {
            self.reported = percent;
            if let Some(callback) = self.callback.as_mut() {
                callback(percent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_weights_sum_to_hundred() {
        let total: Scalar = [
            PipelineStage::Prepare,
            PipelineStage::Density,
            PipelineStage::Points,
            PipelineStage::Triangulation,
            PipelineStage::Rendering,
        ]
        .iter()
        .map(|s| s.weight())
        .sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn completing_all_stages_reaches_hundred() {
        let mut reports = Vec::new();
        {
            let mut tracker = ProgressTracker::new(Some(|p| reports.push(p)));
            tracker.complete(PipelineStage::Prepare);
            tracker.complete(PipelineStage::Density);
            tracker.complete(PipelineStage::Points);
            tracker.complete(PipelineStage::Triangulation);
            tracker.complete(PipelineStage::Rendering);
        }
        assert_eq!(reports, vec![5, 25, 50, 90, 100]);
    }

    #[test]
    fn reports_are_monotonic() {
        let mut reports = Vec::new();
        {
            let mut tracker = ProgressTracker::new(Some(|p| reports.push(p)));
            tracker.complete(PipelineStage::Prepare);
            tracker.complete(PipelineStage::Density);
            tracker.complete(PipelineStage::Points);
            tracker.partial(PipelineStage::Triangulation, 0.5);
            tracker.partial(PipelineStage::Triangulation, 0.25);
            tracker.partial(PipelineStage::Triangulation, 0.75);
            tracker.complete(PipelineStage::Triangulation);
            tracker.complete(PipelineStage::Rendering);
        }
        for pair in reports.windows(2) {
            assert!(pair[0] <= pair[1], "regressed: {:?}", reports);
        }
        assert_eq!(*reports.last().unwrap(), 100);
    }

    #[test]
    fn partial_fraction_is_clamped() {
        let mut reports = Vec::new();
        {
            let mut tracker = ProgressTracker::new(Some(|p| reports.push(p)));
            tracker.partial(PipelineStage::Triangulation, 7.0);
        }
        assert_eq!(reports, vec![40]);
    }
}
