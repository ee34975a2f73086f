use cf_solver::ProfileKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Planning,
    SegmentStarted,
    Escalated,
    SegmentCompleted,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub segment: Option<usize>,
    pub segment_count: usize,
    pub elapsed_wall_s: f64,
    pub sim_time_s: f64,
    pub soc: f64,
    pub profile: Option<ProfileKind>,
    pub message: Option<String>,
}

impl RunProgressEvent {
    pub fn fraction_complete(&self) -> f64 {
        match (self.stage, self.segment) {
            (RunStage::Completed, _) => 1.0,
            (RunStage::SegmentCompleted, Some(i)) if self.segment_count > 0 => {
                (i + 1) as f64 / self.segment_count as f64
            }
            (_, Some(i)) if self.segment_count > 0 => i as f64 / self.segment_count as f64,
            _ => 0.0,
        }
    }
}
