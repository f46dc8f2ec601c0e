pub mod chain;
pub mod lead;
pub mod part;
pub mod plan;
pub mod validation;

pub use chain::detect_shape_chains;
pub use lead::{calculate_leads, calculate_leads_with_tolerance};
pub use part::{detect_parts, detect_parts_with_tolerance};
pub use plan::{CutPlan, CutPlanner, PartSummary, PlannedPath, PlannerOptions};
pub use validation::{validate_lead_configuration, validate_lead_configuration_with_tolerance};

pub mod errors {
    use thiserror::Error;
    use zcam_core::chain::ChainId;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("{0} not found")]
        ChainNotFound(ChainId),
    }
}
