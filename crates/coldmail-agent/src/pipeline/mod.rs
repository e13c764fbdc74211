//! Pipelines built on top of the gateway and the tool-calling loop.

pub mod email;
pub mod reporter;
pub mod research;
pub mod result;

pub use email::{EmailPipeline, Selection, Variant, personalization_score, score, select_best};
pub use reporter::{Stage, StepReporter, StepSummary, run_step};
pub use research::{ResearchOutcome, ResearchPipeline, research_prompt};
pub use result::{
    EMAIL_PIPELINE_STEPS, EmailPhase, EmailPipelineResult, ErrorResult, HybridResult,
    PipelineResult, ResearchPhase,
};
