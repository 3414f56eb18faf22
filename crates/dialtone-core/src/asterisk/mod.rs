// Switch-facing half of the pipeline: config generation plus the AMI
// reload reconciler.

pub mod generator;
pub mod reconciler;

pub use generator::{GeneratedConfig, GenerationWarning, Generator};
pub use reconciler::{ReconcileReport, ReconcileState, Reconciler};
