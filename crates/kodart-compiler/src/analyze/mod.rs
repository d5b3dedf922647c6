//! Analysis
//!
//! Upstream diagnostic suppression, target constness, and the checkers that
//! run interleaved with lowering.

pub mod checker;
pub mod checkers;
pub mod constness;
pub mod suppress;

pub use checker::{CheckContext, CheckRunner, Checker, CheckerMeta};
pub use constness::ConstEvaluator;
pub use suppress::{admit_upstream, DiagnosticParameter, SuppressionRule, UpstreamDiagnostic, SUPPRESSION_RULES};
