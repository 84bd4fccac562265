//! Reference extraction over parsed artifacts.
//!
//! Extraction runs after the model registry is complete, so receivers can be
//! resolved against the full inheritance closure while references are being
//! collected. Both extractors emit [`RawUsage`] values; turning those into
//! resolved edges is the graph builders' job.

mod declarative;
mod imperative;

pub use declarative::DeclarativeExtractor;
pub use imperative::ImperativeExtractor;

use crate::graph::{Location, RawUsage, UsageKind};
use crate::registry::ModelRegistry;

/// Emit one read per hop of a dotted field path like `partner_id.company_id.name`,
/// following relational comodels across models.
///
/// Returns the comodel the final hop lands on, when it is relational. Hops
/// past an unresolvable segment cannot be bound to any model and are dropped.
pub(crate) fn dotted_field_reads(
    registry: &ModelRegistry,
    model: &str,
    path: &str,
    kind: UsageKind,
    location: &Location,
    sink: &mut Vec<RawUsage>,
) -> Option<String> {
    let mut current = model.to_string();
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        sink.push(RawUsage::known(
            current.clone(),
            segment,
            kind,
            location.clone(),
        ));
        match registry.field_comodel(&current, segment) {
            Some(comodel) => current = comodel.to_string(),
            None => return None,
        }
    }
    Some(current)
}
