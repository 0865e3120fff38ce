//! Instance-type weight resolution

use std::collections::HashMap;

/// Build the instance-type weight map from launch configuration entries.
///
/// Entries without a weight are dropped rather than defaulted. When the same
/// instance type is listed more than once, the lower weight is kept.
// NOTE: lower-wins is the historical behaviour the scaling consumer relies on;
// do not switch to max without checking capacity planning.
pub fn resolve_weights<I, S>(entries: I) -> HashMap<String, f64>
where
    I: IntoIterator<Item = (S, Option<f64>)>,
    S: Into<String>,
{
    let mut weights: HashMap<String, f64> = HashMap::new();

    for (instance_type, weight) in entries {
        let Some(weight) = weight else {
            continue;
        };
        let instance_type = instance_type.into();
        if instance_type.is_empty() {
            continue;
        }

        weights
            .entry(instance_type)
            .and_modify(|existing| {
                if weight < *existing {
                    *existing = weight;
                }
            })
            .or_insert(weight);
    }

    weights
}
