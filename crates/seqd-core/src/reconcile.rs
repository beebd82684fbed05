//! Lifeline-height reconciliation.
//!
//! After any edit that can change an activation's temporal extent, every
//! lifeline must reach at least as far as the activations on it. Lifelines
//! only ever grow here; nothing in this module shrinks one.

use crate::id::PartKey;
use crate::model::SequenceGraph;

/// How far each lifeline must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeightPolicy {
    /// Each lifeline covers the activations it owns.
    #[default]
    PerLifeline,
    /// Every lifeline covers the latest activation anywhere in the diagram,
    /// so all lines end on the same row.
    Uniform,
}

/// A pending lifeline extension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightChange {
    pub lifeline: PartKey,
    pub from: f64,
    pub to: f64,
}

/// Compute which lifelines are too short, without touching the graph.
pub fn plan_lifeline_heights(graph: &SequenceGraph, policy: HeightPolicy) -> Vec<HeightChange> {
    let global_end = match policy {
        HeightPolicy::PerLifeline => None,
        HeightPolicy::Uniform => graph.activations().map(|a| a.end()).reduce(f64::max),
    };

    graph
        .lifelines()
        .filter_map(|lifeline| {
            let required = match policy {
                HeightPolicy::PerLifeline => graph
                    .activations_of(lifeline.key)
                    .map(|a| a.end())
                    .reduce(f64::max),
                HeightPolicy::Uniform => global_end,
            }?;
            (required > lifeline.duration).then_some(HeightChange {
                lifeline: lifeline.key,
                from: lifeline.duration,
                to: required,
            })
        })
        .collect()
}

/// Extend every lifeline that is shorter than its activations require.
/// Returns the applied changes; an empty result means nothing moved.
pub fn ensure_lifeline_heights(graph: &mut SequenceGraph, policy: HeightPolicy) -> Vec<HeightChange> {
    let changes = plan_lifeline_heights(graph, policy);
    for change in &changes {
        if let Some(lifeline) = graph.lifeline_mut(change.lifeline) {
            log::trace!(
                "extend lifeline {} from {} to {}",
                change.lifeline,
                change.from,
                change.to
            );
            lifeline.duration = change.to;
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Activation, Lifeline, Point};

    fn key(s: &str) -> PartKey {
        PartKey::intern(s)
    }

    fn sample() -> SequenceGraph {
        let mut g = SequenceGraph::new();
        g.add_lifeline(Lifeline::new(key("rc_A"), Point::new(0.0, 0.0), 3.0));
        g.add_lifeline(Lifeline::new(key("rc_B"), Point::new(100.0, 0.0), 10.0));
        g.add_lifeline(Lifeline::new(key("rc_C"), Point::new(200.0, 0.0), 1.0));
        g.add_activation(Activation::new(key("rc_a1"), key("rc_A"), 1.0, 1.0));
        g.add_activation(Activation::new(key("rc_a2"), key("rc_A"), 5.0, 1.5));
        g.add_activation(Activation::new(key("rc_b1"), key("rc_B"), 2.0, 1.0));
        g
    }

    #[test]
    fn per_lifeline_grows_only_short_lines() {
        let mut g = sample();
        let changes = ensure_lifeline_heights(&mut g, HeightPolicy::PerLifeline);

        assert_eq!(changes.len(), 1);
        assert_eq!(g.lifeline(key("rc_A")).unwrap().duration, 6.5);
        // Longer than needed: never shrunk.
        assert_eq!(g.lifeline(key("rc_B")).unwrap().duration, 10.0);
        // No activations: untouched.
        assert_eq!(g.lifeline(key("rc_C")).unwrap().duration, 1.0);
    }

    #[test]
    fn uniform_raises_everything_to_global_end() {
        let mut g = sample();
        ensure_lifeline_heights(&mut g, HeightPolicy::Uniform);

        assert_eq!(g.lifeline(key("rc_A")).unwrap().duration, 6.5);
        assert_eq!(g.lifeline(key("rc_B")).unwrap().duration, 10.0);
        assert_eq!(g.lifeline(key("rc_C")).unwrap().duration, 6.5);
    }

    #[test]
    fn reconciliation_is_idempotent_and_monotonic() {
        for policy in [HeightPolicy::PerLifeline, HeightPolicy::Uniform] {
            let mut g = sample();
            let before: Vec<f64> = g.lifelines().map(|l| l.duration).collect();
            ensure_lifeline_heights(&mut g, policy);
            let once: Vec<f64> = g.lifelines().map(|l| l.duration).collect();
            let second = ensure_lifeline_heights(&mut g, policy);
            let twice: Vec<f64> = g.lifelines().map(|l| l.duration).collect();

            assert!(second.is_empty(), "{policy:?}: second run must be a no-op");
            assert_eq!(once, twice);
            for (b, a) in before.iter().zip(&once) {
                assert!(a >= b, "{policy:?}: duration decreased");
            }
        }
    }

    #[test]
    fn plan_does_not_mutate() {
        let g = sample();
        let plan = plan_lifeline_heights(&g, HeightPolicy::PerLifeline);
        assert_eq!(
            plan,
            vec![HeightChange {
                lifeline: key("rc_A"),
                from: 3.0,
                to: 6.5
            }]
        );
        assert_eq!(g.lifeline(key("rc_A")).unwrap().duration, 3.0);
    }
}
