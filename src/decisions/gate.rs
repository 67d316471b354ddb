use serde::{Deserialize, Serialize};

/// Dispersion below this among the top candidates means consensus.
pub const FLOW_THRESHOLD: f64 = 0.15;
/// Dispersion above this means conflicting signal.
pub const BLOCK_THRESHOLD: f64 = 0.35;
/// Number of top-ranked scores considered.
pub const TOP_K: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Gate {
    /// Safe to proceed.
    Flow,
    /// Needs a second look.
    Hold,
    /// Must not proceed automatically.
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub gate: Gate,
    pub stddev: f64,
}

/// Classify a decision from candidate scores.
///
/// Takes the three highest scores (all of them when fewer are given) and
/// gates on their population standard deviation. An empty input is `HOLD`
/// with zero dispersion.
pub fn classify(scores: &[f64]) -> GateOutcome {
    if scores.is_empty() {
        return GateOutcome {
            gate: Gate::Hold,
            stddev: 0.0,
        };
    }

    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.total_cmp(a));
    ranked.truncate(TOP_K);

    let stddev = population_stddev(&ranked);
    let gate = if stddev < FLOW_THRESHOLD {
        Gate::Flow
    } else if stddev > BLOCK_THRESHOLD {
        Gate::Block
    } else {
        Gate::Hold
    };

    GateOutcome { gate, stddev }
}

#[allow(clippy::cast_precision_loss)]
fn population_stddev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
