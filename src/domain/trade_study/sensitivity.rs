//! Sensitivity Analyzer - How robust is the winner to changes in the weights?
//!
//! Four analyses, all re-running aggregation under perturbed weight vectors:
//! - Weight zeroing: drop one criterion at a time
//! - Tornado: swing one weight by ±X%
//! - Monte Carlo: sample every weight from a distribution around its value
//! - Breakeven: search for the weight at which the top two alternatives tie

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use tracing::{debug, warn};

use crate::domain::foundation::{AlternativeId, CriterionId, Percentage};

use super::{
    AggregatedResult, AggregationError, AggregationMethod, Aggregator, CriterionWeight,
    ScoredMatrix, SensitivityError, WeightVector,
};

/// Monte Carlo samples drawn per independently seeded block.
pub const SAMPLE_BLOCK_SIZE: usize = 256;

/// Default tornado perturbation.
pub const DEFAULT_TORNADO_SWING: u8 = 20;

const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Bisection halves the bracket; 200 steps exhaust f64 precision.
const MAX_BISECTION_STEPS: usize = 200;

/// Parameters for every sensitivity analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    pub tornado_swing: Percentage,
    pub monte_carlo: MonteCarloConfig,
    pub breakeven: BreakevenConfig,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            tornado_swing: Percentage::new(DEFAULT_TORNADO_SWING),
            monte_carlo: MonteCarloConfig::default(),
            breakeven: BreakevenConfig::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Weight zeroing
// ════════════════════════════════════════════════════════════════════════════════

/// Outcome of removing one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightZeroingResult {
    pub criterion_id: CriterionId,
    pub original_weight: f64,
    pub winner_without: AlternativeId,
    /// True when removing the criterion changes the winner.
    pub decision_driving: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Tornado
// ════════════════════════════════════════════════════════════════════════════════

/// One bar of a tornado diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TornadoBar {
    pub criterion_id: CriterionId,
    pub base_weight: f64,
    pub low_weight: f64,
    pub high_weight: f64,
    /// Baseline winner's score at the low weight.
    pub low_score: f64,
    /// Baseline winner's score at the high weight.
    pub high_score: f64,
    pub swing: f64,
    /// True when either end of the swing changes the winner.
    pub winner_flips: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Monte Carlo
// ════════════════════════════════════════════════════════════════════════════════

/// Distribution of one sampled weight around its assigned value `w`.
///
/// Spreads and standard deviations are relative to `w`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WeightDistribution {
    /// Triangular on `[w·(1−spread), w·(1+spread)]` with mode `w`.
    Triangular { spread: f64 },
    /// Normal with mean `w` and standard deviation `std_dev·w`.
    Normal { std_dev: f64 },
    /// Uniform on `[w·(1−spread), w·(1+spread)]`.
    Uniform { spread: f64 },
}

impl Default for WeightDistribution {
    fn default() -> Self {
        WeightDistribution::Triangular { spread: 0.2 }
    }
}

impl WeightDistribution {
    fn validate(&self) -> Result<(), String> {
        let (name, value) = match self {
            WeightDistribution::Triangular { spread } | WeightDistribution::Uniform { spread } => {
                ("spread", *spread)
            }
            WeightDistribution::Normal { std_dev } => ("std_dev", *std_dev),
        };
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{} must be finite and non-negative, got {}", name, value));
        }
        Ok(())
    }

    /// Draws one weight. May be negative; callers clamp.
    pub fn sample<R: Rng + ?Sized>(&self, base: f64, rng: &mut R) -> f64 {
        match *self {
            WeightDistribution::Triangular { spread } => {
                let low = base * (1.0 - spread);
                let high = base * (1.0 + spread);
                if high <= low {
                    return base;
                }
                let u: f64 = rng.gen();
                let mode_fraction = (base - low) / (high - low);
                if u < mode_fraction {
                    low + (u * (high - low) * (base - low)).sqrt()
                } else {
                    high - ((1.0 - u) * (high - low) * (high - base)).sqrt()
                }
            }
            WeightDistribution::Normal { std_dev } => {
                // Box-Muller; 1 − u keeps the log argument in (0, 1]
                let u1: f64 = rng.gen();
                let u2: f64 = rng.gen();
                let z = (-2.0 * (1.0 - u1).ln()).sqrt() * (2.0 * PI * u2).cos();
                base + std_dev * base * z
            }
            WeightDistribution::Uniform { spread } => {
                let low = base * (1.0 - spread);
                let high = base * (1.0 + spread);
                low + (high - low) * rng.gen::<f64>()
            }
        }
    }
}

/// Monte Carlo parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub samples: usize,
    /// Requests below this fail with `InsufficientSamples`.
    pub min_samples: usize,
    /// Iteration cap. Larger requests are clamped.
    pub max_samples: usize,
    pub seed: u64,
    /// Worker threads. Output does not depend on this.
    pub workers: usize,
    pub default_distribution: WeightDistribution,
    #[serde(default)]
    pub distributions: HashMap<CriterionId, WeightDistribution>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            min_samples: 100,
            max_samples: 100_000,
            seed: 42,
            workers: 1,
            default_distribution: WeightDistribution::default(),
            distributions: HashMap::new(),
        }
    }
}

impl MonteCarloConfig {
    pub fn with_distribution(
        mut self,
        criterion_id: impl Into<CriterionId>,
        distribution: WeightDistribution,
    ) -> Self {
        self.distributions.insert(criterion_id.into(), distribution);
        self
    }

    fn distribution_for(&self, criterion_id: &CriterionId) -> WeightDistribution {
        self.distributions
            .get(criterion_id)
            .copied()
            .unwrap_or(self.default_distribution)
    }
}

/// Closed interval of sampled scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Sampled behaviour of one alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloOutcome {
    pub alternative_id: AlternativeId,
    /// Share of samples this alternative won.
    pub win_frequency: f64,
    pub mean_score: f64,
    /// 2.5th to 97.5th percentile of the sampled scores.
    pub confidence_interval: ConfidenceInterval,
}

/// Monte Carlo result, most frequent winner first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub samples: usize,
    pub seed: u64,
    pub outcomes: Vec<MonteCarloOutcome>,
}

impl MonteCarloResult {
    pub fn win_frequency(&self, alternative_id: &AlternativeId) -> Option<f64> {
        self.outcome(alternative_id).map(|o| o.win_frequency)
    }

    pub fn confidence_interval(&self, alternative_id: &AlternativeId) -> Option<ConfidenceInterval> {
        self.outcome(alternative_id).map(|o| o.confidence_interval)
    }

    pub fn outcome(&self, alternative_id: &AlternativeId) -> Option<&MonteCarloOutcome> {
        self.outcomes
            .iter()
            .find(|o| &o.alternative_id == alternative_id)
    }
}

/// Wins and scores from one block, indexed by alternative column.
struct BlockTally {
    wins: Vec<usize>,
    scores: Vec<Vec<f64>>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Breakeven
// ════════════════════════════════════════════════════════════════════════════════

/// Breakeven search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakevenConfig {
    /// Coarse grid resolution over [0, 1].
    pub grid_steps: usize,
    /// Bisection stops once the bracket is narrower than this, or after
    /// 200 halvings.
    pub tolerance: f64,
}

impl Default for BreakevenConfig {
    fn default() -> Self {
        Self {
            grid_steps: 100,
            tolerance: 1e-9,
        }
    }
}

/// Weight at which the leader and challenger tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakevenPoint {
    pub criterion_id: CriterionId,
    pub baseline_weight: f64,
    pub breakeven_weight: f64,
    /// Baseline winner.
    pub leader: AlternativeId,
    /// Baseline runner-up.
    pub challenger: AlternativeId,
}

/// All sensitivity analyses for one study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub baseline: AggregatedResult,
    pub weight_zeroing: Vec<WeightZeroingResult>,
    pub tornado: Vec<TornadoBar>,
    pub monte_carlo: MonteCarloResult,
    pub breakeven: Vec<BreakevenPoint>,
    /// Criteria with no tie anywhere in [0, 1].
    pub no_breakeven: Vec<CriterionId>,
}

impl SensitivityReport {
    /// Criteria whose removal changes the winner.
    pub fn decision_driving_criteria(&self) -> Vec<&CriterionId> {
        self.weight_zeroing
            .iter()
            .filter(|r| r.decision_driving)
            .map(|r| &r.criterion_id)
            .collect()
    }
}

/// Sensitivity analysis functions.
pub struct SensitivityAnalyzer;

impl SensitivityAnalyzer {
    /// Runs every analysis.
    ///
    /// Breakeven is attempted for each criterion; criteria without a tie are
    /// listed in `no_breakeven`. With a single alternative breakeven is skipped.
    pub fn analyze(
        scored: &ScoredMatrix,
        weights: &WeightVector,
        method: AggregationMethod,
        config: &SensitivityConfig,
    ) -> Result<SensitivityReport, SensitivityError> {
        let baseline = Aggregator::aggregate(scored, weights, method)?;
        let weight_zeroing = Self::weight_zeroing(scored, weights, method)?;
        let tornado = Self::tornado(scored, weights, method, config.tornado_swing)?;
        let monte_carlo = Self::monte_carlo(scored, weights, method, &config.monte_carlo)?;

        let mut breakeven = Vec::new();
        let mut no_breakeven = Vec::new();
        for entry in weights.entries() {
            match Self::breakeven(scored, weights, method, &entry.criterion_id, &config.breakeven) {
                Ok(point) => breakeven.push(point),
                Err(SensitivityError::NoBreakeven { criterion_id }) => {
                    no_breakeven.push(criterion_id)
                }
                Err(SensitivityError::TooFewAlternatives { .. }) => break,
                Err(err) => return Err(err),
            }
        }

        debug!(
            criteria = weights.len(),
            decision_driving = weight_zeroing.iter().filter(|r| r.decision_driving).count(),
            breakeven = breakeven.len(),
            samples = monte_carlo.samples,
            "Sensitivity analysis complete"
        );

        Ok(SensitivityReport {
            baseline,
            weight_zeroing,
            tornado,
            monte_carlo,
            breakeven,
            no_breakeven,
        })
    }

    /// Re-aggregates with each criterion zeroed and the rest rescaled.
    ///
    /// # Edge Cases
    /// - Single criterion: returns an empty Vec (nothing is left to rescale)
    pub fn weight_zeroing(
        scored: &ScoredMatrix,
        weights: &WeightVector,
        method: AggregationMethod,
    ) -> Result<Vec<WeightZeroingResult>, SensitivityError> {
        if weights.len() < 2 {
            return Ok(Vec::new());
        }
        let baseline = Aggregator::aggregate(scored, weights, method)?;
        let baseline_winner = winner_of(&baseline)?;

        let mut results = Vec::with_capacity(weights.len());
        for entry in weights.entries() {
            let reduced = weights.without(&entry.criterion_id)?;
            let result = Aggregator::aggregate(scored, &reduced, method)?;
            let winner_without = winner_of(&result)?.clone();

            results.push(WeightZeroingResult {
                criterion_id: entry.criterion_id.clone(),
                original_weight: entry.weight,
                decision_driving: &winner_without != baseline_winner,
                winner_without,
            });
        }
        Ok(results)
    }

    /// Swings each weight by ±`swing` (relative, clamped to [0, 1]) and records
    /// the baseline winner's score at each end. Bars are sorted by swing,
    /// largest first, ties by criterion ID.
    pub fn tornado(
        scored: &ScoredMatrix,
        weights: &WeightVector,
        method: AggregationMethod,
        swing: Percentage,
    ) -> Result<Vec<TornadoBar>, SensitivityError> {
        let baseline = Aggregator::aggregate(scored, weights, method)?;
        let baseline_winner = winner_of(&baseline)?;

        let mut bars = Vec::with_capacity(weights.len());
        for entry in weights.entries() {
            let (low_weight, high_weight) = swing.band_around(entry.weight);

            let low_result = Aggregator::aggregate(
                scored,
                &weights.with_weight(&entry.criterion_id, low_weight)?,
                method,
            )?;
            let high_result = Aggregator::aggregate(
                scored,
                &weights.with_weight(&entry.criterion_id, high_weight)?,
                method,
            )?;

            let low_score = low_result.score_of(baseline_winner).unwrap_or_default();
            let high_score = high_result.score_of(baseline_winner).unwrap_or_default();

            bars.push(TornadoBar {
                criterion_id: entry.criterion_id.clone(),
                base_weight: entry.weight,
                low_weight,
                high_weight,
                low_score,
                high_score,
                swing: (high_score - low_score).abs(),
                winner_flips: winner_of(&low_result)? != baseline_winner
                    || winner_of(&high_result)? != baseline_winner,
            });
        }

        bars.sort_by(|a, b| {
            b.swing
                .total_cmp(&a.swing)
                .then_with(|| a.criterion_id.cmp(&b.criterion_id))
        });
        Ok(bars)
    }

    /// Samples weight vectors and tallies wins and score percentiles.
    ///
    /// # Algorithm
    /// Samples are split into blocks of [`SAMPLE_BLOCK_SIZE`]. Each block has
    /// its own RNG seeded from `(seed, block index)`, so blocks can run on any
    /// worker and merging them in block order gives the same result for any
    /// worker count. Each sample draws every weight, clamps negatives to 0 and
    /// rescales to sum to 1; an all-zero draw falls back to the base weights.
    ///
    /// # Errors
    /// - `InsufficientSamples` if `samples` is 0 or below `min_samples`
    /// - `InvalidDistribution` for bad parameters or an unknown criterion
    pub fn monte_carlo(
        scored: &ScoredMatrix,
        weights: &WeightVector,
        method: AggregationMethod,
        config: &MonteCarloConfig,
    ) -> Result<MonteCarloResult, SensitivityError> {
        let minimum = config.min_samples.max(1);
        if config.samples < minimum {
            return Err(SensitivityError::InsufficientSamples {
                requested: config.samples,
                minimum,
            });
        }
        let samples = if config.samples > config.max_samples {
            warn!(
                requested = config.samples,
                cap = config.max_samples,
                "Monte Carlo sample count clamped to iteration cap"
            );
            config.max_samples.max(1)
        } else {
            config.samples
        };
        Self::validate_distributions(weights, config)?;

        let blocks = samples.div_ceil(SAMPLE_BLOCK_SIZE);
        let run_block = |block: usize| {
            let count = SAMPLE_BLOCK_SIZE.min(samples - block * SAMPLE_BLOCK_SIZE);
            Self::run_block(scored, weights, method, config, block, count)
        };

        let workers = config.workers.clamp(1, blocks);
        let tallies: Vec<BlockTally> = if workers == 1 {
            (0..blocks).map(run_block).collect::<Result<_, _>>()?
        } else {
            let fan_out = || {
                (0..blocks)
                    .into_par_iter()
                    .map(run_block)
                    .collect::<Result<Vec<_>, _>>()
            };
            match ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(fan_out)?,
                Err(error) => {
                    warn!(workers, error = %error, "Worker pool unavailable, using the global pool");
                    fan_out()?
                }
            }
        };

        let alternatives = scored.table().alternative_ids();
        let mut wins = vec![0usize; alternatives.len()];
        let mut scores: Vec<Vec<f64>> = vec![Vec::with_capacity(samples); alternatives.len()];
        for tally in tallies {
            for (a, count) in tally.wins.into_iter().enumerate() {
                wins[a] += count;
            }
            for (a, sampled) in tally.scores.into_iter().enumerate() {
                scores[a].extend(sampled);
            }
        }

        let mut outcomes: Vec<MonteCarloOutcome> = alternatives
            .iter()
            .zip(wins)
            .zip(scores)
            .map(|((alternative_id, won), mut sampled)| {
                sampled.sort_by(f64::total_cmp);
                MonteCarloOutcome {
                    alternative_id: alternative_id.clone(),
                    win_frequency: won as f64 / samples as f64,
                    mean_score: sampled.iter().sum::<f64>() / sampled.len() as f64,
                    confidence_interval: ConfidenceInterval {
                        lower: percentile(&sampled, 0.025),
                        upper: percentile(&sampled, 0.975),
                    },
                }
            })
            .collect();
        outcomes.sort_by(|a, b| {
            b.win_frequency
                .total_cmp(&a.win_frequency)
                .then_with(|| a.alternative_id.cmp(&b.alternative_id))
        });

        debug!(
            samples,
            blocks,
            workers,
            seed = config.seed,
            "Monte Carlo sampling complete"
        );

        Ok(MonteCarloResult {
            samples,
            seed: config.seed,
            outcomes,
        })
    }

    fn validate_distributions(
        weights: &WeightVector,
        config: &MonteCarloConfig,
    ) -> Result<(), SensitivityError> {
        let mut unknown: Vec<&CriterionId> = config
            .distributions
            .keys()
            .filter(|id| weights.get(id).is_none())
            .collect();
        unknown.sort();
        if let Some(id) = unknown.first() {
            return Err(SensitivityError::InvalidDistribution {
                criterion_id: (*id).clone(),
                reason: "criterion has no weight".to_string(),
            });
        }

        for entry in weights.entries() {
            config
                .distribution_for(&entry.criterion_id)
                .validate()
                .map_err(|reason| SensitivityError::InvalidDistribution {
                    criterion_id: entry.criterion_id.clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    fn run_block(
        scored: &ScoredMatrix,
        weights: &WeightVector,
        method: AggregationMethod,
        config: &MonteCarloConfig,
        block: usize,
        count: usize,
    ) -> Result<BlockTally, AggregationError> {
        let table = scored.table();
        let mut rng = StdRng::seed_from_u64(
            config
                .seed
                .wrapping_add((block as u64).wrapping_mul(SEED_STRIDE)),
        );
        let mut tally = BlockTally {
            wins: vec![0; table.alternative_count()],
            scores: vec![Vec::with_capacity(count); table.alternative_count()],
        };

        for _ in 0..count {
            let drawn = weights
                .entries()
                .iter()
                .map(|e| {
                    let w = config
                        .distribution_for(&e.criterion_id)
                        .sample(e.weight, &mut rng);
                    CriterionWeight::new(e.criterion_id.clone(), w.max(0.0))
                })
                .collect();
            let sampled = WeightVector::renormalized(drawn).unwrap_or_else(|| weights.clone());
            let result = Aggregator::aggregate(scored, &sampled, method)?;

            for (a, alternative_id) in table.alternative_ids().iter().enumerate() {
                tally.scores[a].push(result.score_of(alternative_id).unwrap_or_default());
            }
            if let Some(winner) = result.winner() {
                if let Some(a) = table.alternative_index(&winner.alternative_id) {
                    tally.wins[a] += 1;
                }
            }
        }
        Ok(tally)
    }

    /// Finds the weight of `criterion_id` at which the baseline winner and
    /// runner-up tie, other weights keeping their relative proportions.
    ///
    /// # Algorithm
    /// 1. Evaluate `score(leader) − score(challenger)` on a grid over [0, 1].
    /// 2. Take the sign change (or exact tie) nearest the baseline weight.
    /// 3. Bisect the bracketing interval down to the tolerance.
    ///
    /// # Errors
    /// - `TooFewAlternatives` with fewer than two alternatives
    /// - `NoBreakeven` if the leader stays ahead on the whole interval
    pub fn breakeven(
        scored: &ScoredMatrix,
        weights: &WeightVector,
        method: AggregationMethod,
        criterion_id: &CriterionId,
        config: &BreakevenConfig,
    ) -> Result<BreakevenPoint, SensitivityError> {
        let count = scored.table().alternative_count();
        if count < 2 {
            return Err(SensitivityError::TooFewAlternatives { count });
        }
        let baseline_weight = weights
            .get(criterion_id)
            .ok_or_else(|| AggregationError::WeightMismatch {
                criterion_id: criterion_id.clone(),
            })?;

        let baseline = Aggregator::aggregate(scored, weights, method)?;
        let (leader, challenger) = match (baseline.winner(), baseline.runner_up()) {
            (Some(w), Some(r)) => (w.alternative_id.clone(), r.alternative_id.clone()),
            _ => return Err(SensitivityError::TooFewAlternatives { count }),
        };

        let gap = |w: f64| -> Result<f64, SensitivityError> {
            let result = Aggregator::aggregate(scored, &weights.with_weight(criterion_id, w)?, method)?;
            Ok(result.score_of(&leader).unwrap_or_default()
                - result.score_of(&challenger).unwrap_or_default())
        };

        let steps = config.grid_steps.max(1);
        let grid: Vec<(f64, f64)> = (0..=steps)
            .map(|i| {
                let w = i as f64 / steps as f64;
                gap(w).map(|g| (w, g))
            })
            .collect::<Result<_, _>>()?;

        // Candidate brackets, each with its distance from the baseline weight
        let mut best: Option<(f64, (f64, f64), (f64, f64))> = None;
        for pair in grid.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let bracket = if lo.1 == 0.0 {
                Some((lo, lo))
            } else if hi.1 == 0.0 {
                Some((hi, hi))
            } else if lo.1.signum() != hi.1.signum() {
                Some((lo, hi))
            } else {
                None
            };
            if let Some((a, b)) = bracket {
                let distance = (baseline_weight - (a.0 + b.0) / 2.0).abs();
                if best.map_or(true, |(d, _, _)| distance < d) {
                    best = Some((distance, a, b));
                }
            }
        }

        let (_, (mut lo, mut lo_gap), (mut hi, _)) = match best {
            Some(found) => found,
            None => {
                return Err(SensitivityError::NoBreakeven {
                    criterion_id: criterion_id.clone(),
                })
            }
        };

        let mut steps_taken = 0;
        while hi - lo > config.tolerance && steps_taken < MAX_BISECTION_STEPS {
            steps_taken += 1;
            let mid = (lo + hi) / 2.0;
            let mid_gap = gap(mid)?;
            if mid_gap == 0.0 {
                lo = mid;
                hi = mid;
                break;
            }
            if mid_gap.signum() == lo_gap.signum() {
                lo = mid;
                lo_gap = mid_gap;
            } else {
                hi = mid;
            }
        }
        let breakeven_weight = (lo + hi) / 2.0;

        debug!(
            criterion_id = %criterion_id,
            baseline_weight,
            breakeven_weight,
            leader = %leader,
            challenger = %challenger,
            "Located breakeven weight"
        );

        Ok(BreakevenPoint {
            criterion_id: criterion_id.clone(),
            baseline_weight,
            breakeven_weight,
            leader,
            challenger,
        })
    }
}

fn winner_of(result: &AggregatedResult) -> Result<&AlternativeId, SensitivityError> {
    result
        .winner()
        .map(|w| &w.alternative_id)
        .ok_or(SensitivityError::Aggregation(AggregationError::Empty))
}

/// Linear-interpolated percentile of sorted values.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;
            sorted[lower] + fraction * (sorted[upper] - sorted[lower])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade_study::WeightAssigner;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    /// c1 favours a, c2 favours b.
    fn opposed() -> ScoredMatrix {
        ScoredMatrix::from_rows(
            vec!["c1".into(), "c2".into()],
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap()
    }

    fn weights(c1: f64, c2: f64) -> WeightVector {
        WeightAssigner::direct(vec![("c1", c1), ("c2", c2)]).unwrap()
    }

    fn monte_carlo_config(samples: usize) -> MonteCarloConfig {
        MonteCarloConfig {
            samples,
            min_samples: 1,
            ..MonteCarloConfig::default()
        }
    }

    #[test]
    fn zeroing_flags_decision_driving_criteria() {
        let results = SensitivityAnalyzer::weight_zeroing(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].criterion_id.as_str(), "c1");
        assert!(results[0].decision_driving);
        assert_eq!(results[0].winner_without.as_str(), "b");
        assert!(!results[1].decision_driving);
        assert_eq!(results[1].winner_without.as_str(), "a");
    }

    #[test]
    fn zeroing_single_criterion_is_empty() {
        let scored = ScoredMatrix::from_rows(
            vec!["c1".into()],
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.0]],
        )
        .unwrap();
        let weights = WeightAssigner::direct(vec![("c1", 1.0)]).unwrap();

        let results =
            SensitivityAnalyzer::weight_zeroing(&scored, &weights, AggregationMethod::WeightedSum)
                .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn tornado_orders_by_swing_and_detects_flips() {
        let bars = SensitivityAnalyzer::tornado(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            Percentage::new(20),
        )
        .unwrap();

        assert_eq!(bars[0].criterion_id.as_str(), "c1");
        assert_close(bars[0].low_weight, 0.48, 1e-12);
        assert_close(bars[0].high_weight, 0.72, 1e-12);
        assert_close(bars[0].swing, 0.24, 1e-9);
        assert!(bars[0].winner_flips);

        assert_eq!(bars[1].criterion_id.as_str(), "c2");
        assert_close(bars[1].swing, 0.16, 1e-9);
        assert!(!bars[1].winner_flips);
    }

    #[test]
    fn tornado_clamps_weights_to_unit_interval() {
        let bars = SensitivityAnalyzer::tornado(
            &opposed(),
            &weights(0.9, 0.1),
            AggregationMethod::WeightedSum,
            Percentage::new(50),
        )
        .unwrap();
        let c1 = bars.iter().find(|b| b.criterion_id.as_str() == "c1").unwrap();
        assert_close(c1.high_weight, 1.0, 1e-12);
    }

    #[test]
    fn breakeven_finds_crossing_weight() {
        let point = SensitivityAnalyzer::breakeven(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            &"c1".into(),
            &BreakevenConfig::default(),
        )
        .unwrap();

        assert_close(point.breakeven_weight, 0.5, 1e-6);
        assert_eq!(point.leader.as_str(), "a");
        assert_eq!(point.challenger.as_str(), "b");
        assert_close(point.baseline_weight, 0.6, 1e-12);
    }

    #[test]
    fn breakeven_with_off_grid_crossing() {
        // a wins with score 0.9·w + 0.2·(1−w); b with 0.1·w + 0.7·(1−w); tie at w = 5/13
        let scored = ScoredMatrix::from_rows(
            vec!["c1".into(), "c2".into()],
            vec!["a".into(), "b".into()],
            vec![vec![0.9, 0.1], vec![0.2, 0.7]],
        )
        .unwrap();
        let point = SensitivityAnalyzer::breakeven(
            &scored,
            &weights(0.8, 0.2),
            AggregationMethod::WeightedSum,
            &"c1".into(),
            &BreakevenConfig::default(),
        )
        .unwrap();

        assert_close(point.breakeven_weight, 5.0 / 13.0, 1e-6);
    }

    #[test]
    fn breakeven_terminates_with_subnormal_tolerance() {
        // a: 0.2·w + 0.8·(1−w), b: 0.9·w + 0.3·(1−w); tie at w = 5/12
        let scored = ScoredMatrix::from_rows(
            vec!["c1".into(), "c2".into()],
            vec!["a".into(), "b".into()],
            vec![vec![0.2, 0.9], vec![0.8, 0.3]],
        )
        .unwrap();
        let config = BreakevenConfig {
            grid_steps: 100,
            tolerance: f64::MIN_POSITIVE,
        };
        let point = SensitivityAnalyzer::breakeven(
            &scored,
            &weights(0.3, 0.7),
            AggregationMethod::WeightedSum,
            &"c1".into(),
            &config,
        )
        .unwrap();

        assert_close(point.breakeven_weight, 5.0 / 12.0, 1e-9);
    }

    #[test]
    fn breakeven_fails_under_dominance() {
        let scored = ScoredMatrix::from_rows(
            vec!["c1".into(), "c2".into()],
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.0], vec![1.0, 0.5]],
        )
        .unwrap();
        let err = SensitivityAnalyzer::breakeven(
            &scored,
            &weights(0.5, 0.5),
            AggregationMethod::WeightedSum,
            &"c1".into(),
            &BreakevenConfig::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            SensitivityError::NoBreakeven {
                criterion_id: "c1".into()
            }
        );
    }

    #[test]
    fn breakeven_needs_two_alternatives() {
        let scored =
            ScoredMatrix::from_rows(vec!["c1".into()], vec!["a".into()], vec![vec![0.5]]).unwrap();
        let weights = WeightAssigner::direct(vec![("c1", 1.0)]).unwrap();
        let err = SensitivityAnalyzer::breakeven(
            &scored,
            &weights,
            AggregationMethod::WeightedSum,
            &"c1".into(),
            &BreakevenConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, SensitivityError::TooFewAlternatives { count: 1 });
    }

    #[test]
    fn monte_carlo_is_reproducible_with_seed() {
        let config = monte_carlo_config(600);
        let first = SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.55, 0.45),
            AggregationMethod::WeightedSum,
            &config,
        )
        .unwrap();
        let second = SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.55, 0.45),
            AggregationMethod::WeightedSum,
            &config,
        )
        .unwrap();

        assert_eq!(first, second);
        let total: f64 = first.outcomes.iter().map(|o| o.win_frequency).sum();
        assert_close(total, 1.0, 1e-12);
    }

    #[test]
    fn monte_carlo_is_independent_of_worker_count() {
        let single = monte_carlo_config(1000);
        let parallel = MonteCarloConfig {
            workers: 3,
            ..single.clone()
        };

        let a = SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.55, 0.45),
            AggregationMethod::Topsis,
            &single,
        )
        .unwrap();
        let b = SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.55, 0.45),
            AggregationMethod::Topsis,
            &parallel,
        )
        .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn monte_carlo_single_sample_has_zero_width_intervals() {
        let result = SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            &monte_carlo_config(1),
        )
        .unwrap();

        assert_eq!(result.samples, 1);
        assert_eq!(result.outcomes[0].win_frequency, 1.0);
        assert_eq!(result.outcomes[1].win_frequency, 0.0);
        for outcome in &result.outcomes {
            assert_eq!(outcome.confidence_interval.width(), 0.0);
        }
    }

    #[test]
    fn monte_carlo_rejects_too_few_samples() {
        let config = MonteCarloConfig {
            samples: 10,
            ..MonteCarloConfig::default()
        };
        let err = SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            &config,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SensitivityError::InsufficientSamples {
                requested: 10,
                minimum: 100
            }
        );

        let config = MonteCarloConfig {
            samples: 0,
            min_samples: 0,
            ..MonteCarloConfig::default()
        };
        assert!(SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            &config,
        )
        .is_err());
    }

    #[test]
    fn monte_carlo_clamps_to_iteration_cap() {
        let config = MonteCarloConfig {
            samples: 500,
            max_samples: 300,
            ..monte_carlo_config(500)
        };
        let result = SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            &config,
        )
        .unwrap();
        assert_eq!(result.samples, 300);
    }

    #[test]
    fn monte_carlo_rejects_bad_distributions() {
        let config = monte_carlo_config(200)
            .with_distribution("ghost", WeightDistribution::Uniform { spread: 0.1 });
        let err = SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, SensitivityError::InvalidDistribution { .. }));

        let config = monte_carlo_config(200)
            .with_distribution("c1", WeightDistribution::Normal { std_dev: -1.0 });
        assert!(SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            &config,
        )
        .is_err());
    }

    #[test]
    fn samples_stay_within_distribution_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let triangular = WeightDistribution::Triangular { spread: 0.5 };
        let uniform = WeightDistribution::Uniform { spread: 0.25 };
        for _ in 0..1000 {
            let t = triangular.sample(0.4, &mut rng);
            assert!((0.2..=0.6).contains(&t), "triangular draw {}", t);
            let u = uniform.sample(0.4, &mut rng);
            assert!((0.3..=0.5).contains(&u), "uniform draw {}", u);
        }
    }

    #[test]
    fn zero_spread_reproduces_base_weights() {
        let config = MonteCarloConfig {
            default_distribution: WeightDistribution::Triangular { spread: 0.0 },
            ..monte_carlo_config(100)
        };
        let result = SensitivityAnalyzer::monte_carlo(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            &config,
        )
        .unwrap();

        assert_eq!(result.win_frequency(&"a".into()), Some(1.0));
        let interval = result.confidence_interval(&"a".into()).unwrap();
        assert_close(interval.lower, 0.6, 1e-12);
        assert_close(interval.upper, 0.6, 1e-12);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_close(percentile(&sorted, 0.5), 2.0, 1e-12);
        assert_close(percentile(&sorted, 0.025), 0.1, 1e-12);
        assert_close(percentile(&sorted, 0.975), 3.9, 1e-12);
        assert_eq!(percentile(&[7.0], 0.975), 7.0);
    }

    #[test]
    fn analyze_collects_every_analysis() {
        let report = SensitivityAnalyzer::analyze(
            &opposed(),
            &weights(0.6, 0.4),
            AggregationMethod::WeightedSum,
            &SensitivityConfig {
                monte_carlo: monte_carlo_config(200),
                ..SensitivityConfig::default()
            },
        )
        .unwrap();

        assert_eq!(report.baseline.winner().unwrap().alternative_id.as_str(), "a");
        assert_eq!(report.weight_zeroing.len(), 2);
        assert_eq!(report.tornado.len(), 2);
        assert_eq!(report.monte_carlo.samples, 200);
        assert_eq!(report.breakeven.len(), 2);
        assert!(report.no_breakeven.is_empty());
        assert_eq!(report.decision_driving_criteria().len(), 1);
    }
}
