//! Sampling.
//!
//! Sampling is the once-per-trace decision of whether a trace's spans are
//! retained by the backend. The decision is made at root-span creation and
//! inherited verbatim by every descendant; samplers are never re-consulted
//! for child spans. Sampling is strictly a retention filter: unsampled
//! spans still run their full local lifecycle, they just never reach a
//! recorder.
use fnv::FnvHasher;
use std::fmt;
use std::hash::Hasher;
use tracewire::TraceId;

/// The interface for externally supplied samplers.
///
/// Implementations must be pure: deterministic for a given trace id (so
/// replays and tests are reproducible), never blocking and never
/// performing I/O.
pub trait ShouldSample: Send + Sync + fmt::Debug {
    /// Returns the retention decision for a trace that is about to start.
    fn should_sample(&self, trace_id: TraceId) -> bool;
}

/// Built-in sampling strategies.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Sampler {
    /// Always sample the trace.
    AlwaysOn,
    /// Never sample the trace.
    AlwaysOff,
    /// Sample a given fraction of traces. Fractions >= 1 will always
    /// sample and fractions < 0 are treated as zero. The decision is a
    /// deterministic function of the trace id, so every tracer configured
    /// with the same rate agrees on a given trace.
    TraceIdRatioBased(f64),
}

impl ShouldSample for Sampler {
    fn should_sample(&self, trace_id: TraceId) -> bool {
        match self {
            Sampler::AlwaysOn => true,
            Sampler::AlwaysOff => false,
            Sampler::TraceIdRatioBased(prob) => sample_based_on_probability(prob, trace_id),
        }
    }
}

pub(crate) fn sample_based_on_probability(prob: &f64, trace_id: TraceId) -> bool {
    if *prob >= 1.0 {
        true
    } else {
        let prob_upper_bound = (prob.max(0.0) * (1u64 << 63) as f64) as u64;
        // Hashing decorrelates the decision from the raw id bits, so
        // non-random ids (tests, replays) still sample at the configured
        // rate.
        let mut hasher = FnvHasher::default();
        hasher.write(&trace_id.to_bytes());
        (hasher.finish() >> 1) < prob_upper_bound
    }
}
