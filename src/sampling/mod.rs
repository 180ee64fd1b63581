//! Session sampling driven by the configured sampling rate.

use crate::config::AgentConfiguration;
use rand::Rng;

/// Outcome of a sampling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingDecision {
    /// The session is recorded.
    NotSampledOut,
    /// The session is dropped.
    SampledOut,
}

/// Source of uniformly distributed numbers for sampling decisions.
pub trait RandomNumberProvider: Send + Sync {
    /// Return a number in the inclusive range `[lower, upper]`.
    fn random_number(&self, lower: f64, upper: f64) -> f64;
}

/// `rand` thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRandomNumberProvider;

impl RandomNumberProvider for SystemRandomNumberProvider {
    fn random_number(&self, lower: f64, upper: f64) -> f64 {
        rand::thread_rng().gen_range(lower..=upper)
    }
}

/// Probability sampler for agent sessions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSampler {
    pub probability: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl SessionSampler {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            lower_bound: 0.0,
            upper_bound: 1.0,
        }
    }

    pub fn for_configuration(configuration: &AgentConfiguration) -> Self {
        Self::new(configuration.session_sampling_rate)
    }

    pub fn sample(&self) -> SamplingDecision {
        self.sample_with(&SystemRandomNumberProvider)
    }

    /// Decide whether a session is kept.
    ///
    /// Misconfigured bounds always sample out. A probability of `1.0` keeps
    /// every session and `0.0` drops every session; any other value keeps the
    /// session when the drawn number is at most the probability.
    pub fn sample_with(&self, provider: &dyn RandomNumberProvider) -> SamplingDecision {
        if !(self.lower_bound <= self.upper_bound
            && self.lower_bound >= 0.0
            && self.upper_bound <= 1.0)
        {
            return SamplingDecision::SampledOut;
        }

        if self.probability == 1.0 {
            return SamplingDecision::NotSampledOut;
        }

        if self.probability == 0.0 {
            return SamplingDecision::SampledOut;
        }

        let drawn = provider.random_number(self.lower_bound, self.upper_bound);
        if drawn <= self.probability {
            SamplingDecision::NotSampledOut
        } else {
            SamplingDecision::SampledOut
        }
    }
}
