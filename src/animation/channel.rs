//! Keyframe curve evaluation for a single degree of freedom.
//!
//! A channel owns an ascending-by-time sequence of [`Keyframe`]s and
//! evaluates a value at arbitrary time: exact key hits return the stored
//! value, interior times evaluate the span's precomputed cubic, and times
//! outside the key range go through one of the extrapolation modes.

use log::{debug, warn};

use crate::animation::keyframe::{Keyframe, TangentRule};
use crate::errors::{MarrowError, Result};
use crate::io::Tokenizer;

/// Policy for evaluating a channel outside its first/last key times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extrapolation {
    /// Hold the boundary value.
    Constant,
    /// Continue along the boundary tangent.
    Linear,
    /// Repeat the clip periodically.
    Cycle,
    /// Repeat, adding the first-to-last value delta each cycle (ramp).
    CycleOffset,
    /// Repeat, mirroring direction every other cycle.
    Bounce,
    /// Unrecognised file token; behaves as [`Extrapolation::Constant`].
    Unknown,
}

impl Extrapolation {
    /// Maps an extrapolation token to its variant. Unrecognised tokens are
    /// logged and preserved as [`Extrapolation::Unknown`].
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "constant" => Extrapolation::Constant,
            "linear" => Extrapolation::Linear,
            "cycle" => Extrapolation::Cycle,
            "cycle_offset" => Extrapolation::CycleOffset,
            "bounce" => Extrapolation::Bounce,
            _ => {
                warn!("Extrapolation: unrecognised token '{token}'");
                Extrapolation::Unknown
            }
        }
    }
}

/// Result of a span lookup: either a bracketing key index or a signal that
/// the query time lies outside the key range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// Time precedes the first key.
    BeforeFirst,
    /// Time is at or past the last key.
    AfterLast,
    /// `keys[i].time <= t < keys[i + 1].time`.
    Between(usize),
}

/// An ordered sequence of keyframes for one DOF.
///
/// Invariant: keys are sorted ascending by time. Evaluation assumes this
/// ordering and never re-sorts.
#[derive(Debug, Clone)]
pub struct Channel {
    pub extrapolate_in: Extrapolation,
    pub extrapolate_out: Extrapolation,
    keys: Vec<Keyframe>,
}

impl Channel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            extrapolate_in: Extrapolation::Constant,
            extrapolate_out: Extrapolation::Constant,
            keys: Vec::new(),
        }
    }

    /// Builds a channel from pre-sorted keys and runs the precompute pass.
    #[must_use]
    pub fn from_keys(
        keys: Vec<Keyframe>,
        extrapolate_in: Extrapolation,
        extrapolate_out: Extrapolation,
    ) -> Self {
        let mut channel = Self {
            extrapolate_in,
            extrapolate_out,
            keys,
        };
        channel.precompute();
        channel
    }

    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Evaluates the channel at `time`.
    ///
    /// 0 keys yields 0.0 and a single key yields that key's value; otherwise
    /// the bracketing span's cubic is evaluated, with exact key-time hits
    /// returning the stored value directly (this also sidesteps
    /// divide-by-zero on coincident key times).
    #[must_use]
    pub fn evaluate(&self, time: f32) -> f32 {
        if self.keys.is_empty() {
            return 0.0;
        }
        if self.keys.len() == 1 {
            return self.keys[0].value;
        }

        match self.find_span(time) {
            Span::BeforeFirst => self.extrapolate_before(time),
            Span::AfterLast => self.extrapolate_after(time),
            Span::Between(i) => {
                let key = &self.keys[i];
                if time == key.time {
                    return key.value;
                }
                let next = &self.keys[i + 1];
                let u = (time - key.time) / (next.time - key.time);
                key.evaluate_span(u)
            }
        }
    }

    /// Binary search for the key span bracketing `time`.
    #[must_use]
    pub fn find_span(&self, time: f32) -> Span {
        debug_assert!(self.keys.len() >= 2, "find_span needs at least two keys");

        if time < self.keys[0].time {
            return Span::BeforeFirst;
        }
        if time >= self.keys[self.keys.len() - 1].time {
            return Span::AfterLast;
        }

        let mut left = 0usize;
        let mut right = self.keys.len() - 1;
        while left <= right {
            let mid = (left + right) / 2;
            if time >= self.keys[mid].time && time < self.keys[mid + 1].time {
                return Span::Between(mid);
            }
            if time < self.keys[mid].time {
                right = mid - 1;
            } else {
                left = mid + 1;
            }
        }
        Span::Between(left)
    }

    /// Two-pass precompute: derive every key's tangents from its rule, then
    /// fill the per-span cubic coefficients. Must run after all keys are
    /// loaded since Smooth tangents read both neighbours.
    pub fn precompute(&mut self) {
        let n = self.keys.len();
        if n < 2 {
            debug!("Channel::precompute - fewer than two keys, nothing to do");
            return;
        }

        for i in 0..n {
            let (t, p) = (self.keys[i].time, self.keys[i].value);
            let (t_prev, p_prev) = if i > 0 {
                (self.keys[i - 1].time, self.keys[i - 1].value)
            } else {
                (t, p)
            };
            let (t_next, p_next) = if i < n - 1 {
                (self.keys[i + 1].time, self.keys[i + 1].value)
            } else {
                (t, p)
            };

            let tangent_in = match self.keys[i].rule_in {
                // fixed keeps the tangent loaded from the file
                TangentRule::Fixed => self.keys[i].tangent_in,
                TangentRule::Flat | TangentRule::Unknown => 0.0,
                TangentRule::Linear => slope(p_prev, t_prev, p, t),
                TangentRule::Smooth => {
                    if i == 0 {
                        slope(p, t, p_next, t_next)
                    } else {
                        slope(p_prev, t_prev, p_next, t_next)
                    }
                }
            };
            self.keys[i].tangent_in = tangent_in;

            let tangent_out = match self.keys[i].rule_out {
                TangentRule::Fixed => self.keys[i].tangent_out,
                TangentRule::Flat | TangentRule::Unknown => 0.0,
                TangentRule::Linear => slope(p, t, p_next, t_next),
                TangentRule::Smooth => {
                    if i == n - 1 {
                        slope(p_prev, t_prev, p, t)
                    } else {
                        slope(p_prev, t_prev, p_next, t_next)
                    }
                }
            };
            self.keys[i].tangent_out = tangent_out;
        }

        for i in 0..n - 1 {
            let next = self.keys[i + 1].clone();
            self.keys[i].compute_coefficients(&next);
        }
    }

    /// Extrapolates for times before the first key.
    fn extrapolate_before(&self, time: f32) -> f32 {
        let first = &self.keys[0];
        let last = &self.keys[self.keys.len() - 1];
        let dt = time - first.time;
        let length = last.time - first.time;

        if length <= 0.0 {
            return first.value;
        }

        // cycles counts the boundary crossing itself so the first
        // extrapolated period is cycle 1; keeps CycleOffset and Bounce
        // continuous at the clip edge
        let cycles = (dt.abs() / length).floor() + 1.0;
        let mut remainder = dt.abs() % length;

        match self.extrapolate_in {
            Extrapolation::Constant | Extrapolation::Unknown => first.value,
            Extrapolation::Linear => first.value + dt * self.edge_tangent_in(),
            Extrapolation::Cycle => {
                if dt < 0.0 {
                    remainder = length - remainder;
                }
                self.evaluate(first.time + remainder)
            }
            Extrapolation::CycleOffset => {
                if dt < 0.0 {
                    remainder = length - remainder;
                }
                let offset = (last.value - first.value) * cycles;
                self.evaluate(first.time + remainder) - offset
            }
            Extrapolation::Bounce => {
                if cycles as i64 % 2 == 1 {
                    remainder = length - remainder;
                }
                if dt < 0.0 {
                    remainder = length - remainder;
                }
                self.evaluate(first.time + remainder)
            }
        }
    }

    /// Extrapolates for times at or past the last key.
    fn extrapolate_after(&self, time: f32) -> f32 {
        let first = &self.keys[0];
        let last = &self.keys[self.keys.len() - 1];
        let dt = time - last.time;
        let length = last.time - first.time;

        if length <= 0.0 {
            return last.value;
        }

        let cycles = (dt.abs() / length).floor() + 1.0;
        let mut remainder = dt.abs() % length;

        match self.extrapolate_out {
            Extrapolation::Constant | Extrapolation::Unknown => last.value,
            Extrapolation::Linear => last.value + dt * self.edge_tangent_out(),
            Extrapolation::Cycle => self.evaluate(last.time - length + remainder),
            Extrapolation::CycleOffset => {
                let offset = (last.value - first.value) * cycles;
                self.evaluate(last.time - length + remainder) + offset
            }
            Extrapolation::Bounce => {
                if cycles as i64 % 2 == 1 {
                    remainder = length - remainder;
                }
                self.evaluate(last.time - length + remainder)
            }
        }
    }

    /// Edge tangent for in-extrapolation, per the first key's rule.
    /// Smooth reaches two keys in when available, else falls back to Linear.
    fn edge_tangent_in(&self) -> f32 {
        let k0 = &self.keys[0];
        let k1 = &self.keys[1];
        match k0.rule_in {
            TangentRule::Fixed => k0.tangent_in,
            TangentRule::Flat | TangentRule::Unknown => 0.0,
            TangentRule::Linear => slope(k0.value, k0.time, k1.value, k1.time),
            TangentRule::Smooth => {
                if self.keys.len() > 2 {
                    let k2 = &self.keys[2];
                    slope(k0.value, k0.time, k2.value, k2.time)
                } else {
                    slope(k0.value, k0.time, k1.value, k1.time)
                }
            }
        }
    }

    /// Edge tangent for out-extrapolation, per the last key's rule.
    fn edge_tangent_out(&self) -> f32 {
        let n = self.keys.len();
        let kn = &self.keys[n - 1];
        let kn1 = &self.keys[n - 2];
        match kn.rule_out {
            TangentRule::Fixed => kn.tangent_out,
            TangentRule::Flat | TangentRule::Unknown => 0.0,
            TangentRule::Linear => slope(kn1.value, kn1.time, kn.value, kn.time),
            TangentRule::Smooth => {
                if n > 2 {
                    let kn2 = &self.keys[n - 3];
                    slope(kn2.value, kn2.time, kn.value, kn.time)
                } else {
                    slope(kn1.value, kn1.time, kn.value, kn.time)
                }
            }
        }
    }

    /// Reads one `channel { extrapolate <in> <out> keys <K> { ... } }` block.
    ///
    /// Unrecognised tokens are logged and their line skipped; a channel
    /// declaring zero keys rejects the load.
    pub fn load<T: Tokenizer>(tokenizer: &mut T) -> Result<Self> {
        let mut channel = Channel::new();

        if !tokenizer.find_token("{") {
            return Err(MarrowError::parse("channel: missing '{'"));
        }

        loop {
            let Some(token) = tokenizer.get_token() else {
                return Err(MarrowError::parse("channel: unexpected end of input"));
            };

            match token.as_str() {
                "extrapolate" => {
                    if let Some(tok) = tokenizer.get_token() {
                        channel.extrapolate_in = Extrapolation::from_token(&tok);
                    }
                    if let Some(tok) = tokenizer.get_token() {
                        channel.extrapolate_out = Extrapolation::from_token(&tok);
                    }
                }
                "keys" => {
                    let num_keys = tokenizer.get_int();
                    debug!("Channel::load - reading {num_keys} keyframes");
                    if num_keys <= 0 {
                        return Err(MarrowError::Load(
                            "channel declares zero keyframes".to_string(),
                        ));
                    }

                    if !tokenizer.find_token("{") {
                        return Err(MarrowError::parse("channel keys: missing '{'"));
                    }
                    channel.keys.reserve(num_keys as usize);
                    for _ in 0..num_keys {
                        channel.keys.push(Keyframe::load(tokenizer));
                    }
                    tokenizer.find_token("}");
                }
                "}" => break,
                _ => {
                    warn!("Channel::load - unrecognised token: {token}");
                    tokenizer.skip_line();
                }
            }
        }

        if channel.keys.is_empty() {
            return Err(MarrowError::Load("channel has no keyframes".to_string()));
        }

        channel.precompute();
        Ok(channel)
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

/// Slope between two samples; coincident times yield 0 with a log instead
/// of an infinity that would poison the coefficients.
fn slope(p0: f32, t0: f32, p1: f32, t1: f32) -> f32 {
    let dt = t1 - t0;
    if dt == 0.0 {
        debug!("Channel: zero-duration slope at t={t0}, using 0");
        return 0.0;
    }
    (p1 - p0) / dt
}
