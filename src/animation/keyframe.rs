//! Timed samples and the cubic-Hermite coefficients of the span they open.

use log::warn;

use crate::io::Tokenizer;

/// How a keyframe's tangent is derived during [`Channel::precompute`].
///
/// [`Channel::precompute`]: crate::animation::Channel::precompute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TangentRule {
    /// Tangent value supplied verbatim by the file.
    Fixed,
    /// Zero tangent.
    Flat,
    /// Slope toward the neighbouring key.
    Linear,
    /// Symmetric slope between the previous and next key.
    Smooth,
    /// Unrecognised file token; behaves as [`TangentRule::Flat`] so unknown
    /// future rules degrade instead of failing the load.
    Unknown,
}

impl TangentRule {
    /// Maps a rule token to its variant. Unrecognised tokens are logged and
    /// preserved as [`TangentRule::Unknown`].
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "flat" => TangentRule::Flat,
            "linear" => TangentRule::Linear,
            "smooth" => TangentRule::Smooth,
            _ => {
                warn!("TangentRule: unrecognised rule token '{token}'");
                TangentRule::Unknown
            }
        }
    }
}

/// A single timed sample on a channel.
///
/// The cubic coefficients `a..d` describe the span *beginning* at this key
/// and are filled in by the channel's precompute pass once all keys are
/// loaded; they are unused on the last key.
#[derive(Debug, Clone)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    pub tangent_in: f32,
    pub tangent_out: f32,
    pub rule_in: TangentRule,
    pub rule_out: TangentRule,

    // power-basis coefficients for the span starting here
    pub(crate) a: f32,
    pub(crate) b: f32,
    pub(crate) c: f32,
    pub(crate) d: f32,
}

impl Keyframe {
    #[must_use]
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            tangent_in: 0.0,
            tangent_out: 0.0,
            rule_in: TangentRule::Fixed,
            rule_out: TangentRule::Fixed,
            a: 0.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
        }
    }

    /// Reads `<time> <value> <tangent-in> <tangent-out>` from the token
    /// stream. A tangent token that looks numeric (leading digit, `-` or
    /// `.`) is a fixed tangent value; otherwise it names a rule.
    pub fn load<T: Tokenizer>(tokenizer: &mut T) -> Self {
        let time = tokenizer.get_float();
        let value = tokenizer.get_float();

        let mut key = Keyframe::new(time, value);

        if let Some(token) = tokenizer.get_token() {
            (key.rule_in, key.tangent_in) = parse_tangent(&token);
        }
        if let Some(token) = tokenizer.get_token() {
            (key.rule_out, key.tangent_out) = parse_tangent(&token);
        }

        key
    }

    /// Converts the span geometry (endpoint values plus scaled tangents)
    /// into power-basis cubic coefficients via the Hermite basis matrix.
    ///
    /// Degenerate spans (`dt == 0`) are logged and left with zero
    /// coefficients so no NaN/Inf ever enters evaluation.
    pub fn compute_coefficients(&mut self, next: &Keyframe) {
        let dt = next.time - self.time;
        if dt == 0.0 {
            warn!(
                "Keyframe::compute_coefficients - degenerate span at t={}, skipping",
                self.time
            );
            self.a = 0.0;
            self.b = 0.0;
            self.c = 0.0;
            self.d = 0.0;
            return;
        }

        let p0 = self.value;
        let p1 = next.value;
        let v0 = self.tangent_out * dt;
        let v1 = next.tangent_in * dt;

        // c = B_hermite * [p0 p1 v0 v1]
        self.a = 2.0 * p0 - 2.0 * p1 + v0 + v1;
        self.b = -3.0 * p0 + 3.0 * p1 - 2.0 * v0 - v1;
        self.c = v0;
        self.d = p0;
    }

    /// Evaluates the span cubic at normalized time `u` in `[0, 1]`.
    #[inline]
    #[must_use]
    pub(crate) fn evaluate_span(&self, u: f32) -> f32 {
        let u2 = u * u;
        let u3 = u2 * u;
        self.a * u3 + self.b * u2 + self.c * u + self.d
    }
}

/// Splits a tangent token into `(rule, fixed value)`.
fn parse_tangent(token: &str) -> (TangentRule, f32) {
    let looks_numeric = token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '.');

    if looks_numeric {
        let value = token.parse().unwrap_or_else(|_| {
            warn!("Keyframe: malformed tangent value '{token}'");
            0.0
        });
        (TangentRule::Fixed, value)
    } else {
        (TangentRule::from_token(token), 0.0)
    }
}
