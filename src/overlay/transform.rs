use crate::{
    foundation::error::{ReelError, ReelResult},
    overlay::ease::Ease,
};

/// Pure `f(scroll) -> value` over fixed breakpoints.
///
/// Piecewise interpolation between `(input[i], output[i])` pairs, clamped to the first/last
/// output outside the input span.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrollTransform {
    input: Vec<f64>,
    output: Vec<f64>,
    #[serde(default)]
    ease: Ease,
}

impl ScrollTransform {
    /// Validated constructor: equal lengths, at least two points, finite non-decreasing input.
    pub fn new(input: Vec<f64>, output: Vec<f64>) -> ReelResult<Self> {
        let out = Self {
            input,
            output,
            ease: Ease::Linear,
        };
        out.validate()?;
        Ok(out)
    }

    pub(crate) fn fixed(input: &[f64], output: &[f64]) -> Self {
        Self {
            input: input.to_vec(),
            output: output.to_vec(),
            ease: Ease::Linear,
        }
    }

    /// Same breakpoints with a different per-segment curve.
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Check invariants (also needed after deserialization).
    pub fn validate(&self) -> ReelResult<()> {
        if self.input.len() != self.output.len() {
            return Err(ReelError::validation(format!(
                "scroll transform has {} inputs but {} outputs",
                self.input.len(),
                self.output.len()
            )));
        }
        if self.input.len() < 2 {
            return Err(ReelError::validation(
                "scroll transform needs at least two breakpoints",
            ));
        }
        if self.input.iter().chain(&self.output).any(|v| !v.is_finite()) {
            return Err(ReelError::validation(
                "scroll transform breakpoints must be finite",
            ));
        }
        if self.input.windows(2).any(|w| w[1] < w[0]) {
            return Err(ReelError::validation(
                "scroll transform inputs must be non-decreasing",
            ));
        }
        Ok(())
    }

    /// Breakpoint inputs.
    pub fn input(&self) -> &[f64] {
        &self.input
    }

    /// Evaluate at `scroll`.
    pub fn sample(&self, scroll: f64) -> f64 {
        let (Some(&first_in), Some(&last_in)) = (self.input.first(), self.input.last()) else {
            return 0.0;
        };
        let first_out = self.output.first().copied().unwrap_or(0.0);
        let last_out = self.output.last().copied().unwrap_or(first_out);

        if scroll.is_nan() || scroll <= first_in {
            return first_out;
        }
        if scroll >= last_in {
            return last_out;
        }

        let seg = self
            .input
            .windows(2)
            .position(|w| scroll >= w[0] && scroll < w[1])
            .unwrap_or(0);
        let (a, b) = (self.input[seg], self.input[seg + 1]);
        let (va, vb) = (self.output[seg], self.output[seg + 1]);
        let t = self.ease.apply((scroll - a) / (b - a));
        va + (vb - va) * t
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/transform.rs"]
mod tests;
