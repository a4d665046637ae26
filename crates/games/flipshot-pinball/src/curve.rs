use serde::{Deserialize, Serialize};

use flipshot_core::math::{clamp01, lerp};

/// Maps a normalized drag ratio onto a normalized force ratio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseCurve {
    #[default]
    Linear,
    /// `t^exponent`: gentle start, sharp finish.
    EaseIn { exponent: f32 },
    /// `1 - (1 - t)^exponent`: sharp start, gentle finish.
    EaseOut { exponent: f32 },
    SmoothStep,
    /// Piecewise-linear `[t, value]` keys, sorted by `t`. Values outside the
    /// key range hold the first/last key.
    Keyframes { keys: Vec<[f32; 2]> },
}

impl ResponseCurve {
    /// Evaluate at `t`, clamped to `[0, 1]`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = clamp01(t);
        match self {
            Self::Linear => t,
            Self::EaseIn { exponent } => t.powf(exponent.max(0.0)),
            Self::EaseOut { exponent } => 1.0 - (1.0 - t).powf(exponent.max(0.0)),
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::Keyframes { keys } => evaluate_keys(keys, t),
        }
    }

    /// Whether keyframes are sorted by time. Analytic curves are always valid.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Keyframes { keys } => keys.windows(2).all(|w| w[0][0] <= w[1][0]),
            Self::EaseIn { exponent } | Self::EaseOut { exponent } => *exponent > 0.0,
            Self::Linear | Self::SmoothStep => true,
        }
    }
}

fn evaluate_keys(keys: &[[f32; 2]], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return t;
    };
    if t <= first[0] {
        return first[1];
    }
    if t >= last[0] {
        return last[1];
    }
    for pair in keys.windows(2) {
        let [t0, v0] = pair[0];
        let [t1, v1] = pair[1];
        if t <= t1 {
            let span = t1 - t0;
            if span <= f32::EPSILON {
                return v1;
            }
            return lerp(v0, v1, (t - t0) / span);
        }
    }
    last[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity_and_clamped() {
        let curve = ResponseCurve::Linear;
        assert_eq!(curve.evaluate(0.6), 0.6);
        assert_eq!(curve.evaluate(-1.0), 0.0);
        assert_eq!(curve.evaluate(3.0), 1.0);
    }

    #[test]
    fn ease_curves_bend_the_right_way() {
        let ease_in = ResponseCurve::EaseIn { exponent: 2.0 };
        let ease_out = ResponseCurve::EaseOut { exponent: 2.0 };
        assert!((ease_in.evaluate(0.5) - 0.25).abs() < 1e-6);
        assert!((ease_out.evaluate(0.5) - 0.75).abs() < 1e-6);
        assert_eq!(ease_in.evaluate(1.0), 1.0);
        assert_eq!(ease_out.evaluate(0.0), 0.0);
    }

    #[test]
    fn smoothstep_midpoint() {
        assert!((ResponseCurve::SmoothStep.evaluate(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn keyframes_interpolate_and_hold() {
        let curve = ResponseCurve::Keyframes {
            keys: vec![[0.2, 0.0], [0.6, 0.8], [1.0, 1.0]],
        };
        assert_eq!(curve.evaluate(0.1), 0.0);
        assert!((curve.evaluate(0.4) - 0.4).abs() < 1e-6);
        assert!((curve.evaluate(0.8) - 0.9).abs() < 1e-6);
        assert_eq!(curve.evaluate(1.0), 1.0);
    }

    #[test]
    fn empty_keyframes_fall_back_to_linear() {
        let curve = ResponseCurve::Keyframes { keys: vec![] };
        assert_eq!(curve.evaluate(0.3), 0.3);
    }

    #[test]
    fn unsorted_keys_are_flagged() {
        let curve = ResponseCurve::Keyframes {
            keys: vec![[0.5, 0.0], [0.2, 1.0]],
        };
        assert!(!curve.is_well_formed());
        assert!(ResponseCurve::Linear.is_well_formed());
    }

    #[test]
    fn parses_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            curve: ResponseCurve,
        }
        let w: Wrapper = toml::from_str(
            r#"
curve = { kind = "ease_in", exponent = 3.0 }
"#,
        )
        .unwrap();
        assert_eq!(w.curve, ResponseCurve::EaseIn { exponent: 3.0 });
    }
}
