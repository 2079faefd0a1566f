//! Adaptive Gauss–Kronrod quadrature.
//!
//! Every distance in the model is an integral of `c / H(z)` from 0 to the target
//! redshift. The integrand is smooth but spans several decades between `z = 0`
//! and the recombination era (`z ≈ 1100`), so a fixed-order rule is not enough.
//!
//! We use the 7/15-point Gauss–Kronrod pair with global adaptive bisection:
//!
//! - evaluate G7 and K15 on each segment; `|K15 - G7|` is the error estimate
//! - while the summed error exceeds the tolerance, split the worst segment
//!
//! The procedure is fully deterministic: the same integrand and bounds always
//! take the same subdivision path and produce bit-identical results.

use crate::error::{CosmoError, Evaluation};

/// Kronrod abscissae on `[0, 1]` (symmetric). Odd indices are the Gauss nodes.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];

/// Kronrod weights matching `XGK`.
const WGK: [f64; 8] = [
    0.022_935_322_010_529_22,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_18,
    0.140_653_259_715_525_92,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_83,
];

/// Gauss weights for `XGK[1], XGK[3], XGK[5], XGK[7]`.
const WG: [f64; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

/// Convergence settings for [`integrate`].
#[derive(Debug, Clone, Copy)]
pub struct QuadratureOptions {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub max_segments: usize,
}

impl Default for QuadratureOptions {
    fn default() -> Self {
        Self {
            abs_tol: 1e-10,
            rel_tol: 1e-10,
            max_segments: 1000,
        }
    }
}

/// Result of an adaptive integration.
#[derive(Debug, Clone, Copy)]
pub struct Quadrature {
    pub value: f64,
    pub error_estimate: f64,
    pub segments: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    lo: f64,
    hi: f64,
    value: f64,
    error: f64,
}

/// Integrate `f` over `[a, b]`.
///
/// The integrand is fallible so that model evaluation errors surface unchanged.
/// A non-finite integrand value is reported as a domain error against
/// `evaluation`. Running out of segments is not an error: the best estimate is
/// returned with `converged = false`.
pub fn integrate<F>(
    f: F,
    a: f64,
    b: f64,
    opts: QuadratureOptions,
    evaluation: Evaluation,
) -> Result<Quadrature, CosmoError>
where
    F: Fn(f64) -> Result<f64, CosmoError>,
{
    if !(a.is_finite() && b.is_finite()) {
        return Err(CosmoError::domain(
            evaluation,
            format!("integration bounds must be finite (got [{a}, {b}])"),
        ));
    }
    if a == b {
        return Ok(Quadrature {
            value: 0.0,
            error_estimate: 0.0,
            segments: 0,
            converged: true,
        });
    }

    let mut segments = vec![kronrod_segment(&f, a, b, evaluation)?];

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();
        let tolerance = opts.abs_tol.max(opts.rel_tol * value.abs());

        let converged = error <= tolerance;
        if converged || segments.len() >= opts.max_segments {
            return Ok(Quadrature {
                value,
                error_estimate: error,
                segments: segments.len(),
                converged,
            });
        }

        // Bisect the segment with the largest error; ties go to the earliest.
        let mut worst = 0;
        for (i, s) in segments.iter().enumerate().skip(1) {
            if s.error > segments[worst].error {
                worst = i;
            }
        }
        let Segment { lo, hi, .. } = segments.swap_remove(worst);
        let mid = 0.5 * (lo + hi);
        segments.push(kronrod_segment(&f, lo, mid, evaluation)?);
        segments.push(kronrod_segment(&f, mid, hi, evaluation)?);
    }
}

fn kronrod_segment<F>(f: &F, lo: f64, hi: f64, evaluation: Evaluation) -> Result<Segment, CosmoError>
where
    F: Fn(f64) -> Result<f64, CosmoError>,
{
    let center = 0.5 * (lo + hi);
    let half = 0.5 * (hi - lo);

    let eval = |x: f64| -> Result<f64, CosmoError> {
        let y = f(x)?;
        if y.is_finite() {
            Ok(y)
        } else {
            Err(CosmoError::domain(
                evaluation,
                format!("integrand is not finite at z={x}"),
            ))
        }
    };

    let f_center = eval(center)?;
    let mut kronrod = WGK[7] * f_center;
    let mut gauss = WG[3] * f_center;

    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = eval(center - dx)? + eval(center + dx)?;
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    Ok(Segment {
        lo,
        hi,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    })
}
