//! Row operations and the colorspace graph filter.
//!
//! A colorspace conversion is a short list of [`Operation`]s applied in
//! order to three planar float rows: 3x3 matrix multiplies and per-channel
//! gamma evaluations. The [`ColorspaceFilter`] wraps the list as a
//! three-plane pointwise graph filter.

use std::sync::Arc;

use crate::lut::HalfLut;
use vfc_core::{
    CpuClass, Filter, FilterDescriptor, FilterFlags, KernelTier, LineBuffer, PlaneDescriptor,
};
use wide::f32x8;

/// How a gamma operation evaluates its function.
#[derive(Clone)]
pub enum GammaEval {
    /// Direct scalar function.
    Fn(fn(f32) -> f32),
    /// Half-bit-pattern lookup table.
    Lut(Arc<HalfLut>),
}

impl std::fmt::Debug for GammaEval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GammaEval::Fn(_) => f.write_str("Fn"),
            GammaEval::Lut(_) => f.write_str("Lut"),
        }
    }
}

/// Per-channel gamma application: `out = eval(x * prescale) * postscale`.
#[derive(Debug, Clone)]
pub struct GammaOperation {
    /// Evaluation strategy.
    pub eval: GammaEval,
    /// Scale applied before evaluation.
    pub prescale: f32,
    /// Scale applied after evaluation.
    pub postscale: f32,
}

impl GammaOperation {
    fn apply(&self, row: &mut [f32]) {
        match &self.eval {
            GammaEval::Fn(f) => {
                for x in row.iter_mut() {
                    *x = f(*x * self.prescale) * self.postscale;
                }
            }
            GammaEval::Lut(lut) => {
                for x in row.iter_mut() {
                    *x = lut.eval(*x * self.prescale) * self.postscale;
                }
            }
        }
    }
}

/// One step of a colorspace conversion.
#[derive(Debug, Clone)]
pub enum Operation {
    /// 3x3 matrix on (plane0, plane1, plane2) column triples.
    Matrix([[f32; 3]; 3]),
    /// Per-channel gamma on all three planes.
    Gamma(GammaOperation),
}

impl Operation {
    /// Applies the operation in place to three rows of equal length.
    pub fn apply(&self, r: &mut [f32], g: &mut [f32], b: &mut [f32], tier: KernelTier) {
        match self {
            Operation::Matrix(m) => match tier {
                KernelTier::Scalar => matrix_row_c(m, r, g, b),
                KernelTier::Vector => matrix_row_w(m, r, g, b),
            },
            Operation::Gamma(op) => {
                op.apply(r);
                op.apply(g);
                op.apply(b);
            }
        }
    }
}

fn matrix_row_c(m: &[[f32; 3]; 3], r: &mut [f32], g: &mut [f32], b: &mut [f32]) {
    for j in 0..r.len() {
        let (x, y, z) = (r[j], g[j], b[j]);
        r[j] = m[0][0] * x + m[0][1] * y + m[0][2] * z;
        g[j] = m[1][0] * x + m[1][1] * y + m[1][2] * z;
        b[j] = m[2][0] * x + m[2][1] * y + m[2][2] * z;
    }
}

fn matrix_row_w(m: &[[f32; 3]; 3], r: &mut [f32], g: &mut [f32], b: &mut [f32]) {
    // Broadcast the nine entries once and stream the three planes in
    // lockstep.
    let c: [f32x8; 9] = [
        f32x8::splat(m[0][0]),
        f32x8::splat(m[0][1]),
        f32x8::splat(m[0][2]),
        f32x8::splat(m[1][0]),
        f32x8::splat(m[1][1]),
        f32x8::splat(m[1][2]),
        f32x8::splat(m[2][0]),
        f32x8::splat(m[2][1]),
        f32x8::splat(m[2][2]),
    ];

    let mut j = 0usize;
    while j + 8 <= r.len() {
        let x = f32x8::from(<[f32; 8]>::try_from(&r[j..j + 8]).unwrap());
        let y = f32x8::from(<[f32; 8]>::try_from(&g[j..j + 8]).unwrap());
        let z = f32x8::from(<[f32; 8]>::try_from(&b[j..j + 8]).unwrap());

        let rr = c[0].mul_add(x, c[1].mul_add(y, c[2] * z));
        let gg = c[3].mul_add(x, c[4].mul_add(y, c[5] * z));
        let bb = c[6].mul_add(x, c[7].mul_add(y, c[8] * z));

        r[j..j + 8].copy_from_slice(&rr.to_array());
        g[j..j + 8].copy_from_slice(&gg.to_array());
        b[j..j + 8].copy_from_slice(&bb.to_array());
        j += 8;
    }
    if j < r.len() {
        matrix_row_c(m, &mut r[j..], &mut g[j..], &mut b[j..]);
    }
}

/// Three-plane pointwise filter applying a colorspace operation list.
pub struct ColorspaceFilter {
    desc: FilterDescriptor,
    ops: Vec<Operation>,
    tier: KernelTier,
}

impl ColorspaceFilter {
    /// Wraps an operation list over `width` x `height` float planes.
    pub fn new(ops: Vec<Operation>, width: u32, height: u32, cpu: CpuClass) -> Self {
        let desc = FilterDescriptor {
            format: PlaneDescriptor::new(width, height, 4),
            num_deps: 3,
            num_planes: 3,
            step: 1,
            alignment_mask: 0,
            context_size: 0,
            scratchpad_size: 0,
            flags: FilterFlags {
                same_row: true,
                in_place: true,
                ..Default::default()
            },
        };
        Self {
            desc,
            ops,
            tier: cpu.kernel_tier(),
        }
    }
}

impl Filter for ColorspaceFilter {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.desc
    }

    fn row_deps(&self, i: u32) -> (u32, u32) {
        (i, i + 1)
    }

    fn col_deps(&self, left: u32, right: u32) -> (u32, u32) {
        (left, right)
    }

    fn process(
        &self,
        deps: &[LineBuffer],
        dst: &[LineBuffer],
        i: u32,
        left: u32,
        right: u32,
        _ctx: &mut [u8],
        _scratch: &mut [u8],
    ) {
        let (l, r) = (left as usize, right as usize);

        let out_r: &mut [f32] = unsafe { dst[0].row_slice_mut(i, l, r) };
        let out_g: &mut [f32] = unsafe { dst[1].row_slice_mut(i, l, r) };
        let out_b: &mut [f32] = unsafe { dst[2].row_slice_mut(i, l, r) };

        // Seed the output rows, then run the chain in place. The copy is
        // elided when the engine bound input and output to the same ring.
        for (p, out) in [&mut *out_r, &mut *out_g, &mut *out_b].into_iter().enumerate() {
            let src: &[f32] = unsafe { deps[p].row_slice(i, l, r) };
            if src.as_ptr() != out.as_ptr() {
                out.copy_from_slice(src);
            }
        }

        for op in &self.ops {
            op.apply(out_r, out_g, out_b, self.tier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matrix_row_scalar_vs_wide() {
        let m = [[0.5, 0.25, 0.25], [0.0, 1.0, 0.0], [-0.1, 0.2, 0.9]];
        let n = 21;
        let mk = |s: f32| -> Vec<f32> { (0..n).map(|i| i as f32 * s).collect() };

        let (mut r1, mut g1, mut b1) = (mk(0.01), mk(0.02), mk(0.03));
        let (mut r2, mut g2, mut b2) = (r1.clone(), g1.clone(), b1.clone());

        matrix_row_c(&m, &mut r1, &mut g1, &mut b1);
        matrix_row_w(&m, &mut r2, &mut g2, &mut b2);

        for j in 0..n {
            assert_relative_eq!(r1[j], r2[j], epsilon = 1e-6);
            assert_relative_eq!(g1[j], g2[j], epsilon = 1e-6);
            assert_relative_eq!(b1[j], b2[j], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_identity_matrix_is_noop() {
        let m = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut r = vec![0.1f32, 0.2, 0.3];
        let mut g = vec![0.4f32, 0.5, 0.6];
        let mut b = vec![0.7f32, 0.8, 0.9];
        let (r0, g0, b0) = (r.clone(), g.clone(), b.clone());
        Operation::Matrix(m).apply(&mut r, &mut g, &mut b, KernelTier::Scalar);
        assert_eq!(r, r0);
        assert_eq!(g, g0);
        assert_eq!(b, b0);
    }

    #[test]
    fn test_gamma_operation_scales() {
        let op = GammaOperation {
            eval: GammaEval::Fn(|x| x * x),
            prescale: 2.0,
            postscale: 0.5,
        };
        let mut row = [1.0f32, 3.0];
        op.apply(&mut row);
        assert_eq!(row, [2.0, 18.0]);
    }
}
