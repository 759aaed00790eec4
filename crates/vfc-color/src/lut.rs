//! Tabulated transfer-function evaluation.
//!
//! Two tabulation strategies:
//!
//! - [`IntegerLut`]: for 8- and 10-bit integer inputs the function has at
//!   most 1024 distinct inputs, so it is evaluated once per code value and
//!   indexed by the sample directly.
//! - [`HalfLut`]: for float inputs, indexing by the half-precision bit
//!   pattern gives a 65,536-entry table that covers every representable
//!   f16, trading one conversion per sample for the full function cost.

use half::f16;
use vfc_core::AlignedVec;

/// Transfer function tabulated over integer code values.
#[derive(Debug, Clone)]
pub struct IntegerLut {
    table: AlignedVec<f32>,
}

impl IntegerLut {
    /// Tabulates `func` over all `2^depth` code values, mapping code to
    /// normalized input via `norm = scale * code + offset`.
    pub fn new(depth: u32, scale: f32, offset: f32, func: impl Fn(f32) -> f32) -> Self {
        let size = 1usize << depth;
        let mut table: AlignedVec<f32> = AlignedVec::zeroed(size);
        for (code, out) in table.as_mut_slice().iter_mut().enumerate() {
            *out = func(code as f32 * scale + offset);
        }
        Self { table }
    }

    /// Looks up one code value.
    #[inline]
    pub fn eval(&self, code: u16) -> f32 {
        self.table[code as usize & (self.table.len() - 1)]
    }

    /// Applies the table to a row of integer samples.
    pub fn apply(&self, src: &[u16], dst: &mut [f32]) {
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            *d = self.eval(s);
        }
    }
}

/// Transfer function tabulated over all half-precision bit patterns.
#[derive(Debug, Clone)]
pub struct HalfLut {
    table: AlignedVec<f32>,
}

impl HalfLut {
    /// Tabulates `func` over every f16 bit pattern.
    ///
    /// Non-finite inputs tabulate to 0 so a poisoned sample cannot escape
    /// the table.
    pub fn new(func: impl Fn(f32) -> f32) -> Self {
        let mut table: AlignedVec<f32> = AlignedVec::zeroed(1 << 16);
        for (bits, out) in table.as_mut_slice().iter_mut().enumerate() {
            let x = f16::from_bits(bits as u16).to_f32();
            *out = if x.is_finite() { func(x) } else { 0.0 };
        }
        Self { table }
    }

    /// Evaluates one f32 value by rounding it through f16.
    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        self.table[f16::from_f32(x).to_bits() as usize]
    }

    /// Applies the table to a row in place.
    pub fn apply(&self, row: &mut [f32]) {
        for x in row.iter_mut() {
            *x = self.eval(*x);
        }
    }
}
