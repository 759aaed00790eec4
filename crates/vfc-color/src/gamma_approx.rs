//! Fast approximate gamma evaluation.
//!
//! The BT.1886 power law and its inverse are evaluated as a 5th-order
//! Horner polynomial on the mantissa in [1, 2) combined with an exponent
//! lookup table, reproducing `pow` by range reduction: for
//! `x = m * 2^e`, `x^p = m^p * 2^(p*e)`, where `m^p` comes from the
//! polynomial and `2^(p*e)` from the table. sRGB composes the same power
//! kernels with its linear knee.
//!
//! Accuracy is a few ULPs over [0, 1]; inputs are clamped below 2.0 and
//! exponents below the table floor flush to zero.

/// 5th-order polynomial for `m^2.4` on [1, 2).
const EOTF_HORNER: [f32; 6] = [
    3.9435861748560828e-3,
    -4.7562005414496558e-2,
    3.7223934327652687e-1,
    8.0976688115998239e-1,
    -1.6576549352714846e-1,
    2.7378258372778144e-2,
];

/// `2^(2.4 * e)` for `e` in [-15, 0].
const EOTF_TABLE: [f32; 16] = [
    0.00000000e+00, // [-inf, -14)
    7.68054690e-11, // [-14, -13)
    4.05381696e-10, // [-13, -12)
    2.13961742e-09, // [-12, -11)
    1.12929684e-08, // [-11, -10)
    5.96046448e-08, // [-10, -9)
    3.14595201e-07, // [-9, -8)
    1.66044343e-06, // [-8, -7)
    8.76387295e-06, // [-7, -6)
    4.62559987e-05, // [-6, -5)
    2.44140625e-04, // [-5, -4)
    1.28858194e-03, // [-4, -3)
    6.80117628e-03, // [-3, -2)
    3.58968236e-02, // [-2, -1)
    1.89464571e-01, // [-1, 0)
    1.00000000e+00, // [0, 1)
];

/// 5th-order polynomial for `m^(1/2.4)` on [1, 2).
const INVERSE_EOTF_HORNER: [f32; 6] = [
    5.3331316297790816e-3,
    -5.0653335401261418e-2,
    2.0631810268332693e-1,
    -4.8846483066245743e-1,
    9.5048057786988787e-1,
    3.7698771958831039e-1,
];

/// `2^(e / 2.4)` for `e` in [-31, 0].
const INVERSE_EOTF_TABLE: [f32; 32] = [
    0.00000000e+00, // [-inf, -30)
    1.72633492e-04, // [-30, -29)
    2.30438065e-04, // [-29, -28)
    3.07597913e-04, // [-28, -27)
    4.10593953e-04, // [-27, -26)
    5.48077172e-04, // [-26, -25)
    7.31595252e-04, // [-25, -24)
    9.76562500e-04, // [-24, -23)
    1.30355455e-03, // [-23, -22)
    1.74003656e-03, // [-22, -21)
    2.32267015e-03, // [-21, -20)
    3.10039268e-03, // [-20, -19)
    4.13852771e-03, // [-19, -18)
    5.52427173e-03, // [-18, -17)
    7.37401807e-03, // [-17, -16)
    9.84313320e-03, // [-16, -15)
    1.31390065e-02, // [-15, -14)
    1.75384695e-02, // [-14, -13)
    2.34110481e-02, // [-13, -12)
    3.12500000e-02, // [-12, -11)
    4.17137454e-02, // [-11, -10)
    5.56811699e-02, // [-10, -9)
    7.43254447e-02, // [-9, -8)
    9.92125657e-02, // [-8, -7)
    1.32432887e-01, // [-7, -6)
    1.76776695e-01, // [-6, -5)
    2.35968578e-01, // [-5, -4)
    3.14980262e-01, // [-4, -3)
    4.20448208e-01, // [-3, -2)
    5.61231024e-01, // [-2, -1)
    7.49153538e-01, // [-1, 0)
    1.00000000e+00, // [0, 1)
];

// sRGB knee constants, exact continuity solutions.
const SRGB_EOTF_KNEE: f32 = 12.92 * 0.003041282560128;
const SRGB_INVERSE_EOTF_KNEE: f32 = 0.003041282560128;
const SRGB_POWER_SCALE: f32 = 1.055010718947587;

/// Largest input below 2.0.
const INPUT_MAX: f32 = 1.9999999;

/// Splits `x > 0` into mantissa [1, 2) and binary exponent.
#[inline]
fn frexp_1_2(x: f32) -> (f32, i32) {
    let bits = x.to_bits();
    let exp = ((bits >> 23) & 0xff) as i32 - 127;
    if exp == -127 {
        // Zero and subnormals flush through the table floor.
        return (0.0, -127);
    }
    let mant = f32::from_bits((bits & 0x007f_ffff) | 0x3f80_0000);
    (mant, exp)
}

/// Range-reduced power evaluation.
fn power_function(x: f32, horner: &[f32; 6], table: &[f32]) -> f32 {
    let orig = x;
    let x = x.abs().min(INPUT_MAX);

    let (mant, exp) = frexp_1_2(x);
    let exponent_min = -(table.len() as i32 - 1);
    let exp = exp.max(exponent_min) + 127;

    let mut mantpart = horner[0];
    for &h in &horner[1..] {
        mantpart = mantpart.mul_add(mant, h);
    }

    let exppart = table[(exp as usize) & (table.len() - 1)];
    (mantpart * exppart).copysign(orig)
}

/// Approximate BT.1886 EOTF (`x^2.4`).
#[inline]
pub fn rec1886_eotf(x: f32) -> f32 {
    power_function(x, &EOTF_HORNER, &EOTF_TABLE)
}

/// Approximate BT.1886 inverse EOTF (`x^(1/2.4)`).
#[inline]
pub fn rec1886_inverse_eotf(x: f32) -> f32 {
    power_function(x, &INVERSE_EOTF_HORNER, &INVERSE_EOTF_TABLE)
}

/// Approximate sRGB EOTF.
#[inline]
pub fn srgb_eotf(x: f32) -> f32 {
    if x.abs() <= SRGB_EOTF_KNEE {
        x / 12.92
    } else {
        let shifted = (x.abs() + (SRGB_POWER_SCALE - 1.0)) / SRGB_POWER_SCALE;
        rec1886_eotf(shifted).copysign(x)
    }
}

/// Approximate sRGB inverse EOTF.
#[inline]
pub fn srgb_inverse_eotf(x: f32) -> f32 {
    if x.abs() <= SRGB_INVERSE_EOTF_KNEE {
        x * 12.92
    } else {
        (rec1886_inverse_eotf(x.abs()) * SRGB_POWER_SCALE - (SRGB_POWER_SCALE - 1.0)).copysign(x)
    }
}
