//! ARIB STD-B67 hybrid log-gamma (HLG).
//!
//! HLG is scene-referred: the inverse OETF recovers relative scene light in
//! [0, 1]. Display-referred use composes the OOTF, approximated per channel
//! with the reference system gamma of 1.2 (1000 cd/m2 display).
//!
//! # Reference
//!
//! ITU-R BT.2100-2

// HLG constants.
const A: f32 = 0.17883277;
const B: f32 = 0.28466892; // 1 - 4*A
const C: f32 = 0.55991073; // 0.5 - A*ln(4*A)

/// Reference system gamma for a 1000 cd/m2 display.
const SYSTEM_GAMMA: f32 = 1.2;

/// HLG OETF: scene light [0, 1] to signal [0, 1].
#[inline]
pub fn oetf(e: f32) -> f32 {
    if e <= 0.0 {
        0.0
    } else if e <= 1.0 / 12.0 {
        (3.0 * e).sqrt()
    } else {
        A * (12.0 * e - B).ln() + C
    }
}

/// HLG inverse OETF: signal [0, 1] to scene light [0, 1].
#[inline]
pub fn inverse_oetf(ep: f32) -> f32 {
    if ep <= 0.0 {
        0.0
    } else if ep <= 0.5 {
        ep * ep / 3.0
    } else {
        (((ep - C) / A).exp() + B) / 12.0
    }
}

/// Display EOTF: signal to display light with the per-channel OOTF applied.
#[inline]
pub fn eotf(ep: f32) -> f32 {
    inverse_oetf(ep).powf(SYSTEM_GAMMA)
}

/// Display inverse EOTF.
#[inline]
pub fn inverse_eotf(d: f32) -> f32 {
    if d <= 0.0 {
        0.0
    } else {
        oetf(d.powf(1.0 / SYSTEM_GAMMA))
    }
}
