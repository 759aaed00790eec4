//! Runtime CPU capability query and kernel dispatch policy.
//!
//! Capabilities are queried once per process and cached. Filter factories
//! consult the requested [`CpuClass`] together with the detected
//! [`CpuFeatures`] to choose a concrete kernel implementation; scalar
//! fallbacks always exist and define the numerical reference.

use std::sync::OnceLock;

/// Requested CPU class for kernel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpuClass {
    /// Scalar reference kernels only.
    None,
    /// Best implementation the host supports.
    #[default]
    Auto,
    /// 128-bit baseline vector set.
    Baseline,
    /// 256-bit vector set with FMA.
    Extended,
    /// 64-byte (512-bit) vector set.
    Wide64,
}

/// Detected host capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuFeatures {
    /// 128-bit integer/float vectors.
    pub baseline: bool,
    /// 256-bit vectors with fused multiply-add.
    pub extended: bool,
    /// 512-bit vectors.
    pub wide64: bool,
}

/// Queries host CPU capabilities, caching the result for the process.
pub fn query_features() -> CpuFeatures {
    static FEATURES: OnceLock<CpuFeatures> = OnceLock::new();
    *FEATURES.get_or_init(detect)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect() -> CpuFeatures {
    CpuFeatures {
        baseline: is_x86_feature_detected!("sse2"),
        extended: is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma"),
        wide64: is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bw"),
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn detect() -> CpuFeatures {
    // Non-x86 targets get the portable vector kernels unconditionally.
    CpuFeatures {
        baseline: true,
        extended: true,
        wide64: false,
    }
}

/// The implementation tier a filter factory should instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelTier {
    /// Scalar reference implementation.
    Scalar,
    /// Portable-vector implementation.
    Vector,
}

impl CpuClass {
    /// Resolves the class against detected capabilities.
    ///
    /// Returns the most specific tier that satisfies both the constraint
    /// and the hardware. [`CpuClass::None`] always selects scalar kernels.
    pub fn kernel_tier(self) -> KernelTier {
        let features = query_features();
        match self {
            CpuClass::None => KernelTier::Scalar,
            CpuClass::Auto | CpuClass::Baseline | CpuClass::Extended | CpuClass::Wide64 => {
                if features.baseline || features.extended {
                    KernelTier::Vector
                } else {
                    KernelTier::Scalar
                }
            }
        }
    }
}
