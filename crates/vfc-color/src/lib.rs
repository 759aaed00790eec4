//! # vfc-color
//!
//! Colorspace conversion for planar float images.
//!
//! The crate derives the numeric transforms of a (matrix, transfer,
//! primaries) triple — nothing here manages color profiles. A conversion is
//! synthesized as a short list of row operations (3x3 matrices and gamma
//! evaluations) and wrapped in a three-plane pointwise graph filter.
//!
//! # Example
//!
//! ```rust
//! use vfc_color::{ColorspaceConversion, ColorspaceDefinition, PlanParams};
//! use vfc_core::{ColorPrimaries, Filter, MatrixCoefficients, TransferCharacteristics};
//!
//! let hdr = ColorspaceDefinition {
//!     matrix: MatrixCoefficients::Bt2020Ncl,
//!     transfer: TransferCharacteristics::St2084,
//!     primaries: ColorPrimaries::Bt2020,
//! };
//! let sdr = ColorspaceDefinition {
//!     matrix: MatrixCoefficients::Bt709,
//!     transfer: TransferCharacteristics::Bt709,
//!     primaries: ColorPrimaries::Bt709,
//! };
//! let filt = ColorspaceConversion::new(hdr, sdr, 1920, 1080)
//!     .create()
//!     .unwrap()
//!     .expect("not an identity conversion");
//! assert_eq!(filt.descriptor().num_planes, 3);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod gamma_approx;
pub mod lut;
pub mod matrix;
pub mod operation;
pub mod plan;
pub mod primaries;
pub mod transfer;

pub use error::{ColorError, ColorResult};
pub use lut::{HalfLut, IntegerLut};
pub use operation::{ColorspaceFilter, GammaEval, GammaOperation, Operation};
pub use plan::{make_plan, ColorspaceDefinition, PlanParams};
pub use transfer::{select_transfer, TransferFunctions};

use std::sync::Arc;
use vfc_core::{CpuClass, Filter};

/// Factory for the single filter converting between two colorspaces.
#[derive(Debug, Clone)]
pub struct ColorspaceConversion {
    input: ColorspaceDefinition,
    output: ColorspaceDefinition,
    width: u32,
    height: u32,
    params: PlanParams,
    cpu: CpuClass,
}

impl ColorspaceConversion {
    /// Starts a conversion description with default parameters.
    pub fn new(
        input: ColorspaceDefinition,
        output: ColorspaceDefinition,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            input,
            output,
            width,
            height,
            params: PlanParams::default(),
            cpu: CpuClass::Auto,
        }
    }

    /// Sets the plan parameters.
    pub fn params(mut self, params: PlanParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the CPU class for kernel selection.
    pub fn cpu(mut self, cpu: CpuClass) -> Self {
        self.cpu = cpu;
        self
    }

    /// Builds the conversion filter, or `None` for an identity conversion.
    pub fn create(self) -> ColorResult<Option<Arc<dyn Filter>>> {
        let ops = make_plan(&self.input, &self.output, &self.params)?;
        if ops.is_empty() {
            return Ok(None);
        }
        Ok(Some(Arc::new(ColorspaceFilter::new(
            ops,
            self.width,
            self.height,
            self.cpu,
        ))))
    }
}
