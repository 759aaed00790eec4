//! # vfc-graph
//!
//! The ring-buffered, line-driven filter graph engine and its builder.
//!
//! A [`FilterGraph`] wires source planes, transform filters, and sink
//! planes into one streaming pipeline with bounded working memory: every
//! intermediate lives in a power-of-two ring of scanlines inside a single
//! engine-owned `tmp` allocation. [`build_filter_graph`] derives the
//! minimal pipeline for a pair of [`vfc_core::ImageFormat`]s.
//!
//! # Example
//!
//! ```rust
//! use vfc_core::{AlignedVec, ColorFamily, ImageFormat, PixelType};
//! use vfc_graph::{build_filter_graph, GraphBuilderParams, ImageBuffer};
//!
//! let src_format = ImageFormat::new(64, 48, PixelType::U8, ColorFamily::Grey);
//! let mut dst_format = src_format;
//! dst_format.width = 32;
//! dst_format.height = 24;
//!
//! let graph =
//!     build_filter_graph(&src_format, &dst_format, &GraphBuilderParams::default()).unwrap();
//!
//! let mut src_data: AlignedVec<u8> = AlignedVec::zeroed(64 * 48);
//! let mut dst_data: AlignedVec<u8> = AlignedVec::zeroed(32 * 24);
//! let mut tmp: AlignedVec<u8> = AlignedVec::zeroed(graph.get_tmp_size());
//!
//! let mut src = ImageBuffer::new();
//! src.set_plane(0, src_data.as_mut_ptr(), 64);
//! let mut dst = ImageBuffer::new();
//! dst.set_plane(0, dst_data.as_mut_ptr(), 32);
//!
//! graph.process(&src, &dst, tmp.as_mut_slice(), None, None).unwrap();
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod builder;
pub mod copy;
pub mod error;
pub mod graph;
pub mod interlace;

pub use buffer::ImageBuffer;
pub use builder::{build_filter_graph, GraphBuilderParams};
pub use copy::CopyFilter;
pub use error::{GraphError, GraphResult};
pub use graph::{Callback, FilterGraph, NodeId};
pub use interlace::build_field_graphs;
#[cfg(feature = "parallel")]
pub use interlace::{process_fields, FieldPass};
