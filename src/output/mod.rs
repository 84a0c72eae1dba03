// src/output/mod.rs

//! Output plumbing shared by every Handle.
//!
//! - [`line_buffer`] turns raw pipe chunks into complete lines.
//! - [`style`] owns label padding, the colour palette and status formatting.
//! - [`sink`] serializes whole prefixed lines onto the parent's stdout/stderr.

pub mod line_buffer;
pub mod sink;
pub mod style;

pub use line_buffer::LineBuffer;
pub use sink::OutputSink;
pub use style::{color_enabled, color_for, detect_color, format_duration, LabelFormatter, PALETTE};
