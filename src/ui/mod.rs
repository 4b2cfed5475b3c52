//! Presentation components
//!
//! Headless models of UI widgets, rendered as text by the CLI.

pub mod range_slider;

pub use range_slider::{Extremity, RangeSlider, RangeSliderProps, MIN_MARK_SPACING_PX};
