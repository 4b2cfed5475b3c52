//! Dual-handle range slider
//!
//! Headless model of a slider editing two linked values on one track. It
//! validates its props, turns a committed drag into boundary updates and
//! decides whether step marks are dense enough to be drawn.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, UserConfigsError};

/// Minimum distance between two adjacent step marks for them to be drawn
pub const MIN_MARK_SPACING_PX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extremity {
    Low,
    High,
}

impl fmt::Display for Extremity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extremity::Low => f.write_str("low"),
            Extremity::High => f.write_str("high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSliderProps {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: String,
    pub value_low: f64,
    pub value_high: f64,
    pub label: String,
    pub low_extremity_semantic: Option<String>,
    pub high_extremity_semantic: Option<String>,
}

impl RangeSliderProps {
    fn validate(&self) -> Result<()> {
        if !(self.step > 0.0) {
            return Err(UserConfigsError::invalid_argument(format!(
                "step must be positive, got {}",
                self.step
            )));
        }
        if !(self.min < self.max) {
            return Err(UserConfigsError::invalid_argument(format!(
                "min ({}) must be lower than max ({})",
                self.min, self.max
            )));
        }
        if self.value_low > self.value_high {
            return Err(UserConfigsError::InvalidRange {
                low: self.value_low,
                high: self.value_high,
            });
        }
        Ok(())
    }
}

/// Pixel distance between two adjacent step marks on a track of `track_width` pixels
pub fn mark_spacing(track_width: f64, step: f64, range: f64) -> f64 {
    track_width * step / range
}

pub struct RangeSlider<F>
where
    F: FnMut(Extremity, f64),
{
    props: RangeSliderProps,
    set_value: F,
    track_width: Option<f64>,
}

impl<F> RangeSlider<F>
where
    F: FnMut(Extremity, f64),
{
    /// Fails with `InvalidRange` when `value_low > value_high`
    pub fn new(props: RangeSliderProps, set_value: F) -> Result<Self> {
        props.validate()?;
        Ok(Self {
            props,
            set_value,
            track_width: None,
        })
    }

    pub fn props(&self) -> &RangeSliderProps {
        &self.props
    }

    /// Re-render with new props; the measured track width is kept
    pub fn set_props(&mut self, props: RangeSliderProps) -> Result<()> {
        props.validate()?;
        self.props = props;
        Ok(())
    }

    /// Report the final handle positions of a drag
    ///
    /// Only boundaries whose value differs from the current props are reported.
    pub fn on_change_committed(&mut self, values: [f64; 2]) {
        let [low, high] = values;

        if low != self.props.value_low {
            (self.set_value)(Extremity::Low, low);
        }
        if high != self.props.value_high {
            (self.set_value)(Extremity::High, high);
        }
    }

    /// Record the measured track width (on mount and on every resize)
    pub fn on_layout(&mut self, track_width_px: f64) {
        self.track_width = Some(track_width_px);
    }

    pub fn should_display_marks(&self) -> bool {
        self.track_width.is_some_and(|width| {
            mark_spacing(width, self.props.step, self.props.max - self.props.min)
                >= MIN_MARK_SPACING_PX
        })
    }

    /// Step positions from `min` to `max`, empty when marks are hidden
    pub fn marks(&self) -> Vec<f64> {
        if !self.should_display_marks() {
            return Vec::new();
        }

        let count = ((self.props.max - self.props.min) / self.props.step).floor() as usize;
        (0..=count)
            .map(|i| self.props.min + i as f64 * self.props.step)
            .collect()
    }

    /// Readout shown next to one end of the track
    pub fn value_label(&self, extremity: Extremity) -> String {
        let (value, semantic) = match extremity {
            Extremity::Low => (self.props.value_low, &self.props.low_extremity_semantic),
            Extremity::High => (self.props.value_high, &self.props.high_extremity_semantic),
        };

        let readout = if self.props.unit.is_empty() {
            format!("{}", value)
        } else {
            format!("{} {}", value, self.props.unit)
        };

        match semantic {
            Some(semantic) => format!("{} ({})", readout, semantic),
            None => readout,
        }
    }

    /// Draw the slider on `columns` character cells
    ///
    /// Step marks follow `should_display_marks`, so they only appear once a
    /// track width has been recorded with `on_layout`.
    pub fn render(&self, columns: usize) -> String {
        let columns = columns.max(2);
        let range = self.props.max - self.props.min;
        let position = |value: f64| -> usize {
            let ratio = ((value - self.props.min) / range).clamp(0.0, 1.0);
            (ratio * (columns - 1) as f64).round() as usize
        };

        let low = position(self.props.value_low);
        let high = position(self.props.value_high);

        let mut track: Vec<char> = (0..columns)
            .map(|i| if i > low && i < high { '=' } else { '-' })
            .collect();

        for mark in self.marks() {
            let cell = position(mark);
            if track[cell] == '-' {
                track[cell] = '|';
            }
        }
        track[low] = 'o';
        track[high] = 'o';

        format!(
            "{}\n{} [{}] {}",
            self.props.label,
            self.value_label(Extremity::Low),
            track.into_iter().collect::<String>(),
            self.value_label(Extremity::High)
        )
    }
}
