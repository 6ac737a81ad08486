//! # Interval Marks
//!
//! Per-day decorations for the calendar widget, keyed by `YYYY-MM-DD`.
//! Recomputed from the selection on every render; no state of its own.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::core::selection::DateSelection;

/// Colors used to decorate a selected stay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkPalette {
    pub endpoint_color: String,
    pub endpoint_text: String,
    pub band_color: String,
    pub band_text: String,
}

impl Default for MarkPalette {
    fn default() -> Self {
        Self {
            endpoint_color: "#D4A373".to_string(),
            endpoint_text: "white".to_string(),
            band_color: "#F0E6D2".to_string(),
            band_text: "#5E503F".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMark {
    pub is_start: bool,
    pub is_end: bool,
    pub band_color: String,
    pub text_color: String,
}

impl DayMark {
    fn endpoint(palette: &MarkPalette, is_start: bool, is_end: bool) -> Self {
        Self {
            is_start,
            is_end,
            band_color: palette.endpoint_color.clone(),
            text_color: palette.endpoint_text.clone(),
        }
    }

    fn in_range(palette: &MarkPalette) -> Self {
        Self {
            is_start: false,
            is_end: false,
            band_color: palette.band_color.clone(),
            text_color: palette.band_text.clone(),
        }
    }
}

pub type MarkMap = BTreeMap<String, DayMark>;

pub fn date_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Marks for `selection` using the default palette.
pub fn compute_marks(selection: &DateSelection) -> MarkMap {
    compute_marks_with(selection, &MarkPalette::default())
}

pub fn compute_marks_with(selection: &DateSelection, palette: &MarkPalette) -> MarkMap {
    let mut marks = MarkMap::new();

    let Some(check_in) = selection.check_in() else {
        return marks;
    };
    marks.insert(date_key(check_in), DayMark::endpoint(palette, true, false));

    if let Some(check_out) = selection.check_out() {
        let mut day = check_in.succ_opt();
        while let Some(d) = day {
            if d >= check_out {
                break;
            }
            marks.insert(date_key(d), DayMark::in_range(palette));
            day = d.succ_opt();
        }
        marks.insert(date_key(check_out), DayMark::endpoint(palette, false, true));
    }

    marks
}
