//! Dashboard grid placement and widget types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Columns in the dashboard grid.
pub const GRID_COLUMNS: i32 = 12;

/// Maximum length of a dashboard or widget name.
pub const MAX_NAME_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    StatCard,
    BarChart,
    LineChart,
    PieChart,
    AreaChart,
    Table,
    Markdown,
}

impl WidgetType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StatCard => "stat_card",
            Self::BarChart => "bar_chart",
            Self::LineChart => "line_chart",
            Self::PieChart => "pie_chart",
            Self::AreaChart => "area_chart",
            Self::Table => "table",
            Self::Markdown => "markdown",
        }
    }
}

impl FromStr for WidgetType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stat_card" => Ok(Self::StatCard),
            "bar_chart" => Ok(Self::BarChart),
            "line_chart" => Ok(Self::LineChart),
            "pie_chart" => Ok(Self::PieChart),
            "area_chart" => Ok(Self::AreaChart),
            "table" => Ok(Self::Table),
            "markdown" => Ok(Self::Markdown),
            _ => Err(CoreError::Validation(format!("Unknown widget type '{s}'"))),
        }
    }
}

/// Position and size of a widget on a dashboard, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Placement {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.x < 0 || self.y < 0 {
            return Err(CoreError::Validation(
                "Placement x and y must not be negative".to_string(),
            ));
        }
        if self.w < 1 || self.h < 1 {
            return Err(CoreError::Validation(
                "Placement w and h must be at least 1".to_string(),
            ));
        }
        // Checked so huge client values cannot wrap below the limit.
        match self.x.checked_add(self.w) {
            Some(end) if end <= GRID_COLUMNS => {}
            _ => {
                return Err(CoreError::Validation(format!(
                    "Placement overflows the {GRID_COLUMNS}-column grid (x = {}, w = {})",
                    self.x, self.w
                )))
            }
        }
        Ok(())
    }
}

/// Validate a dashboard or widget name.
pub fn validate_name(kind: &str, name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(format!("{kind} name must not be empty")));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "{kind} name exceeds maximum length of {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32, w: i32, h: i32) -> Placement {
        Placement { x, y, w, h }
    }

    #[test]
    fn placement_fits_grid() {
        assert!(at(0, 0, 12, 4).validate().is_ok());
        assert!(at(6, 3, 6, 1).validate().is_ok());
        assert!(at(7, 0, 6, 1).validate().is_err());
    }

    #[test]
    fn placement_rejects_overflowing_coordinates() {
        assert!(at(i32::MAX, 0, 1, 1).validate().is_err());
        assert!(at(1, 0, i32::MAX, 1).validate().is_err());
        assert!(at(0, 0, 13, 1).validate().is_err());
    }

    #[test]
    fn placement_needs_positive_size() {
        assert!(at(0, 0, 0, 1).validate().is_err());
        assert!(at(0, 0, 1, 0).validate().is_err());
        assert!(at(-1, 0, 1, 1).validate().is_err());
    }

    #[test]
    fn widget_type_names() {
        assert_eq!("area_chart".parse::<WidgetType>().unwrap(), WidgetType::AreaChart);
        assert!("gauge".parse::<WidgetType>().is_err());
    }
}
