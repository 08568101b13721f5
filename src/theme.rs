//! Color palette for the approval TUI.
//!
//! Nord-based, with semantic aliases so widgets never name raw colors.

use ratatui::style::Color;

// === Base palette ===

pub const NORD_POLAR_NIGHT_3: Color = Color::Rgb(67, 76, 94);
pub const NORD_POLAR_NIGHT_4: Color = Color::Rgb(76, 86, 106);
pub const NORD_SNOW_STORM_1: Color = Color::Rgb(216, 222, 233);
pub const NORD_FROST_2: Color = Color::Rgb(136, 192, 208);
pub const NORD_FROST_3: Color = Color::Rgb(129, 161, 193);
pub const NORD_RED: Color = Color::Rgb(191, 97, 106);
pub const NORD_YELLOW: Color = Color::Rgb(235, 203, 139);
pub const NORD_GREEN: Color = Color::Rgb(163, 190, 140);

// === Semantic aliases ===

pub const TEXT_PRIMARY: Color = NORD_SNOW_STORM_1;
pub const TEXT_SECONDARY: Color = NORD_POLAR_NIGHT_4;
pub const ACCENT_PRIMARY: Color = NORD_FROST_2;
/// Links and in-progress states.
pub const ACCENT_SECONDARY: Color = NORD_FROST_3;
/// Accepted flows.
pub const SUCCESS: Color = NORD_GREEN;
/// Pending decisions and the notification card.
pub const WARNING: Color = NORD_YELLOW;
/// Rejected or aborted flows.
pub const ERROR: Color = NORD_RED;
pub const INACTIVE: Color = Color::Gray;

// === UI elements ===

pub const BORDER_DEFAULT: Color = NORD_POLAR_NIGHT_3;
pub const BORDER_FOCUSED: Color = NORD_FROST_2;
/// Focused button background.
pub const ROW_SELECTED_BG: Color = Color::Rgb(40, 40, 40);
/// Focused button text.
pub const ROW_SELECTED_FG: Color = NORD_FROST_2;
