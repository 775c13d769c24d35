//! Color themes.
//!
//! - `dark` uses ANSI 16 colors so it works on any terminal.
//! - `catppuccin_mocha` uses the Catppuccin Mocha palette in RGB and needs
//!   truecolor.

use ratatui::style::Color;
use revbench_core::staging::FixStatus;
use revbench_core::types::{SafetyStatus, Severity};
use tracing::warn;

/// Every color used across the UI. Callers read fields directly, e.g.
/// `Style::default().fg(theme.border_active)`.
#[derive(Debug, Clone)]
pub struct Theme {
    pub border_active: Color,
    pub border_inactive: Color,

    // Diff review
    pub diff_added: Color,
    pub diff_removed: Color,
    pub diff_context: Color,
    /// Line-number gutter in the editor and the diff view.
    pub gutter: Color,

    // File tree
    pub directory: Color,
    pub fix_pending: Color,
    pub fix_staged: Color,

    // Analysis verdicts
    pub status_safe: Color,
    pub status_warning: Color,
    pub status_danger: Color,

    // Issue severity badges
    pub badge_critical: Color,
    pub badge_high: Color,
    pub badge_medium: Color,
    pub badge_low: Color,
    pub badge_info: Color,

    // Chat
    pub chat_user: Color,
    pub chat_assistant: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
    pub notice_info: Color,
    pub notice_error: Color,

    pub background: Color,
}

impl Theme {
    /// Built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            diff_added: Color::Green,
            diff_removed: Color::Red,
            diff_context: Color::Reset,
            gutter: Color::DarkGray,

            directory: Color::Blue,
            fix_pending: Color::Yellow,
            fix_staged: Color::Magenta,

            status_safe: Color::Green,
            status_warning: Color::Yellow,
            status_danger: Color::Red,

            badge_critical: Color::Red,
            badge_high: Color::LightRed,
            badge_medium: Color::Yellow,
            badge_low: Color::Blue,
            badge_info: Color::DarkGray,

            chat_user: Color::Cyan,
            chat_assistant: Color::Reset,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            notice_info: Color::Green,
            notice_error: Color::Red,

            background: Color::Reset,
        }
    }

    /// Catppuccin Mocha, <https://github.com/catppuccin/catppuccin>.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let maroon = Color::Rgb(235, 160, 172); // #eba0ac
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let mauve = Color::Rgb(203, 166, 247); // #cba6f7
        let sapphire = Color::Rgb(116, 199, 236); // #74c7ec
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            diff_added: green,
            diff_removed: red,
            diff_context: text,
            gutter: overlay1,

            directory: blue,
            fix_pending: yellow,
            fix_staged: mauve,

            status_safe: green,
            status_warning: yellow,
            status_danger: red,

            badge_critical: red,
            badge_high: maroon,
            badge_medium: peach,
            badge_low: blue,
            badge_info: overlay1,

            chat_user: sapphire,
            chat_assistant: text,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
            notice_info: green,
            notice_error: red,

            background: base,
        }
    }

    /// Resolves a theme name from config. Unknown names fall back to `dark`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                warn!(theme = other, "unknown theme, falling back to dark");
                Self::dark()
            }
        }
    }

    pub fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Critical => self.badge_critical,
            Severity::High => self.badge_high,
            Severity::Medium => self.badge_medium,
            Severity::Low => self.badge_low,
            Severity::Info => self.badge_info,
        }
    }

    pub fn safety(&self, status: SafetyStatus) -> Color {
        match status {
            SafetyStatus::Safe => self.status_safe,
            SafetyStatus::Warning => self.status_warning,
            SafetyStatus::Danger => self.status_danger,
        }
    }

    /// Badge color for a file's review state; `None` for clean files.
    pub fn fix_status(&self, status: FixStatus) -> Option<Color> {
        match status {
            FixStatus::Clean => None,
            FixStatus::Fixing => Some(self.fix_pending),
            FixStatus::Staged => Some(self.fix_staged),
        }
    }
}
