//! Color theme system for the issue manager.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every UI
//! surface the manager renders. Two built-in themes are provided:
//!
//! - `dark` — ANSI 16 colors (`Color::Reset`, `Color::DarkGray`, etc.) so it
//!   works on any terminal including 256-color SSH sessions.
//! - `catppuccin_mocha` — Catppuccin Mocha palette in RGB; requires truecolor.

use guardian_core::types::{Category, IssueStatus};
use ratatui::style::Color;

/// All color values used across the manager's UI surfaces.
///
/// Callers use `theme.field` directly inside
/// `Style::default().fg(theme.border_active)`.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Border color for the currently focused panel.
    pub border_active: Color,
    /// Border color for unfocused panels.
    pub border_inactive: Color,

    /// Badge color for open issues.
    pub status_open: Color,
    /// Badge color for resolved issues.
    pub status_resolved: Color,
    /// Badge color for issues marked won't-fix.
    pub status_wontfix: Color,

    /// Badge color for the Bugs & Security category.
    pub cat_bugs: Color,
    /// Badge color for the Performance & Architecture category.
    pub cat_performance: Color,
    /// Badge color for the Standards & Clean Code category.
    pub cat_standards: Color,
    /// Badge color for the Documentation category.
    pub cat_documentation: Color,
    /// Badge color for uncategorised issues.
    pub cat_other: Color,

    /// Status bar background.
    pub status_bar_bg: Color,
    /// Status bar foreground (general text).
    pub status_bar_fg: Color,
    /// Mode indicator color when in NORMAL mode.
    pub status_mode_normal: Color,
    /// Mode indicator color when in INSERT mode.
    pub status_mode_insert: Color,

    /// De-emphasised text (timestamps, placeholders).
    pub text_dim: Color,
    /// Application background.
    pub background: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            status_open: Color::Yellow,
            status_resolved: Color::Green,
            status_wontfix: Color::DarkGray,

            cat_bugs: Color::Red,
            cat_performance: Color::Yellow,
            cat_standards: Color::Blue,
            cat_documentation: Color::Magenta,
            cat_other: Color::DarkGray,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,

            text_dim: Color::DarkGray,
            background: Color::Reset,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Colors degrade to the nearest ANSI 256-color approximation on
    /// non-truecolor terminals. Use `dark()` on SSH or 256-color terminals.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161);    // #a6e3a1
        let red = Color::Rgb(243, 139, 168);      // #f38ba8
        let yellow = Color::Rgb(249, 226, 175);   // #f9e2af
        let blue = Color::Rgb(137, 180, 250);     // #89b4fa
        let mauve = Color::Rgb(203, 166, 247);    // #cba6f7
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90);    // #45475a
        let base = Color::Rgb(30, 30, 46);        // #1e1e2e
        let text = Color::Rgb(205, 214, 244);     // #cdd6f4
        let peach = Color::Rgb(250, 179, 135);    // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            status_open: peach,
            status_resolved: green,
            status_wontfix: overlay1,

            cat_bugs: red,
            cat_performance: yellow,
            cat_standards: blue,
            cat_documentation: mauve,
            cat_other: overlay1,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,

            text_dim: overlay1,
            background: base,
        }
    }

    /// Resolves a theme name string to the corresponding built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents
    /// startup; the fallback is logged to stderr.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                eprintln!("guardian: unknown theme '{}', falling back to 'dark'", other);
                Self::dark()
            }
        }
    }

    /// Badge color for an issue status.
    pub fn status_color(&self, status: IssueStatus) -> Color {
        match status {
            IssueStatus::Open => self.status_open,
            IssueStatus::Resolved => self.status_resolved,
            IssueStatus::Wontfix => self.status_wontfix,
        }
    }

    /// Badge color for an issue category.
    pub fn category_color(&self, category: Category) -> Color {
        match category {
            Category::BugsSecurity => self.cat_bugs,
            Category::PerformanceArchitecture => self.cat_performance,
            Category::Standards => self.cat_standards,
            Category::Documentation => self.cat_documentation,
            Category::Uncategorized => self.cat_other,
        }
    }
}
