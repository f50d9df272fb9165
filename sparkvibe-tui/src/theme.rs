//! Neon-on-charcoal palette for the dashboard.
//!
//! - **Accent**: electric cyan (focus, headers, the fast moving average)
//! - **Positive**: neon green (gains, golden crosses, market open)
//! - **Negative**: hot pink (losses, death crosses, errors)
//! - **Warning**: neon orange (alerts, high volume, moderate inflation)
//! - **Neutral**: cool purple (the slow moving average, secondary series)
//! - **Muted**: steel blue (hints, disabled text)
//!
//! Widgets use the style functions at the bottom of this module rather than
//! raw colors.

use ratatui::style::{Color, Modifier, Style};

use sparkvibe_core::cpi::InflationStatus;
use sparkvibe_core::indicators::{CrossKind, CrossRecency, VolumeLevel};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::spark_neon()
    }
}

impl Theme {
    pub const fn spark_neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            positive: Color::Rgb(0, 255, 128),
            negative: Color::Rgb(255, 20, 147),
            warning: Color::Rgb(255, 140, 0),
            neutral: Color::Rgb(147, 112, 219),
            muted: Color::Rgb(100, 149, 237),
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    /// Green for gains and flat days, pink for losses.
    pub fn change_color(&self, pct: f64) -> Color {
        if pct >= 0.0 {
            self.positive
        } else {
            self.negative
        }
    }

    pub fn cross_color(&self, kind: CrossKind) -> Color {
        match kind {
            CrossKind::Golden => self.positive,
            CrossKind::Death => self.negative,
        }
    }

    pub fn recency_color(&self, recency: CrossRecency) -> Color {
        match recency {
            CrossRecency::Fresh => self.positive,
            CrossRecency::Recent => self.warning,
            CrossRecency::Stale => self.negative,
        }
    }

    pub fn volume_color(&self, level: VolumeLevel) -> Color {
        match level {
            VolumeLevel::High => self.warning,
            VolumeLevel::Normal => self.text_primary,
            VolumeLevel::Low => self.muted,
        }
    }

    pub fn inflation_color(&self, status: InflationStatus) -> Color {
        match status {
            InflationStatus::Deflation => self.positive,
            InflationStatus::Low => self.accent,
            InflationStatus::Moderate => self.warning,
            InflationStatus::High => self.negative,
        }
    }

    /// Line colors for the CPI chart, cycled per selected category.
    pub fn series_colors(&self) -> [Color; 5] {
        [
            self.accent,
            self.warning,
            self.positive,
            self.neutral,
            self.negative,
        ]
    }
}

const PALETTE: Theme = Theme::spark_neon();

pub fn palette() -> Theme {
    PALETTE
}

pub fn text() -> Style {
    Style::default().fg(PALETTE.text_primary)
}

pub fn secondary() -> Style {
    Style::default().fg(PALETTE.text_secondary)
}

pub fn accent() -> Style {
    Style::default().fg(PALETTE.accent)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(PALETTE.muted)
}

pub fn warning() -> Style {
    Style::default().fg(PALETTE.warning)
}

pub fn positive() -> Style {
    Style::default().fg(PALETTE.positive)
}

pub fn negative() -> Style {
    Style::default().fg(PALETTE.negative)
}

pub fn neutral() -> Style {
    Style::default().fg(PALETTE.neutral)
}

pub fn change(pct: f64) -> Style {
    Style::default().fg(PALETTE.change_color(pct))
}

pub fn cursor() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        secondary()
    }
}
