//! Activity Feed
//!
//! One bounded read of the aggregated activity view per mount. The view is
//! loading, failed, or loaded; a loaded feed with no rows is the empty state,
//! not an error.

use std::fmt;

use crate::backend::{Backend, BackendResult, FeedActivity, FeedQuery};
use crate::notify::Toasts;

/// Shown in place of the table when the read fails
pub const FEED_ERROR_MESSAGE: &str =
    "Failed to load activity feed. Check your connection or database setup.";

/// Render state of the feed view
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FeedState {
    #[default]
    Loading,
    Failed(String),
    Loaded(Vec<FeedActivity>),
}

impl FeedState {
    /// Issue the feed read and settle it
    pub async fn load(backend: &dyn Backend, query: FeedQuery, toasts: &mut Toasts) -> Self {
        let result = backend.read_feed(query).await;
        Self::from_load(result, toasts)
    }

    /// Settle a finished feed read
    pub fn from_load(result: BackendResult<Vec<FeedActivity>>, toasts: &mut Toasts) -> Self {
        match result {
            Ok(rows) => {
                tracing::debug!(rows = rows.len(), "Feed loaded");
                FeedState::Loaded(rows)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching feed data");
                toasts.error("Failed to load activity feed.");
                FeedState::Failed(FEED_ERROR_MESSAGE.to_string())
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FeedState::Loading)
    }

    /// Loaded, but nothing has been submitted yet
    pub fn is_empty(&self) -> bool {
        matches!(self, FeedState::Loaded(rows) if rows.is_empty())
    }

    pub fn rows(&self) -> &[FeedActivity] {
        match self {
            FeedState::Loaded(rows) => rows,
            _ => &[],
        }
    }
}

/// Display colour for a team name
///
/// The hue is the sum of the name's UTF-16 code units modulo 360, at fixed
/// saturation and lightness, so every client agrees on a team's colour.
pub fn team_color(team_name: &str) -> Hsl {
    let sum: u64 = team_name.encode_utf16().map(u64::from).sum();
    Hsl {
        hue: (sum % 360) as u16,
        saturation: 70,
        lightness: 50,
    }
}

/// An HSL colour with integer hue and percentage components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Hsl {
    /// Convert to 8-bit RGB
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let s = f64::from(self.saturation) / 100.0;
        let l = f64::from(self.lightness) / 100.0;
        let h = f64::from(self.hue % 360) / 60.0;

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match h as u8 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}
