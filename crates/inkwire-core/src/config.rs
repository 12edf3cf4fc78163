//! Whiteboard configuration.

use crate::collaboration::DEFAULT_ROOM;
use crate::stroke::{Brush, StrokeColor};
use serde::{Deserialize, Serialize};

/// Configuration for one whiteboard instance. Changes to brush settings
/// after construction go through the capture session and apply to future
/// strokes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Background color painted before each full repaint.
    pub background: StrokeColor,
    /// Initial brush settings.
    pub brush: Brush,
    /// Room name scoping which peers share this board's stroke log.
    pub room: String,
    /// Relay server endpoint used to reach other peers.
    pub relay_url: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: StrokeColor::white(),
            brush: Brush::default(),
            room: DEFAULT_ROOM.to_string(),
            relay_url: "ws://localhost:3030/ws".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoardConfig::default();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.background, StrokeColor::white());
        assert_eq!(config.brush.color, StrokeColor::black());
        assert!((config.brush.size() - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.room, "default-room");
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = BoardConfig {
            room: "studio".to_string(),
            ..BoardConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: BoardConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.room, "studio");
        assert_eq!(back.width, config.width);
    }
}
