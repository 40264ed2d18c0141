//! Runtime paint tuning, injected by the host at construction time

use serde::{Deserialize, Serialize};

/// Tunable paint parameters shared by every layout.
///
/// Owned by the composition root and passed in explicitly; there is no
/// ambient global instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintSettings {
    /// Radius in meters around a segment emitter that lights samples
    pub segment_paint_radius: f32,
    /// Half-extent in meters of a box-emitter paint volume
    pub box_paint_size: f32,
    /// Fade rate toward black, per second
    pub paint_decay_rate: f32,
    /// Path of the scene definition file
    pub scene_file_path: String,
}

impl Default for PaintSettings {
    fn default() -> Self {
        Self {
            segment_paint_radius: 0.05,
            box_paint_size: 0.25,
            paint_decay_rate: 2.0,
            scene_file_path: "DMXSceneFile.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let settings = PaintSettings {
            segment_paint_radius: 0.1,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: PaintSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }
}
