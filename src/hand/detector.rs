use serde::Deserialize;

use crate::config::HandsConfig;
use crate::hand::keypoint::{Hand, HandKeypointIndex, Keypoint};

/// 検出プロセスが1行ごとに出力するJSON
#[derive(Deserialize, Debug)]
struct DetectionJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    #[serde(default = "default_score", alias = "confidence")]
    score: f32,
    #[serde(alias = "landmarks")]
    keypoints: Vec<KeypointJson>,
}

#[derive(Deserialize, Debug)]
struct KeypointJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

fn default_score() -> f32 {
    1.0
}

/// 外部の手検出モデルの出力（JSON行）を Hand に変換する
pub struct HandDetector {
    max_hands: usize,
    min_score: f32,
    /// 正規化座標をピクセル座標に変換するスケール
    scale: Option<(f32, f32)>,
}

impl HandDetector {
    pub fn new(max_hands: usize, min_score: f32) -> Self {
        Self {
            max_hands,
            min_score,
            scale: None,
        }
    }

    pub fn from_config(config: &HandsConfig) -> Self {
        let detector = Self::new(config.max_hands, config.min_score);
        if config.normalized {
            detector.with_normalized(config.frame_width, config.frame_height)
        } else {
            detector
        }
    }

    /// 入力が 0.0〜1.0 の正規化座標である場合
    pub fn with_normalized(mut self, width: u32, height: u32) -> Self {
        self.scale = Some((width as f32, height as f32));
        self
    }

    /// 1行を解析する。解析できない行は None（呼び出し側でフレームを捨てる）
    pub fn parse_line(&self, line: &str) -> Option<Vec<Hand>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let result: DetectionJson = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("malformed detector output ({}): {}", e, truncate(line, 80));
                return None;
            }
        };

        if let Some(error) = result.error {
            log::warn!("hand detector error: {}", error);
            return Some(Vec::new());
        }

        let mut hands = Vec::with_capacity(result.hands.len().min(self.max_hands));
        for hand in result.hands {
            if hands.len() >= self.max_hands {
                break;
            }
            if hand.score < self.min_score {
                log::debug!("hand skipped: score {:.2} < {:.2}", hand.score, self.min_score);
                continue;
            }
            if hand.keypoints.len() != HandKeypointIndex::COUNT {
                log::warn!(
                    "expected {} keypoints, got {}",
                    HandKeypointIndex::COUNT,
                    hand.keypoints.len()
                );
                continue;
            }

            let (sx, sy) = self.scale.unwrap_or((1.0, 1.0));
            let mut keypoints = [Keypoint::default(); HandKeypointIndex::COUNT];
            for (dst, src) in keypoints.iter_mut().zip(hand.keypoints.iter()) {
                *dst = Keypoint {
                    x: src.x * sx,
                    y: src.y * sy,
                    z: src.z,
                };
            }

            if let Some(i) = keypoints.iter().position(|k| !k.is_in_range()) {
                log::warn!(
                    "hand skipped: keypoint {} out of range ({}, {})",
                    i,
                    keypoints[i].x,
                    keypoints[i].y
                );
                continue;
            }

            hands.push(Hand {
                keypoints,
                score: hand.score,
                handedness: hand.handedness,
            });
        }

        Some(hands)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
