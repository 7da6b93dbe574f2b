use crate::config::GestureConfig;
use crate::gesture::extent::{classify_tip, TipPosition};
use crate::hand::{Hand, HandKeypointIndex};
use crate::protocol::{Light, Timings};

/// 指と色の対応: 親指 → 赤, 人差し指 → 黄, 小指 → 緑
const FINGER_LIGHTS: [(HandKeypointIndex, Light); 3] = [
    (HandKeypointIndex::ThumbTip, Light::Red),
    (HandKeypointIndex::IndexTip, Light::Yellow),
    (HandKeypointIndex::PinkyTip, Light::Green),
];

/// スライドモードでの点灯時間調整
pub struct SlideAdjuster {
    threshold: f32,
    delta: u32,
    min: u32,
    max: u32,
}

impl SlideAdjuster {
    pub fn new(threshold: f32, delta: u32, min: u32, max: u32) -> Self {
        Self { threshold, delta, min, max }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(config.threshold, config.slide_delta, config.time_min, config.time_max)
    }

    /// 範囲内に収める
    pub fn clamp(&self, ms: u32) -> u32 {
        ms.clamp(self.min, self.max)
    }

    /// 各手の指先位置に応じて時間を増減する。変化があれば true
    pub fn apply(&self, hands: &[Hand], timings: &mut Timings) -> bool {
        let before = *timings;
        for hand in hands {
            for (finger, light) in FINGER_LIGHTS {
                let value = timings.get_mut(light);
                match classify_tip(hand, finger, self.threshold) {
                    Some(TipPosition::Top) => {
                        *value = self.clamp(value.saturating_add(self.delta));
                    }
                    Some(TipPosition::Bottom) => {
                        *value = self.clamp(value.saturating_sub(self.delta));
                    }
                    None => {}
                }
            }
        }
        *timings != before
    }
}

impl Default for SlideAdjuster {
    fn default() -> Self {
        Self::from_config(&GestureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::extent::test_support::hand_with_tips;
    use HandKeypointIndex::*;

    #[test]
    fn test_increase_and_decrease() {
        let adjuster = SlideAdjuster::default();
        let hand = hand_with_tips(&[(ThumbTip, 100.0), (IndexTip, 300.0)]);
        let mut timings = Timings::default();
        assert!(adjuster.apply(&[hand], &mut timings));
        assert_eq!(timings, Timings::new(2050, 500, 2000));
    }

    #[test]
    fn test_pinky_controls_green() {
        let adjuster = SlideAdjuster::default();
        let hand = hand_with_tips(&[(PinkyTip, 296.0)]);
        let mut timings = Timings::default();
        adjuster.apply(&[hand], &mut timings);
        assert_eq!(timings.green, 1950);
    }

    #[test]
    fn test_clamped_to_range() {
        let adjuster = SlideAdjuster::default();
        let up = hand_with_tips(&[(ThumbTip, 100.0)]);
        let mut timings = Timings::new(4980, 500, 2000);
        adjuster.apply(&[up], &mut timings);
        assert_eq!(timings.red, 5000);

        let down = hand_with_tips(&[(IndexTip, 300.0)]);
        assert!(!adjuster.apply(&[down], &mut timings));
        assert_eq!(timings.yellow, 500);
    }

    #[test]
    fn test_each_hand_applies() {
        let adjuster = SlideAdjuster::default();
        let hand = hand_with_tips(&[(ThumbTip, 100.0)]);
        let mut timings = Timings::default();
        adjuster.apply(&[hand.clone(), hand], &mut timings);
        assert_eq!(timings.red, 2100);
    }

    #[test]
    fn test_neutral_hand_unchanged() {
        let adjuster = SlideAdjuster::default();
        let mut timings = Timings::default();
        assert!(!adjuster.apply(&[hand_with_tips(&[])], &mut timings));
        assert_eq!(timings, Timings::default());
    }
}
