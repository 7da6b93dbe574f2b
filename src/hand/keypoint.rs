/// 手の 21 キーポイントインデックス (MediaPipe / ml5 handPose 準拠)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandKeypointIndex {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandKeypointIndex {
    pub const COUNT: usize = 21;

    pub fn from_index(index: usize) -> Option<Self> {
        use HandKeypointIndex::*;
        const ALL: [HandKeypointIndex; HandKeypointIndex::COUNT] = [
            Wrist, ThumbCmc, ThumbMcp, ThumbIp, ThumbTip,
            IndexMcp, IndexPip, IndexDip, IndexTip,
            MiddleMcp, MiddlePip, MiddleDip, MiddleTip,
            RingMcp, RingPip, RingDip, RingTip,
            PinkyMcp, PinkyPip, PinkyDip, PinkyTip,
        ];
        ALL.get(index).copied()
    }
}

/// 受け付ける座標の絶対値の上限（ピクセル）。フレーム外にはみ出した指先は許容する
pub const COORD_LIMIT: f32 = 16384.0;

/// 単一キーポイント（映像フレームのピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// 手首からの相対深度。判定には使わない
    pub z: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// 有限かつ `COORD_LIMIT` 以内か
    pub fn is_in_range(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.x.abs() <= COORD_LIMIT
            && self.y.abs() <= COORD_LIMIT
    }

    /// ピクセル座標に丸める（`COORD_LIMIT` で打ち切り、NaN は 0）
    pub fn to_pixel(&self) -> (i32, i32) {
        let clamp = |v: f32| v.clamp(-COORD_LIMIT, COORD_LIMIT).round() as i32;
        (clamp(self.x), clamp(self.y))
    }
}

/// 検出された1つの手
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub keypoints: [Keypoint; HandKeypointIndex::COUNT],
    /// 検出スコア (0.0〜1.0)
    pub score: f32,
    /// "Left" / "Right"
    pub handedness: String,
}

impl Hand {
    pub fn new(keypoints: [Keypoint; HandKeypointIndex::COUNT]) -> Self {
        Self {
            keypoints,
            score: 1.0,
            handedness: String::new(),
        }
    }

    pub fn get(&self, index: HandKeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    /// 全キーポイント中の最小Y（画面上で最も上）
    pub fn min_y(&self) -> f32 {
        self.keypoints.iter().map(|k| k.y).fold(f32::INFINITY, f32::min)
    }

    /// 全キーポイント中の最大Y（画面上で最も下）
    pub fn max_y(&self) -> f32 {
        self.keypoints.iter().map(|k| k.y).fold(f32::NEG_INFINITY, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_index_from_index() {
        assert_eq!(HandKeypointIndex::from_index(0), Some(HandKeypointIndex::Wrist));
        assert_eq!(HandKeypointIndex::from_index(4), Some(HandKeypointIndex::ThumbTip));
        assert_eq!(HandKeypointIndex::from_index(8), Some(HandKeypointIndex::IndexTip));
        assert_eq!(HandKeypointIndex::from_index(20), Some(HandKeypointIndex::PinkyTip));
        assert_eq!(HandKeypointIndex::from_index(21), None);
    }

    #[test]
    fn test_keypoint_index_discriminants_match_position() {
        for i in 0..HandKeypointIndex::COUNT {
            assert_eq!(HandKeypointIndex::from_index(i).unwrap() as usize, i);
        }
    }

    #[test]
    fn test_hand_extent() {
        let mut keypoints = [Keypoint::new(100.0, 200.0); HandKeypointIndex::COUNT];
        keypoints[HandKeypointIndex::IndexTip as usize] = Keypoint::new(110.0, 50.0);
        keypoints[HandKeypointIndex::Wrist as usize] = Keypoint::new(100.0, 320.0);
        let hand = Hand::new(keypoints);
        assert_eq!(hand.min_y(), 50.0);
        assert_eq!(hand.max_y(), 320.0);
        assert_eq!(hand.get(HandKeypointIndex::IndexTip).x, 110.0);
    }

    #[test]
    fn test_to_pixel_rounds() {
        assert_eq!(Keypoint::new(10.6, 3.2).to_pixel(), (11, 3));
    }

    #[test]
    fn test_to_pixel_clamps_out_of_range() {
        let limit = COORD_LIMIT as i32;
        assert_eq!(Keypoint::new(3e9, -3e9).to_pixel(), (limit, -limit));
        assert_eq!(Keypoint::new(f32::NAN, f32::INFINITY).to_pixel(), (0, limit));
    }

    #[test]
    fn test_is_in_range() {
        assert!(Keypoint::new(-40.0, 700.0).is_in_range());
        assert!(!Keypoint::new(3e9, 100.0).is_in_range());
        assert!(!Keypoint::new(f32::NAN, 100.0).is_in_range());
    }
}
