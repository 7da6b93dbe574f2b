use crate::hand::{Hand, HandKeypointIndex};

/// 手の縦方向の範囲に対するキーポイントの位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipPosition {
    /// 手の最上部（最小Y）付近
    Top,
    /// 手の最下部（最大Y）付近
    Bottom,
}

/// キーポイントが手の最上部・最下部にあるかを判定する。
///
/// 最小Yとの差が `threshold` 未満なら `Top`、そうでなく最大Yとの差が `threshold` 未満なら
/// `Bottom`。両方を満たす小さな手では `Top` が優先される。
pub fn classify_tip(hand: &Hand, index: HandKeypointIndex, threshold: f32) -> Option<TipPosition> {
    let y = hand.get(index).y;
    if (y - hand.min_y()).abs() < threshold {
        Some(TipPosition::Top)
    } else if (y - hand.max_y()).abs() < threshold {
        Some(TipPosition::Bottom)
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::hand_with_tips;
    use super::*;
    use HandKeypointIndex::*;

    #[test]
    fn test_top() {
        let hand = hand_with_tips(&[(ThumbTip, 105.0)]);
        assert_eq!(classify_tip(&hand, ThumbTip, 10.0), Some(TipPosition::Top));
    }

    #[test]
    fn test_bottom() {
        let hand = hand_with_tips(&[(IndexTip, 295.0)]);
        assert_eq!(classify_tip(&hand, IndexTip, 10.0), Some(TipPosition::Bottom));
    }

    #[test]
    fn test_middle_is_none() {
        let hand = hand_with_tips(&[]);
        assert_eq!(classify_tip(&hand, PinkyTip, 10.0), None);
    }

    #[test]
    fn test_threshold_is_strict() {
        // ちょうど閾値の距離は該当しない
        let hand = hand_with_tips(&[(ThumbTip, 110.0)]);
        assert_eq!(classify_tip(&hand, ThumbTip, 10.0), None);
        assert_eq!(classify_tip(&hand, ThumbTip, 10.5), Some(TipPosition::Top));
    }

    #[test]
    fn test_tip_defines_extent() {
        // 指先自身が最小Yなら距離0でTop
        let hand = hand_with_tips(&[(IndexTip, 40.0)]);
        assert_eq!(hand.min_y(), 40.0);
        assert_eq!(classify_tip(&hand, IndexTip, 10.0), Some(TipPosition::Top));
    }

    #[test]
    fn test_flat_hand_prefers_top() {
        let keypoints = [crate::hand::Keypoint::new(0.0, 200.0); HandKeypointIndex::COUNT];
        let hand = Hand::new(keypoints);
        assert_eq!(classify_tip(&hand, ThumbTip, 10.0), Some(TipPosition::Top));
    }
}
