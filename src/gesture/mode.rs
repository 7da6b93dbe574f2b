use crate::gesture::extent::{classify_tip, TipPosition};
use crate::hand::{Hand, HandKeypointIndex};
use crate::protocol::Mode;

/// 手のジェスチャーからモードを決める。
///
/// 親指: 上 → BLINKING, 下 → EMERGENCY
/// 人差し指: 上 → NORMAL, 下 → OFF（親指より優先）
///
/// 手ごとに順に評価し、後の手の結果で上書きする。
pub fn classify_mode(hands: &[Hand], threshold: f32) -> Option<Mode> {
    let mut mode = None;
    for hand in hands {
        match classify_tip(hand, HandKeypointIndex::ThumbTip, threshold) {
            Some(TipPosition::Top) => mode = Some(Mode::Blinking),
            Some(TipPosition::Bottom) => mode = Some(Mode::Emergency),
            None => {}
        }
        match classify_tip(hand, HandKeypointIndex::IndexTip, threshold) {
            Some(TipPosition::Top) => mode = Some(Mode::Normal),
            Some(TipPosition::Bottom) => mode = Some(Mode::Off),
            None => {}
        }
    }
    mode
}
