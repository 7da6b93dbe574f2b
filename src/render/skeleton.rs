use crate::hand::HandKeypointIndex;

/// 手の骨格の接続定義 (開始キーポイント, 終了キーポイント)
pub const HAND_CONNECTIONS: [(HandKeypointIndex, HandKeypointIndex); 21] = {
    use HandKeypointIndex::*;
    [
        // 親指
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // 人差し指
        (Wrist, IndexMcp),
        (IndexMcp, IndexPip),
        (IndexPip, IndexDip),
        (IndexDip, IndexTip),
        // 中指
        (IndexMcp, MiddleMcp),
        (MiddleMcp, MiddlePip),
        (MiddlePip, MiddleDip),
        (MiddleDip, MiddleTip),
        // 薬指
        (MiddleMcp, RingMcp),
        (RingMcp, RingPip),
        (RingPip, RingDip),
        (RingDip, RingTip),
        // 小指・手のひら
        (RingMcp, PinkyMcp),
        (Wrist, PinkyMcp),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

/// 背景 (RGB)
pub const BACKGROUND_COLOR: u32 = 0xDCDCDC;

/// 映像エリア (RGB)
pub const VIDEO_AREA_COLOR: u32 = 0x202020;

/// キーポイントの色 (RGB)
pub const KEYPOINT_COLOR: u32 = 0x00FF00; // 緑

/// 骨格線の色 (RGB)
pub const SKELETON_COLOR: u32 = 0xFF0000; // 赤

/// 消灯中のLED (RGB)
pub const LED_OFF_COLOR: u32 = 0x808080;

pub const RED_COLOR: u32 = 0xFF0000;
pub const YELLOW_COLOR: u32 = 0xFFFF00;
pub const GREEN_COLOR: u32 = 0x008000;
pub const WHITE_COLOR: u32 = 0xFFFFFF;
pub const BLACK_COLOR: u32 = 0x000000;
