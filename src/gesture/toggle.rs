/// 「ちょうど2つの手が見えている」状態の立ち上がりでスライドモードを反転する
#[derive(Debug, Clone, Default)]
pub struct TwoHandToggle {
    prev_two_hands: bool,
    active: bool,
}

impl TwoHandToggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 現フレームの手の数を与える。反転した場合は true
    pub fn update(&mut self, hand_count: usize) -> bool {
        let two_hands = hand_count == 2;
        let toggled = two_hands && !self.prev_two_hands;
        if toggled {
            self.active = !self.active;
        }
        self.prev_two_hands = two_hands;
        toggled
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
