use crate::config::{Config, GestureConfig};
use crate::gesture::{classify_mode, SlideAdjuster, TwoHandToggle};
use crate::hand::Hand;
use crate::protocol::{DeviceStatus, HostCommand, Light, Mode, Timings};

/// ホスト側の状態: ジェスチャー → 送信コマンド、受信行 → 表示状態
pub struct Controller {
    threshold: f32,
    slider_step: u32,
    adjuster: SlideAdjuster,
    toggle: TwoHandToggle,
    timings: Timings,
    /// 最後に送信したモード（重複送信の抑止）
    sent_mode: Option<Mode>,
    status: DeviceStatus,
}

impl Controller {
    pub fn new(gesture: &GestureConfig, timings: Timings) -> Self {
        let adjuster = SlideAdjuster::from_config(gesture);
        Self {
            threshold: gesture.threshold,
            slider_step: gesture.slider_step.max(1),
            timings: Timings::new(
                adjuster.clamp(timings.red),
                adjuster.clamp(timings.yellow),
                adjuster.clamp(timings.green),
            ),
            adjuster,
            toggle: TwoHandToggle::new(),
            sent_mode: None,
            status: DeviceStatus::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.gesture, config.timing.timings())
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    pub fn is_slide_mode(&self) -> bool {
        self.toggle.is_active()
    }

    pub fn sent_mode(&self) -> Option<Mode> {
        self.sent_mode
    }

    pub fn status(&self) -> &DeviceStatus {
        &self.status
    }

    /// 描画フレームごとの処理。`link_open` は送信可能かどうか
    pub fn on_frame(&mut self, hands: &[Hand], link_open: bool) -> Vec<HostCommand> {
        if self.toggle.update(hands.len()) {
            log::info!("slide mode toggled: {}", self.toggle.is_active());
        }

        if self.toggle.is_active() {
            self.adjuster.apply(hands, &mut self.timings);
            if link_open {
                return self.timings.commands().to_vec();
            }
            return Vec::new();
        }

        match classify_mode(hands, self.threshold) {
            Some(mode) if link_open && self.sent_mode != Some(mode) => {
                log::info!("mode gesture: {}", mode);
                self.sent_mode = Some(mode);
                vec![HostCommand::Mode(mode)]
            }
            _ => Vec::new(),
        }
    }

    /// スライダー操作。刻みに丸めて範囲内に収め、3色分の時間を送る
    pub fn set_timing(&mut self, light: Light, ms: u32, link_open: bool) -> Vec<HostCommand> {
        let step = self.slider_step;
        let snapped = ms.saturating_add(step / 2) / step * step;
        *self.timings.get_mut(light) = self.adjuster.clamp(snapped);
        if link_open {
            self.timings.commands().to_vec()
        } else {
            Vec::new()
        }
    }

    pub fn on_device_line(&mut self, line: &str) {
        self.status.apply_line(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::extent::test_support::hand_with_tips;
    use crate::hand::HandKeypointIndex::*;

    fn controller() -> Controller {
        Controller::new(&GestureConfig::default(), Timings::default())
    }

    #[test]
    fn test_mode_sent_once() {
        let mut c = controller();
        let hand = hand_with_tips(&[(ThumbTip, 300.0)]);
        assert_eq!(
            c.on_frame(&[hand.clone()], true),
            vec![HostCommand::Mode(Mode::Emergency)]
        );
        assert!(c.on_frame(&[hand], true).is_empty());
        assert_eq!(c.sent_mode(), Some(Mode::Emergency));
    }

    #[test]
    fn test_mode_change_is_sent() {
        let mut c = controller();
        c.on_frame(&[hand_with_tips(&[(IndexTip, 100.0)])], true);
        let cmds = c.on_frame(&[hand_with_tips(&[(IndexTip, 300.0)])], true);
        assert_eq!(cmds, vec![HostCommand::Mode(Mode::Off)]);
    }

    #[test]
    fn test_no_gesture_keeps_last_mode() {
        let mut c = controller();
        c.on_frame(&[hand_with_tips(&[(ThumbTip, 100.0)])], true);
        assert!(c.on_frame(&[], true).is_empty());
        assert!(c.on_frame(&[hand_with_tips(&[])], true).is_empty());
        assert_eq!(c.sent_mode(), Some(Mode::Blinking));
    }

    #[test]
    fn test_closed_link_does_not_record_mode() {
        let mut c = controller();
        let hand = hand_with_tips(&[(ThumbTip, 100.0)]);
        assert!(c.on_frame(&[hand.clone()], false).is_empty());
        assert_eq!(c.sent_mode(), None);
        // 接続後に同じジェスチャーで送信される
        assert_eq!(c.on_frame(&[hand], true), vec![HostCommand::Mode(Mode::Blinking)]);
    }

    #[test]
    fn test_two_hands_enter_slide_mode() {
        let mut c = controller();
        let up = hand_with_tips(&[(ThumbTip, 100.0)]);
        let neutral = hand_with_tips(&[]);
        let cmds = c.on_frame(&[up.clone(), neutral.clone()], true);
        assert!(c.is_slide_mode());
        assert_eq!(c.timings().red, 2050);
        assert_eq!(cmds, Timings::new(2050, 500, 2000).commands().to_vec());

        // 1つの手に戻ってもスライドモードのまま調整が続く
        c.on_frame(&[up], true);
        assert_eq!(c.timings().red, 2100);
        assert_eq!(c.sent_mode(), None);
    }

    #[test]
    fn test_slide_mode_sends_every_frame() {
        let mut c = controller();
        let neutral = hand_with_tips(&[]);
        c.on_frame(&[neutral.clone(), neutral.clone()], true);
        let cmds = c.on_frame(&[neutral], true);
        assert_eq!(cmds.len(), 3);
        assert!(c.on_frame(&[], false).is_empty());
    }

    #[test]
    fn test_leave_slide_mode() {
        let mut c = controller();
        let neutral = hand_with_tips(&[]);
        c.on_frame(&[neutral.clone(), neutral.clone()], true);
        c.on_frame(&[neutral.clone()], true);
        c.on_frame(&[neutral.clone(), neutral.clone()], true);
        assert!(!c.is_slide_mode());
        let cmds = c.on_frame(&[hand_with_tips(&[(IndexTip, 100.0)])], true);
        assert_eq!(cmds, vec![HostCommand::Mode(Mode::Normal)]);
    }

    #[test]
    fn test_set_timing_snaps_and_clamps() {
        let mut c = controller();
        let cmds = c.set_timing(Light::Yellow, 1234, true);
        assert_eq!(c.timings().yellow, 1230);
        assert_eq!(cmds[1], HostCommand::Duration { light: Light::Yellow, ms: 1230 });
        c.set_timing(Light::Green, 9000, false);
        assert_eq!(c.timings().green, 5000);
        assert!(c.set_timing(Light::Red, 10, false).is_empty());
        assert_eq!(c.timings().red, 500);
    }

    #[test]
    fn test_device_lines_update_status() {
        let mut c = controller();
        c.on_device_line("B:512");
        c.on_device_line("M:BLINKING");
        c.on_device_line("Y1");
        assert_eq!(c.status().brightness, 512);
        assert_eq!(c.status().mode, "BLINKING");
        assert!(c.status().yellow);
    }
}
