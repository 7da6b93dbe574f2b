use crate::hand::Hand;
use crate::protocol::{DeviceStatus, Light, Timings};
use crate::render::canvas::Canvas;
use crate::render::skeleton::*;

/// 映像エリアの左上
pub const VIDEO_ORIGIN: (i32, i32) = (80, 240);
pub const VIDEO_SIZE: (i32, i32) = (640, 480);

/// LEDインジケータの中心X（赤・黄・緑）
const LED_X: [i32; 3] = [150, 300, 450];
const LED_Y: i32 = 100;
const LED_RADIUS: i32 = 25;

/// スライダーの左端X（赤・黄・緑）
const SLIDER_X: [i32; 3] = [100, 250, 400];
const SLIDER_Y: i32 = 160;
const SLIDER_WIDTH: i32 = 100;

const CONNECT_BUTTON: (i32, i32, i32, i32) = (550, 155, 40, 16);
const MODE_SWATCH: (i32, i32, i32, i32) = (160, 22, 60, 16);
const BRIGHTNESS_BAR: (i32, i32, i32, i32) = (160, 55, 200, 10);
const BRIGHTNESS_MAX: i32 = 1023;

/// ウィンドウ操作から得られるイベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// クリック: 検出の一時停止/再開
    ToggleDetection,
    /// Cキー: 接続/切断
    ToggleConnection,
}

/// 1フレームの描画に必要な状態
pub struct ViewState<'a> {
    pub hands: &'a [Hand],
    pub timings: Timings,
    pub time_range: (u32, u32),
    pub slide_mode: bool,
    pub status: &'a DeviceStatus,
    pub connected: bool,
    pub detecting: bool,
}

/// ステータス画面のレイアウト
pub struct StatusView {
    canvas: Canvas,
}

impl StatusView {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            canvas: Canvas::new(width, height),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn draw(&mut self, state: &ViewState) -> &Canvas {
        let c = &mut self.canvas;
        let width = c.width() as i32;
        c.clear(BACKGROUND_COLOR);

        let (vx, vy) = VIDEO_ORIGIN;
        c.fill_rect(vx, vy, VIDEO_SIZE.0, VIDEO_SIZE.1, VIDEO_AREA_COLOR);

        if state.slide_mode {
            // "SLIDE MODE" バナー
            c.fill_rect(width / 2 - 40, 24, 80, 12, WHITE_COLOR);
        } else {
            c.fill_rect(MODE_SWATCH.0, MODE_SWATCH.1, MODE_SWATCH.2, MODE_SWATCH.3, mode_color(&state.status.mode));
            let (bx, by, bw, bh) = BRIGHTNESS_BAR;
            c.fill_rect(bx, by, bw, bh, LED_OFF_COLOR);
            let filled = state.status.brightness.clamp(0, BRIGHTNESS_MAX) * bw / BRIGHTNESS_MAX;
            c.fill_rect(bx, by, filled, bh, BLACK_COLOR);

            for hand in state.hands {
                draw_hand(c, hand);
            }
        }

        let slider_color = if state.slide_mode { WHITE_COLOR } else { BLACK_COLOR };
        let (min, max) = state.time_range;
        for (i, light) in Light::ALL.into_iter().enumerate() {
            c.fill_rect(SLIDER_X[i], SLIDER_Y, SLIDER_WIDTH, 6, LED_OFF_COLOR);
            let filled = slider_fraction(state.timings.get(light), min, max, SLIDER_WIDTH);
            c.fill_rect(SLIDER_X[i], SLIDER_Y, filled, 6, slider_color);

            let color = if state.status.led(light) { light_color(light) } else { LED_OFF_COLOR };
            c.draw_circle(LED_X[i], LED_Y, LED_RADIUS, color);
        }

        let (bx, by, bw, bh) = CONNECT_BUTTON;
        let button_color = if state.connected { GREEN_COLOR } else { LED_OFF_COLOR };
        c.fill_rect(bx, by, bw, bh, button_color);

        let detect_color = if state.detecting { KEYPOINT_COLOR } else { LED_OFF_COLOR };
        c.draw_circle(width - 30, 30, 8, detect_color);

        &self.canvas
    }
}

fn draw_hand(c: &mut Canvas, hand: &Hand) {
    let (vx, vy) = VIDEO_ORIGIN;
    for (start, end) in HAND_CONNECTIONS.iter() {
        let (x1, y1) = hand.get(*start).to_pixel();
        let (x2, y2) = hand.get(*end).to_pixel();
        c.draw_line(
            x1.saturating_add(vx),
            y1.saturating_add(vy),
            x2.saturating_add(vx),
            y2.saturating_add(vy),
            SKELETON_COLOR,
        );
    }
    for kp in hand.keypoints.iter() {
        let (px, py) = kp.to_pixel();
        c.draw_circle(px.saturating_add(vx), py.saturating_add(vy), 5, KEYPOINT_COLOR);
    }
}

fn slider_fraction(value: u32, min: u32, max: u32, width: i32) -> i32 {
    if max <= min {
        return width;
    }
    let v = value.clamp(min, max) - min;
    (v as u64 * width as u64 / (max - min) as u64) as i32
}

fn light_color(light: Light) -> u32 {
    match light {
        Light::Red => RED_COLOR,
        Light::Yellow => YELLOW_COLOR,
        Light::Green => GREEN_COLOR,
    }
}

fn mode_color(mode: &str) -> u32 {
    match mode {
        "NORMAL" => GREEN_COLOR,
        "EMERGENCY" => RED_COLOR,
        "BLINKING" => YELLOW_COLOR,
        "OFF" => BLACK_COLOR,
        _ => LED_OFF_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{HandKeypointIndex, Keypoint};

    fn state<'a>(hands: &'a [Hand], status: &'a DeviceStatus, slide_mode: bool) -> ViewState<'a> {
        ViewState {
            hands,
            timings: Timings::default(),
            time_range: (500, 5000),
            slide_mode,
            status,
            connected: true,
            detecting: true,
        }
    }

    #[test]
    fn test_led_indicators() {
        let mut status = DeviceStatus::default();
        status.apply_line("R1");
        let mut view = StatusView::new(800, 700);
        let canvas = view.draw(&state(&[], &status, false));
        assert_eq!(canvas.pixel(150, 100), Some(RED_COLOR));
        assert_eq!(canvas.pixel(300, 100), Some(LED_OFF_COLOR));
        assert_eq!(canvas.pixel(10, 10), Some(BACKGROUND_COLOR));
    }

    #[test]
    fn test_hand_drawn_only_outside_slide_mode() {
        let hand = Hand::new([Keypoint::new(100.0, 100.0); HandKeypointIndex::COUNT]);
        let hands = [hand];
        let status = DeviceStatus::default();
        let mut view = StatusView::new(800, 700);

        let canvas = view.draw(&state(&hands, &status, false));
        assert_eq!(canvas.pixel(180, 340), Some(KEYPOINT_COLOR));

        let canvas = view.draw(&state(&hands, &status, true));
        assert_eq!(canvas.pixel(180, 340), Some(VIDEO_AREA_COLOR));
        assert_eq!(canvas.pixel(400, 30), Some(WHITE_COLOR));
    }

    #[test]
    fn test_far_keypoints_do_not_overflow() {
        let mut keypoints = [Keypoint::new(100.0, 100.0); HandKeypointIndex::COUNT];
        keypoints[HandKeypointIndex::IndexTip as usize] = Keypoint::new(3e9, 3e9);
        keypoints[HandKeypointIndex::Wrist as usize] = Keypoint::new(-3e9, f32::NAN);
        let hands = [Hand::new(keypoints)];
        let status = DeviceStatus::default();
        let mut view = StatusView::new(800, 700);
        let canvas = view.draw(&state(&hands, &status, false));
        assert_eq!(canvas.pixel(180, 340), Some(KEYPOINT_COLOR));
    }

    #[test]
    fn test_slider_fraction() {
        assert_eq!(slider_fraction(500, 500, 5000, 100), 0);
        assert_eq!(slider_fraction(5000, 500, 5000, 100), 100);
        assert_eq!(slider_fraction(2750, 500, 5000, 100), 50);
        assert_eq!(slider_fraction(10, 500, 500, 100), 100);
    }

    #[test]
    fn test_mode_swatch() {
        let mut status = DeviceStatus::default();
        status.apply_line("M:EMERGENCY");
        let mut view = StatusView::new(800, 700);
        let canvas = view.draw(&state(&[], &status, false));
        assert_eq!(canvas.pixel(170, 30), Some(RED_COLOR));
    }
}
