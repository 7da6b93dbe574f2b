use std::time::Duration;

use crate::config::DeviceConfig;
use crate::protocol::{DeviceReport, HostCommand, Light, Mode, ProtocolError, Timings};

/// digitalWrite(HIGH) 相当の出力レベル
pub const LEVEL_HIGH: u8 = 255;

/// 1ループ分の動作を構成する手順
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// LED出力の変更（0 = 消灯）
    Led { light: Light, level: u8 },
    /// ホストへの報告行
    Report(DeviceReport),
    /// 待機
    Hold(Duration),
}

/// 本体ボタン
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Emergency,
    Blinking,
    Power,
}

/// 信号機コントローラの状態
#[derive(Debug, Clone)]
pub struct TrafficLight {
    mode: Mode,
    emergency: bool,
    blinking: bool,
    power: bool,
    was_off: bool,
    brightness: i32,
    timings: Timings,
    leds: [u8; 3],
    potentiometer: Option<u16>,
    loop_delay: Duration,
    blink_delay: Duration,
    green_flash: Duration,
    green_flashes: u32,
}

impl TrafficLight {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            mode: Mode::Normal,
            emergency: false,
            blinking: false,
            power: true,
            was_off: false,
            brightness: 0,
            timings: Timings::default(),
            leds: [0; 3],
            potentiometer: config.potentiometer,
            loop_delay: Duration::from_millis(config.loop_delay_ms),
            blink_delay: Duration::from_millis(config.blink_delay_ms),
            green_flash: Duration::from_millis(config.green_flash_ms),
            green_flashes: config.green_flashes,
        }
    }

    /// 初期の点灯時間を指定する
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_powered(&self) -> bool {
        self.power
    }

    pub fn brightness(&self) -> i32 {
        self.brightness
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    pub fn led_level(&self, light: Light) -> u8 {
        self.leds[light_slot(light)]
    }

    pub fn set_potentiometer(&mut self, value: Option<u16>) {
        self.potentiometer = value;
    }

    /// シリアルで受信した1行を処理する
    pub fn handle_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        match HostCommand::parse(line)? {
            HostCommand::Brightness(value) => self.brightness = value,
            HostCommand::Duration { light, ms } => *self.timings.get_mut(light) = ms,
            HostCommand::Mode(mode) => {
                self.mode = mode;
                self.emergency = mode == Mode::Emergency;
                self.blinking = mode == Mode::Blinking;
                self.power = mode != Mode::Off;
            }
        }
        Ok(())
    }

    pub fn press(&mut self, button: Button) {
        match button {
            Button::Emergency => self.press_emergency(),
            Button::Blinking => self.press_blinking(),
            Button::Power => self.press_power(),
        }
    }

    pub fn press_emergency(&mut self) {
        self.emergency = !self.emergency;
        if self.emergency {
            self.mode = Mode::Emergency;
            self.blinking = false;
        } else {
            self.mode = Mode::Normal;
        }
    }

    pub fn press_blinking(&mut self) {
        self.blinking = !self.blinking;
        if self.blinking {
            self.mode = Mode::Blinking;
            self.emergency = false;
        } else {
            self.mode = Mode::Normal;
        }
    }

    pub fn press_power(&mut self) {
        self.power = !self.power;
        if self.power {
            self.emergency = false;
            self.blinking = false;
            self.mode = Mode::Normal;
        } else {
            self.mode = Mode::Off;
        }
    }

    /// メインループ1回分の手順を生成し、状態を更新する
    pub fn run_iteration(&mut self) -> Vec<Step> {
        let mut steps = Vec::new();

        if let Some(pot) = self.potentiometer {
            self.brightness = i32::from(pot);
        }
        steps.push(Step::Report(DeviceReport::Brightness(self.brightness)));
        steps.push(Step::Report(DeviceReport::Mode(self.mode.to_string())));

        if self.power {
            if self.was_off {
                self.was_off = false;
                for light in Light::ALL {
                    self.set_led(&mut steps, light, 0);
                }
            }

            match self.mode {
                Mode::Emergency => {
                    self.set_led(&mut steps, Light::Red, LEVEL_HIGH);
                    self.set_led(&mut steps, Light::Yellow, 0);
                    self.set_led(&mut steps, Light::Green, 0);
                    for (light, on) in [(Light::Red, true), (Light::Yellow, false), (Light::Green, false)] {
                        steps.push(Step::Report(DeviceReport::Led { light, on }));
                    }
                }
                Mode::Blinking => {
                    for light in Light::ALL {
                        let level = if self.led_level(light) > 0 { 0 } else { LEVEL_HIGH };
                        self.set_led(&mut steps, light, level);
                    }
                    for light in Light::ALL {
                        let on = self.led_level(light) > 0;
                        steps.push(Step::Report(DeviceReport::Led { light, on }));
                    }
                    steps.push(Step::Hold(self.blink_delay));
                }
                _ => self.traffic_cycle(&mut steps),
            }
        } else {
            for light in Light::ALL {
                self.set_led(&mut steps, light, 0);
            }
            for light in Light::ALL {
                steps.push(Step::Report(DeviceReport::Led { light, on: false }));
            }
            self.was_off = true;
        }

        steps.push(Step::Hold(self.loop_delay));
        steps
    }

    /// 通常モード: 赤 → 黄 → 緑 → 緑点滅 → 黄
    fn traffic_cycle(&mut self, steps: &mut Vec<Step>) {
        let level = self.brightness.clamp(0, i32::from(LEVEL_HIGH)) as u8;
        let timings = self.timings;

        self.light_for(steps, Light::Red, level, timings.red);
        self.light_for(steps, Light::Yellow, level, timings.yellow);

        self.set_led(steps, Light::Green, level);
        steps.push(Step::Report(DeviceReport::Led { light: Light::Green, on: true }));
        steps.push(Step::Hold(Duration::from_millis(u64::from(timings.green))));
        for _ in 0..self.green_flashes {
            self.set_led(steps, Light::Green, 0);
            steps.push(Step::Report(DeviceReport::Led { light: Light::Green, on: false }));
            steps.push(Step::Hold(self.green_flash));
            self.set_led(steps, Light::Green, level);
            steps.push(Step::Report(DeviceReport::Led { light: Light::Green, on: true }));
            steps.push(Step::Hold(self.green_flash));
        }
        self.set_led(steps, Light::Green, 0);
        steps.push(Step::Report(DeviceReport::Led { light: Light::Green, on: false }));

        self.light_for(steps, Light::Yellow, level, timings.yellow);
    }

    fn light_for(&mut self, steps: &mut Vec<Step>, light: Light, level: u8, ms: u32) {
        self.set_led(steps, light, level);
        steps.push(Step::Report(DeviceReport::Led { light, on: true }));
        steps.push(Step::Hold(Duration::from_millis(u64::from(ms))));
        self.set_led(steps, light, 0);
        steps.push(Step::Report(DeviceReport::Led { light, on: false }));
    }

    fn set_led(&mut self, steps: &mut Vec<Step>, light: Light, level: u8) {
        self.leds[light_slot(light)] = level;
        steps.push(Step::Led { light, level });
    }
}

fn light_slot(light: Light) -> usize {
    match light {
        Light::Red => 0,
        Light::Yellow => 1,
        Light::Green => 2,
    }
}
