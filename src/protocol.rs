//! Line protocol between the host and the traffic light controller.
//!
//! Every message is one ASCII line terminated by `\n`.
//! Host → device: `MODE:<mode>`, `R:<ms>`, `Y:<ms>`, `G:<ms>`, `B:<value>`.
//! Device → host: `B:<value>`, `M:<mode>`, `R1`/`R0`, `Y1`/`Y0`, `G1`/`G0`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,
    #[error("unknown mode: {0}")]
    UnknownMode(String),
    #[error("invalid number in {0:?}")]
    InvalidNumber(String),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// 信号機の動作モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Normal,
    Emergency,
    Blinking,
    Off,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Normal, Mode::Emergency, Mode::Blinking, Mode::Off];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Emergency => "EMERGENCY",
            Mode::Blinking => "BLINKING",
            Mode::Off => "OFF",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownMode(s.to_string()))
    }
}

/// 信号の色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Light {
    Red,
    Yellow,
    Green,
}

impl Light {
    pub const ALL: [Light; 3] = [Light::Red, Light::Yellow, Light::Green];

    /// プロトコル上の1文字プレフィックス
    pub fn prefix(&self) -> char {
        match self {
            Light::Red => 'R',
            Light::Yellow => 'Y',
            Light::Green => 'G',
        }
    }

    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            'R' => Some(Light::Red),
            'Y' => Some(Light::Yellow),
            'G' => Some(Light::Green),
            _ => None,
        }
    }
}

/// 各色の点灯時間（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
}

impl Timings {
    pub fn new(red: u32, yellow: u32, green: u32) -> Self {
        Self { red, yellow, green }
    }

    pub fn get(&self, light: Light) -> u32 {
        match light {
            Light::Red => self.red,
            Light::Yellow => self.yellow,
            Light::Green => self.green,
        }
    }

    pub fn get_mut(&mut self, light: Light) -> &mut u32 {
        match light {
            Light::Red => &mut self.red,
            Light::Yellow => &mut self.yellow,
            Light::Green => &mut self.green,
        }
    }

    /// R:, Y:, G: の3コマンド
    pub fn commands(&self) -> [HostCommand; 3] {
        Light::ALL.map(|light| HostCommand::Duration { light, ms: self.get(light) })
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self::new(2000, 500, 2000)
    }
}

/// ホストから信号機への命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Mode(Mode),
    Duration { light: Light, ms: u32 },
    Brightness(i32),
}

impl HostCommand {
    /// 改行なしの1行
    pub fn encode(&self) -> String {
        match self {
            HostCommand::Mode(mode) => format!("MODE:{}", mode),
            HostCommand::Duration { light, ms } => format!("{}:{}", light.prefix(), ms),
            HostCommand::Brightness(value) => format!("B:{}", value),
        }
    }

    /// 信号機側のパース。前後の空白は無視する
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        if let Some(rest) = line.strip_prefix("MODE:") {
            return Ok(HostCommand::Mode(rest.parse()?));
        }
        if let Some(rest) = line.strip_prefix("B:") {
            let value = rest
                .trim()
                .parse()
                .map_err(|_| ProtocolError::InvalidNumber(line.to_string()))?;
            return Ok(HostCommand::Brightness(value));
        }

        let mut chars = line.chars();
        if let (Some(c), Some(':')) = (chars.next(), chars.next()) {
            if let Some(light) = Light::from_prefix(c) {
                let ms = chars
                    .as_str()
                    .trim()
                    .parse()
                    .map_err(|_| ProtocolError::InvalidNumber(line.to_string()))?;
                return Ok(HostCommand::Duration { light, ms });
            }
        }

        Err(ProtocolError::UnknownCommand(line.to_string()))
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// 信号機から送られる1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceReport {
    Brightness(i32),
    Mode(String),
    Led { light: Light, on: bool },
}

impl DeviceReport {
    pub fn encode(&self) -> String {
        match self {
            DeviceReport::Brightness(value) => format!("B:{}", value),
            DeviceReport::Mode(mode) => format!("M:{}", mode),
            DeviceReport::Led { light, on } => format!("{}{}", light.prefix(), u8::from(*on)),
        }
    }
}

/// ホスト側で保持する信号機の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub brightness: i32,
    pub mode: String,
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
    /// 最後に受信した行
    pub last_line: Option<String>,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            brightness: 0,
            mode: Mode::Normal.to_string(),
            red: false,
            yellow: false,
            green: false,
            last_line: None,
        }
    }
}

impl DeviceStatus {
    pub fn led(&self, light: Light) -> bool {
        match light {
            Light::Red => self.red,
            Light::Yellow => self.yellow,
            Light::Green => self.green,
        }
    }

    /// 受信行を反映する。
    ///
    /// 部分一致で判定する: `B:` を含めばその後ろの整数を明るさに、`M:` を含めば
    /// `,` までをモード名にする。`R1` なら赤点灯、そうでなく `R0` なら消灯（黄・緑も同様）。
    /// 解釈できない部分は無視する。
    pub fn apply_line(&mut self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        self.last_line = Some(line.to_string());

        if let Some((_, rest)) = line.split_once("B:") {
            if let Some(value) = parse_leading_int(rest) {
                self.brightness = value;
            }
        }
        if let Some((_, rest)) = line.split_once("M:") {
            let mode = rest.split(',').next().unwrap_or_default();
            self.mode = mode.to_string();
        }

        for light in Light::ALL {
            let on = format!("{}1", light.prefix());
            let off = format!("{}0", light.prefix());
            let state = match light {
                Light::Red => &mut self.red,
                Light::Yellow => &mut self.yellow,
                Light::Green => &mut self.green,
            };
            if line.contains(&on) {
                *state = true;
            } else if line.contains(&off) {
                *state = false;
            }
        }
    }
}

/// 先頭の空白と符号を許して整数部分だけを読む。数字がなければ None
fn parse_leading_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i32>().ok().map(|v| sign * v)
}
