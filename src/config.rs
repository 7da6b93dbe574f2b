use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::protocol::Timings;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub hands: HandsConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// メインループのFPS上限
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// 接続先: "auto" (最初に見つかったポート), "sim" (内蔵シミュレータ), またはポートパス
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// 起動時に接続するか
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    /// 読み込みタイムアウト（ミリ秒）
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HandsConfig {
    /// 手検出プロセスのコマンドライン。空なら標準入力からJSON行を読む
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default = "default_max_hands")]
    pub max_hands: usize,
    /// 手のスコア閾値
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    /// 検出プロセスが正規化座標 (0.0〜1.0) を出力する場合 true
    #[serde(default)]
    pub normalized: bool,
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GestureConfig {
    /// 「最上部」「最下部」判定の許容誤差（ピクセル）
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// スライドモードで1フレームあたりに増減する時間（ミリ秒）
    #[serde(default = "default_slide_delta")]
    pub slide_delta: u32,
    #[serde(default = "default_time_min")]
    pub time_min: u32,
    #[serde(default = "default_time_max")]
    pub time_max: u32,
    /// スライダーの刻み（ミリ秒）
    #[serde(default = "default_slider_step")]
    pub slider_step: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_red")]
    pub red: u32,
    #[serde(default = "default_yellow")]
    pub yellow: u32,
    #[serde(default = "default_green")]
    pub green: u32,
}

/// 信号機シミュレータの設定
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    /// ループ末尾の待機（ミリ秒）
    #[serde(default = "default_loop_delay_ms")]
    pub loop_delay_ms: u64,
    /// 点滅モードの追加待機（ミリ秒）
    #[serde(default = "default_blink_delay_ms")]
    pub blink_delay_ms: u64,
    /// 緑点滅の半周期（ミリ秒）
    #[serde(default = "default_green_flash_ms")]
    pub green_flash_ms: u64,
    #[serde(default = "default_green_flashes")]
    pub green_flashes: u32,
    /// 可変抵抗の値。None なら B: コマンドで設定された明るさを使う
    #[serde(default)]
    pub potentiometer: Option<u16>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    /// ステータスウィンドウ表示
    #[serde(default)]
    pub view: bool,
    #[serde(default = "default_canvas_width")]
    pub width: usize,
    #[serde(default = "default_canvas_height")]
    pub height: usize,
}

fn default_true() -> bool { true }
fn default_target_fps() -> u32 { 60 }
fn default_port() -> String { "auto".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_read_timeout_ms() -> u64 { 50 }
fn default_max_hands() -> usize { 2 }
fn default_min_score() -> f32 { 0.5 }
fn default_frame_width() -> u32 { 640 }
fn default_frame_height() -> u32 { 480 }
fn default_threshold() -> f32 { 10.0 }
fn default_slide_delta() -> u32 { 50 }
fn default_time_min() -> u32 { 500 }
fn default_time_max() -> u32 { 5000 }
fn default_slider_step() -> u32 { 10 }
fn default_red() -> u32 { 2000 }
fn default_yellow() -> u32 { 500 }
fn default_green() -> u32 { 2000 }
fn default_loop_delay_ms() -> u64 { 500 }
fn default_blink_delay_ms() -> u64 { 500 }
fn default_green_flash_ms() -> u64 { 166 }
fn default_green_flashes() -> u32 { 3 }
fn default_canvas_width() -> usize { 800 }
fn default_canvas_height() -> usize { 700 }

impl Default for AppConfig {
    fn default() -> Self {
        Self { target_fps: default_target_fps() }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            auto_connect: default_true(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for HandsConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            max_hands: default_max_hands(),
            min_score: default_min_score(),
            normalized: false,
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            slide_delta: default_slide_delta(),
            time_min: default_time_min(),
            time_max: default_time_max(),
            slider_step: default_slider_step(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            red: default_red(),
            yellow: default_yellow(),
            green: default_green(),
        }
    }
}

impl TimingConfig {
    pub fn timings(&self) -> Timings {
        Timings::new(self.red, self.yellow, self.green)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            loop_delay_ms: default_loop_delay_ms(),
            blink_delay_ms: default_blink_delay_ms(),
            green_flash_ms: default_green_flash_ms(),
            green_flashes: default_green_flashes(),
            potentiometer: None,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            view: false,
            width: default_canvas_width(),
            height: default_canvas_height(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 読み込みに失敗したらデフォルト設定を使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "config {} not loaded ({:#}), using defaults",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.gesture;
        if g.time_min > g.time_max {
            anyhow::bail!("gesture.time_min ({}) > gesture.time_max ({})", g.time_min, g.time_max);
        }
        if g.threshold < 0.0 {
            anyhow::bail!("gesture.threshold must not be negative");
        }
        if self.app.target_fps == 0 {
            anyhow::bail!("app.target_fps must be positive");
        }
        if self.serial.baud_rate == 0 {
            anyhow::bail!("serial.baud_rate must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.serial.port, "auto");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.hands.max_hands, 2);
        assert_eq!(config.gesture.threshold, 10.0);
        assert_eq!(config.gesture.slide_delta, 50);
        assert_eq!(config.timing.timings(), Timings::new(2000, 500, 2000));
        assert_eq!(config.device.green_flashes, 3);
        assert!(!config.debug.view);
    }

    #[test]
    fn test_partial_section() {
        let config = Config::parse(
            r#"
            [serial]
            port = "sim"

            [gesture]
            threshold = 15.0
            "#,
        )
        .unwrap();
        assert_eq!(config.serial.port, "sim");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.gesture.threshold, 15.0);
        assert_eq!(config.gesture.time_max, 5000);
    }

    #[test]
    fn test_hand_command() {
        let config = Config::parse(
            r#"
            [hands]
            command = ["python3", "hand_detect.py"]
            normalized = true
            "#,
        )
        .unwrap();
        assert_eq!(config.hands.command, vec!["python3", "hand_detect.py"]);
        assert!(config.hands.normalized);
    }

    #[test]
    fn test_invalid_range_rejected() {
        let result = Config::parse(
            r#"
            [gesture]
            time_min = 6000
            time_max = 5000
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.app.target_fps, 60);
    }
}
