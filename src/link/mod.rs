pub mod serial;
pub mod sim;

use anyhow::{Context, Result};
use std::time::Duration;

use crate::config::{Config, DeviceConfig, SerialConfig};
use crate::device::{Button, TrafficLight};
use crate::protocol::{HostCommand, Timings};

pub use serial::SerialLink;
pub use sim::SimLink;

/// 行単位の双方向リンク
pub trait Link: Send {
    /// ログ表示用の名前
    fn name(&self) -> &str;

    /// 改行を付けて1行送信する
    fn write_line(&mut self, line: &str) -> Result<()>;

    /// これまでに受信した完全な行を全て取り出す
    fn poll_lines(&mut self) -> Vec<String>;

    /// 本体ボタン。シミュレータ以外では使えない
    fn press(&mut self, button: Button) -> Result<()> {
        anyhow::bail!("{} has no buttons (pressed {:?})", self.name(), button)
    }
}

/// 改行が来ないまま溜められる最大バイト数
pub const MAX_LINE_BYTES: usize = 1024;

/// 受信バイト列を行に分割する
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// 長すぎる行を次の改行まで捨てている
    discarding: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// バイト列を追加し、完成した行を返す（`\r` は除去）。
    ///
    /// `MAX_LINE_BYTES` を超えた行は次の改行まで丸ごと捨てる。
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == b'\n' {
                let raw = std::mem::take(&mut self.pending);
                if std::mem::take(&mut self.discarding) {
                    continue;
                }
                let line = String::from_utf8_lossy(&raw);
                lines.push(line.trim_end_matches('\r').to_string());
            } else if self.discarding {
                continue;
            } else if self.pending.len() >= MAX_LINE_BYTES {
                log::warn!("line longer than {} bytes dropped", MAX_LINE_BYTES);
                self.pending.clear();
                self.discarding = true;
            } else {
                self.pending.push(b);
            }
        }
        lines
    }
}

/// 接続先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// 最初に見つかったシリアルポート
    Auto,
    /// 内蔵シミュレータ
    Sim,
    Port(String),
}

impl LinkTarget {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "auto" => LinkTarget::Auto,
            "sim" => LinkTarget::Sim,
            path => LinkTarget::Port(path.to_string()),
        }
    }
}

/// 接続の開閉を管理する
pub struct Connection {
    target: LinkTarget,
    baud_rate: u32,
    timeout: Duration,
    device: DeviceConfig,
    /// シミュレータの初期点灯時間
    timings: Timings,
    link: Option<Box<dyn Link>>,
}

impl Connection {
    pub fn new(serial: &SerialConfig, device: &DeviceConfig) -> Self {
        Self {
            target: LinkTarget::parse(&serial.port),
            baud_rate: serial.baud_rate,
            timeout: Duration::from_millis(serial.read_timeout_ms),
            device: device.clone(),
            timings: Timings::default(),
            link: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.serial, &config.device).with_timings(config.timing.timings())
    }

    /// シミュレータ接続時の初期点灯時間
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// 既に開いているリンクを使う
    pub fn with_link(link: Box<dyn Link>) -> Self {
        let mut connection = Self::new(&SerialConfig::default(), &DeviceConfig::default());
        connection.link = Some(link);
        connection
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.link.as_ref().map(|l| l.name())
    }

    pub fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        let link: Box<dyn Link> = match &self.target {
            LinkTarget::Sim => Box::new(SimLink::from_light(self.sim_light())),
            LinkTarget::Port(path) => Box::new(SerialLink::open(path, self.baud_rate, self.timeout)?),
            LinkTarget::Auto => {
                let path = serial::first_available_port()
                    .context("no serial port available")?;
                Box::new(SerialLink::open(&path, self.baud_rate, self.timeout)?)
            }
        };
        log::info!("connected to {}", link.name());
        self.link = Some(link);
        Ok(())
    }

    fn sim_light(&self) -> TrafficLight {
        TrafficLight::new(&self.device).with_timings(self.timings)
    }

    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            log::info!("disconnected from {}", link.name());
        }
    }

    /// 開いていれば閉じ、閉じていれば開く。開いた状態なら true
    pub fn toggle(&mut self) -> Result<bool> {
        if self.is_open() {
            self.close();
        } else {
            self.open()?;
        }
        Ok(self.is_open())
    }

    /// 開いていなければ何もしない。書き込みに失敗したら接続を閉じる
    pub fn send(&mut self, command: &HostCommand) -> Result<()> {
        let Some(link) = self.link.as_mut() else {
            return Ok(());
        };
        if let Err(e) = link.write_line(&command.encode()) {
            log::warn!("write to {} failed, closing", link.name());
            self.link = None;
            return Err(e);
        }
        log::debug!("sent {}", command);
        Ok(())
    }

    pub fn send_all(&mut self, commands: &[HostCommand]) -> Result<()> {
        for command in commands {
            self.send(command)?;
        }
        Ok(())
    }

    pub fn poll_lines(&mut self) -> Vec<String> {
        self.link.as_mut().map(|l| l.poll_lines()).unwrap_or_default()
    }

    /// 接続先の本体ボタンを押す
    pub fn press(&mut self, button: Button) -> Result<()> {
        let link = self.link.as_mut().context("not connected")?;
        link.press(button)?;
        log::info!("pressed {:?} on {}", button, link.name());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// 送信行を記録し、事前に積んだ行を返すリンク
    #[derive(Clone, Default)]
    pub struct RecordingLink {
        pub written: Arc<Mutex<Vec<String>>>,
        pub incoming: Arc<Mutex<Vec<String>>>,
        pub fail_writes: bool,
    }

    impl Link for RecordingLink {
        fn name(&self) -> &str {
            "recording"
        }

        fn write_line(&mut self, line: &str) -> Result<()> {
            if self.fail_writes {
                anyhow::bail!("device unplugged");
            }
            self.written.lock().unwrap().push(line.to_string());
            Ok(())
        }

        fn poll_lines(&mut self) -> Vec<String> {
            std::mem::take(&mut *self.incoming.lock().unwrap())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingLink;
    use super::*;
    use crate::protocol::{Light, Mode};

    #[test]
    fn test_line_buffer_split() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"B:12").is_empty());
        assert_eq!(buf.push(b"3\r\nM:NOR"), vec!["B:123"]);
        assert_eq!(buf.push(b"MAL\nR1\n"), vec!["M:NORMAL", "R1"]);
    }

    #[test]
    fn test_line_buffer_drops_overlong_line() {
        let mut buf = LineBuffer::new();
        let noise = vec![b'x'; MAX_LINE_BYTES * 3];
        assert!(buf.push(&noise).is_empty());
        assert!(buf.pending.len() <= MAX_LINE_BYTES);
        // 長すぎた行の残りは捨て、次の行から再開する
        assert_eq!(buf.push(b"xx\nM:OFF\n"), vec!["M:OFF"]);
        assert!(buf.pending.is_empty());
    }

    #[test]
    fn test_line_buffer_invalid_utf8() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(&[0xff, b'R', b'1', b'\n']);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("R1"));
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(LinkTarget::parse("auto"), LinkTarget::Auto);
        assert_eq!(LinkTarget::parse(""), LinkTarget::Auto);
        assert_eq!(LinkTarget::parse("sim"), LinkTarget::Sim);
        assert_eq!(
            LinkTarget::parse("/dev/ttyACM0"),
            LinkTarget::Port("/dev/ttyACM0".to_string())
        );
    }

    #[test]
    fn test_send_writes_encoded_line() {
        let link = RecordingLink::default();
        let written = link.written.clone();
        let mut conn = Connection::with_link(Box::new(link));
        conn.send(&HostCommand::Mode(Mode::Blinking)).unwrap();
        conn.send(&HostCommand::Duration { light: Light::Green, ms: 1200 }).unwrap();
        assert_eq!(*written.lock().unwrap(), vec!["MODE:BLINKING", "G:1200"]);
    }

    #[test]
    fn test_send_when_closed_is_noop() {
        let mut conn = Connection::new(&SerialConfig::default(), &DeviceConfig::default());
        assert!(!conn.is_open());
        conn.send(&HostCommand::Mode(Mode::Off)).unwrap();
        assert!(conn.poll_lines().is_empty());
    }

    #[test]
    fn test_write_failure_closes() {
        let link = RecordingLink { fail_writes: true, ..Default::default() };
        let mut conn = Connection::with_link(Box::new(link));
        assert!(conn.send(&HostCommand::Mode(Mode::Off)).is_err());
        assert!(!conn.is_open());
    }

    #[test]
    fn test_toggle_closes_open_link() {
        let mut conn = Connection::with_link(Box::new(RecordingLink::default()));
        assert_eq!(conn.name(), Some("recording"));
        assert!(!conn.toggle().unwrap());
        assert!(!conn.is_open());
    }

    #[test]
    fn test_sim_connection_reports_status() {
        let serial = SerialConfig { port: "sim".to_string(), ..SerialConfig::default() };
        let mut conn = Connection::new(&serial, &DeviceConfig::default());
        assert!(conn.toggle().unwrap());
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        let mut lines = Vec::new();
        while lines.is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            lines = conn.poll_lines();
        }
        assert_eq!(lines.first().map(String::as_str), Some("B:0"));
        conn.close();
    }

    #[test]
    fn test_sim_uses_configured_timings() {
        let config = Config::parse(
            r#"
            [timing]
            red = 3000
            yellow = 800
            green = 1500
            "#,
        )
        .unwrap();
        let conn = Connection::from_config(&config);
        assert_eq!(conn.sim_light().timings(), Timings::new(3000, 800, 1500));
    }

    #[test]
    fn test_press_requires_simulator() {
        let mut conn = Connection::new(&SerialConfig::default(), &DeviceConfig::default());
        assert!(conn.press(Button::Power).is_err());
        let mut conn = Connection::with_link(Box::new(RecordingLink::default()));
        assert!(conn.press(Button::Power).is_err());
        assert!(conn.is_open());
    }

    #[test]
    fn test_sim_button_press() {
        let serial = SerialConfig { port: "sim".to_string(), ..SerialConfig::default() };
        let device = DeviceConfig { loop_delay_ms: 1, green_flash_ms: 1, ..DeviceConfig::default() };
        let mut conn = Connection::new(&serial, &device).with_timings(Timings::new(1, 1, 1));
        conn.open().unwrap();
        conn.press(Button::Power).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let mut seen = false;
        while !seen && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            seen = conn.poll_lines().iter().any(|l| l == "M:OFF");
        }
        assert!(seen);
    }
}
