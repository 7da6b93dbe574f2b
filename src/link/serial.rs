use anyhow::{Context, Result};
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serialport::SerialPort;

use crate::link::{Link, LineBuffer};

/// 使用可能な最初のシリアルポート
pub fn first_available_port() -> Option<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().next().map(|p| p.port_name),
        Err(e) => {
            log::warn!("failed to enumerate serial ports: {}", e);
            None
        }
    }
}

/// serialport を使ったリンク。受信は別スレッドで行単位に分割する
pub struct SerialLink {
    name: String,
    port: Box<dyn SerialPort>,
    lines: Receiver<String>,
    running: Arc<AtomicBool>,
    _handle: thread::JoinHandle<()>,
}

impl SerialLink {
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .with_context(|| format!("failed to open serial port {}", path))?;
        let mut reader = port
            .try_clone()
            .context("failed to clone serial port for reading")?;

        let (tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let running_ref = running.clone();
        let name = path.to_string();
        let thread_name = name.clone();

        let handle = thread::spawn(move || {
            let mut buffer = LineBuffer::new();
            let mut chunk = [0u8; 256];
            while running_ref.load(Ordering::Acquire) {
                match reader.read(&mut chunk) {
                    Ok(0) => {}
                    Ok(n) => {
                        for line in buffer.push(&chunk[..n]) {
                            if tx.send(line).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::TimedOut => {}
                    Err(e) => {
                        log::warn!("[{}] read error: {}", thread_name, e);
                        break;
                    }
                }
            }
        });

        log::info!("serial port {} opened at {} baud", path, baud_rate);
        Ok(Self {
            name,
            port,
            lines: rx,
            running,
            _handle: handle,
        })
    }
}

impl Link for SerialLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\n")?;
        self.port.flush()?;
        Ok(())
    }

    fn poll_lines(&mut self) -> Vec<String> {
        self.lines.try_iter().collect()
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        // 読み込みスレッドはタイムアウトごとにフラグを確認して終了する
        self.running.store(false, Ordering::Release);
    }
}
