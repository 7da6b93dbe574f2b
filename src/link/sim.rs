use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::device::{Button, DeviceInput, DeviceRunner, TrafficLight};
use crate::link::Link;

/// プロセス内の信号機シミュレータにつながるリンク
pub struct SimLink {
    input: Sender<DeviceInput>,
    output: Receiver<String>,
    running: Arc<AtomicBool>,
}

impl SimLink {
    pub fn from_light(light: TrafficLight) -> Self {
        let (in_tx, in_rx) = mpsc::channel();
        let (out_tx, out_rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        DeviceRunner::new(light, in_rx, out_tx, running.clone()).spawn();
        Self {
            input: in_tx,
            output: out_rx,
            running,
        }
    }
}

impl Link for SimLink {
    fn name(&self) -> &str {
        "sim"
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.input
            .send(DeviceInput::Line(line.to_string()))
            .map_err(|_| anyhow::anyhow!("simulator stopped"))
    }

    fn poll_lines(&mut self) -> Vec<String> {
        self.output.try_iter().collect()
    }

    fn press(&mut self, button: Button) -> Result<()> {
        self.input
            .send(DeviceInput::Button(button))
            .map_err(|_| anyhow::anyhow!("simulator stopped"))
    }
}

impl Drop for SimLink {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
