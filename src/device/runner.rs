use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::device::firmware::{Button, Step, TrafficLight};

/// 信号機への入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceInput {
    /// シリアル受信行
    Line(String),
    Button(Button),
    Potentiometer(Option<u16>),
}

/// 待機中に停止フラグを確認する間隔
const STOP_POLL: Duration = Duration::from_millis(10);

/// TrafficLight の手順を実時間で再生する。
///
/// 入力はループ先頭でのみ処理する（サイクル途中のコマンドは次のループで反映）。
pub struct DeviceRunner {
    light: TrafficLight,
    input: Receiver<DeviceInput>,
    output: Sender<String>,
    running: Arc<AtomicBool>,
}

impl DeviceRunner {
    pub fn new(
        light: TrafficLight,
        input: Receiver<DeviceInput>,
        output: Sender<String>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self { light, input, output, running }
    }

    /// 別スレッドで実行する
    pub fn spawn(self) -> thread::JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    pub fn run(mut self) {
        log::info!("traffic light simulator started");
        while self.running.load(Ordering::Acquire) {
            if !self.drain_input() {
                break;
            }
            let steps = self.light.run_iteration();
            if !self.play(&steps) {
                break;
            }
        }
        log::info!("traffic light simulator stopped");
    }

    /// 溜まっている入力を全て処理する。入力側が閉じられたら false
    fn drain_input(&mut self) -> bool {
        loop {
            match self.input.try_recv() {
                Ok(DeviceInput::Line(line)) => {
                    if let Err(e) = self.light.handle_line(&line) {
                        log::debug!("ignored serial input: {}", e);
                    }
                }
                Ok(DeviceInput::Button(button)) => {
                    self.light.press(button);
                    log::info!("button {:?} -> mode {}", button, self.light.mode());
                }
                Ok(DeviceInput::Potentiometer(value)) => self.light.set_potentiometer(value),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// 手順を再生する。出力先が閉じられたか停止されたら false
    fn play(&self, steps: &[Step]) -> bool {
        for step in steps {
            match step {
                Step::Led { .. } => {}
                Step::Report(report) => {
                    if self.output.send(report.encode()).is_err() {
                        return false;
                    }
                }
                Step::Hold(duration) => {
                    if !self.hold(*duration) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn hold(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if !self.running.load(Ordering::Acquire) {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(STOP_POLL));
        }
    }
}
