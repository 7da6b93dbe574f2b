use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::hand::detector::HandDetector;
use crate::hand::keypoint::Hand;

/// 検出結果の入力元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandInput {
    /// 外部プロセスを起動してその標準出力を読む
    Command(Vec<String>),
    /// 自プロセスの標準入力を読む
    Stdin,
}

impl HandInput {
    pub fn from_command(command: &[String]) -> Self {
        if command.is_empty() {
            HandInput::Stdin
        } else {
            HandInput::Command(command.to_vec())
        }
    }
}

struct Shared {
    latest: Mutex<Option<Vec<Hand>>>,
    frame_id: AtomicU64,
    detecting: AtomicBool,
    finished: AtomicBool,
}

impl Shared {
    /// 検出中なら最新フレームを差し替える。
    ///
    /// `detecting` の確認と変更はどちらも `latest` のロック内で行う。
    fn publish(&self, hands: Vec<Hand>) -> bool {
        let Ok(mut latest) = self.latest.lock() else {
            return false;
        };
        if !self.detecting.load(Ordering::Acquire) {
            return false;
        }
        *latest = Some(hands);
        self.frame_id.fetch_add(1, Ordering::Release);
        true
    }
}

/// 別スレッドで検出結果を読み、最新フレームを提供する
pub struct ThreadedHandSource {
    shared: Arc<Shared>,
    child: Option<Child>,
    _handle: thread::JoinHandle<()>,
}

impl ThreadedHandSource {
    pub fn start(input: HandInput, detector: HandDetector) -> Result<Self> {
        match input {
            HandInput::Stdin => {
                log::info!("reading hand keypoints from stdin");
                Ok(Self::from_reader(BufReader::new(std::io::stdin()), detector))
            }
            HandInput::Command(command) => {
                let (program, args) = command
                    .split_first()
                    .context("empty hand detector command")?;
                log::info!("starting hand detector: {}", command.join(" "));
                let mut child = Command::new(program)
                    .args(args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::inherit())
                    .spawn()
                    .with_context(|| format!("failed to start hand detector {:?}", program))?;
                let stdout = child.stdout.take().context("failed to get detector stdout")?;
                let mut source = Self::from_reader(BufReader::new(stdout), detector);
                source.child = Some(child);
                Ok(source)
            }
        }
    }

    /// 任意の行入力から読む
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R, detector: HandDetector) -> Self {
        let shared = Arc::new(Shared {
            latest: Mutex::new(None),
            frame_id: AtomicU64::new(0),
            detecting: AtomicBool::new(true),
            finished: AtomicBool::new(false),
        });
        let shared_ref = shared.clone();

        let handle = thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        log::warn!("hand detector read error: {}", e);
                        break;
                    }
                };
                if !shared_ref.detecting.load(Ordering::Acquire) {
                    continue;
                }
                if let Some(hands) = detector.parse_line(&line) {
                    shared_ref.publish(hands);
                }
            }
            log::info!("hand detector stream closed");
            shared_ref.finished.store(true, Ordering::Release);
        });

        Self {
            shared,
            child: None,
            _handle: handle,
        }
    }

    /// 新フレームが到着するたびにインクリメントされる
    pub fn frame_id(&self) -> u64 {
        self.shared.frame_id.load(Ordering::Acquire)
    }

    /// 最新フレーム。初回フレーム到着前と検出停止中は空
    pub fn hands(&self) -> Vec<Hand> {
        self.shared
            .latest
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn is_detecting(&self) -> bool {
        self.shared.detecting.load(Ordering::Acquire)
    }

    /// 検出の開始・停止。停止すると最新フレームは破棄される
    pub fn set_detecting(&self, detecting: bool) {
        match self.shared.latest.lock() {
            Ok(mut latest) => {
                self.shared.detecting.store(detecting, Ordering::Release);
                if !detecting {
                    *latest = None;
                }
            }
            Err(_) => self.shared.detecting.store(detecting, Ordering::Release),
        }
        log::info!("hand detection {}", if detecting { "started" } else { "stopped" });
    }

    pub fn toggle_detecting(&self) -> bool {
        let next = !self.is_detecting();
        self.set_detecting(next);
        next
    }

    /// 入力が閉じられたか
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }
}

impl Drop for ThreadedHandSource {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
