use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use traffic_gesture::config::Config;
use traffic_gesture::device::{Button, DeviceInput, DeviceRunner, TrafficLight};

const CONFIG_PATH: &str = "config.toml";

/// `!` で始まる行は本体操作、それ以外はシリアル受信行として扱う
fn parse_input(line: &str) -> Option<DeviceInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('!') else {
        return Some(DeviceInput::Line(line.to_string()));
    };
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        ["e"] => Some(DeviceInput::Button(Button::Emergency)),
        ["b"] => Some(DeviceInput::Button(Button::Blinking)),
        ["p"] => Some(DeviceInput::Button(Button::Power)),
        ["pot"] => Some(DeviceInput::Potentiometer(None)),
        ["pot", value] => value.parse().ok().map(|v| DeviceInput::Potentiometer(Some(v))),
        _ => None,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path);

    eprintln!("=== Traffic Light Simulator ({}) ===", env!("GIT_VERSION"));
    eprintln!("timing: R={} Y={} G={}ms", config.timing.red, config.timing.yellow, config.timing.green);
    eprintln!();
    eprintln!("入力:");
    eprintln!("  MODE:X / R:ms / Y:ms / G:ms / B:n  - ホストからのコマンド");
    eprintln!("  !e / !b / !p                        - 緊急 / 点滅 / 電源ボタン");
    eprintln!("  !pot <n> / !pot                     - 可変抵抗を設定 / 外す");
    eprintln!();

    let light = TrafficLight::new(&config.device).with_timings(config.timing.timings());
    let (in_tx, in_rx) = mpsc::channel();
    let (out_tx, out_rx) = mpsc::channel();
    let runner = DeviceRunner::new(light, in_rx, out_tx, Arc::new(AtomicBool::new(true))).spawn();

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_input(&line) {
                Some(input) => {
                    if in_tx.send(input).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => log::warn!("unknown input: {}", line.trim()),
            }
        }
        // in_tx が破棄されるとシミュレータは次のループで停止する
    });

    let mut stdout = io::stdout();
    for line in out_rx {
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
    }

    if runner.join().is_err() {
        anyhow::bail!("simulator thread panicked");
    }
    Ok(())
}
