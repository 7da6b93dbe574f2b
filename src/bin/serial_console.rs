use anyhow::{Context, Result};
use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use traffic_gesture::config::Config;
use traffic_gesture::link::Connection;
use traffic_gesture::protocol::{DeviceStatus, HostCommand, Light, Mode};

const CONFIG_PATH: &str = "config.toml";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum Input {
    Send(HostCommand),
    Status,
    Quit,
}

fn parse_input(line: &str) -> Result<Input> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let input = match parts.as_slice() {
        ["m", mode] => Input::Send(HostCommand::Mode(mode.to_ascii_uppercase().parse::<Mode>()?)),
        ["b", value] => Input::Send(HostCommand::Brightness(value.parse().context("明るさは整数")?)),
        [light @ ("r" | "y" | "g"), ms] => {
            let light = Light::from_prefix(light.to_ascii_uppercase().chars().next().unwrap_or('R'))
                .context("不明な色")?;
            Input::Send(HostCommand::Duration { light, ms: ms.parse().context("時間はミリ秒の整数")? })
        }
        ["s"] => Input::Status,
        ["q"] => Input::Quit,
        _ => anyhow::bail!("不明なコマンド: {}", line.trim()),
    };
    Ok(input)
}

fn print_status(status: &DeviceStatus) {
    println!("現在の状態:");
    println!("  モード: {}", status.mode);
    println!("  明るさ: {}", status.brightness);
    println!("  LED: R{} Y{} G{}", u8::from(status.red), u8::from(status.yellow), u8::from(status.green));
    if let Some(ref line) = status.last_line {
        println!("  最終受信: {}", line);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path);

    println!("=== Traffic Light Serial Console ({}) ===", env!("GIT_VERSION"));
    println!("接続先: {} @ {}", config.serial.port, config.serial.baud_rate);
    println!();
    println!("コマンド:");
    println!("  m <mode>      - モードを設定 (例: m blinking)");
    println!("  r|y|g <ms>    - 点灯時間を設定 (例: r 3000)");
    println!("  b <n>         - 明るさを設定");
    println!("  s             - 受信した状態を表示");
    println!("  q             - 終了");
    println!();

    let mut connection = Connection::from_config(&config);
    connection.open()?;

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut status = DeviceStatus::default();
    loop {
        for line in connection.poll_lines() {
            println!("< {}", line);
            status.apply_line(&line);
        }

        let line = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_input(&line) {
            Ok(Input::Send(command)) => {
                connection.send(&command)?;
                println!("> {}", command);
            }
            Ok(Input::Status) => print_status(&status),
            Ok(Input::Quit) => {
                println!("終了します");
                break;
            }
            Err(e) => println!("{:#}", e),
        }
    }

    connection.close();
    Ok(())
}
