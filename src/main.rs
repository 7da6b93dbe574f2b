use anyhow::Result;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use traffic_gesture::config::Config;
use traffic_gesture::controller::Controller;
use traffic_gesture::device::Button;
use traffic_gesture::hand::{HandDetector, HandInput, ThreadedHandSource};
use traffic_gesture::link::Connection;
use traffic_gesture::protocol::{DeviceStatus, Light};
use traffic_gesture::render::{StatusView, ViewState, WindowEvent};

const CONFIG_PATH: &str = "config.toml";

/// 標準入力からの操作
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleCommand {
    SetTiming(Light, u32),
    ToggleConnection,
    ToggleDetection,
    /// シミュレータ接続時の本体ボタン
    Press(Button),
    Quit,
}

fn parse_console(line: &str) -> Option<ConsoleCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [light, ms] => {
            let light = Light::from_prefix(light.chars().next()?.to_ascii_uppercase())?;
            Some(ConsoleCommand::SetTiming(light, ms.parse().ok()?))
        }
        ["c"] => Some(ConsoleCommand::ToggleConnection),
        ["d"] => Some(ConsoleCommand::ToggleDetection),
        ["!e"] => Some(ConsoleCommand::Press(Button::Emergency)),
        ["!b"] => Some(ConsoleCommand::Press(Button::Blinking)),
        ["!p"] => Some(ConsoleCommand::Press(Button::Power)),
        ["q"] => Some(ConsoleCommand::Quit),
        _ => None,
    }
}

/// 標準入力を別スレッドで読む
fn spawn_console() -> Receiver<ConsoleCommand> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_console(&line) {
                Some(cmd) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                None => println!("不明なコマンド: {}", line.trim()),
            }
        }
    });
    rx
}

#[cfg(feature = "desktop")]
mod debug_window {
    use anyhow::Result;
    use traffic_gesture::config::DebugConfig;
    use traffic_gesture::render::{Canvas, MinifbRenderer, WindowEvent};

    /// デバッグ表示（無効時は何もしない）
    pub struct DebugWindow(Option<MinifbRenderer>);

    impl DebugWindow {
        pub fn open(config: &DebugConfig) -> Result<Self> {
            if !config.view {
                return Ok(Self(None));
            }
            println!("操作: [クリック] 検出の停止/再開  [C] 接続/切断  [Esc] 終了");
            let renderer = MinifbRenderer::new("Traffic Gesture", config.width, config.height)?;
            Ok(Self(Some(renderer)))
        }

        pub fn is_shown(&self) -> bool {
            self.0.is_some()
        }

        pub fn is_open(&self) -> bool {
            self.0.as_ref().map_or(true, |r| r.is_open())
        }

        pub fn events(&mut self) -> Vec<WindowEvent> {
            self.0.as_mut().map(|r| r.events()).unwrap_or_default()
        }

        pub fn update(&mut self, canvas: &Canvas) -> Result<()> {
            match self.0.as_mut() {
                Some(r) => r.update(canvas),
                None => Ok(()),
            }
        }
    }
}

#[cfg(not(feature = "desktop"))]
mod debug_window {
    use anyhow::Result;
    use traffic_gesture::config::DebugConfig;
    use traffic_gesture::render::{Canvas, WindowEvent};

    pub struct DebugWindow;

    impl DebugWindow {
        pub fn open(config: &DebugConfig) -> Result<Self> {
            if config.view {
                log::warn!("debug view requires the `desktop` feature");
            }
            Ok(Self)
        }

        pub fn is_shown(&self) -> bool {
            false
        }

        pub fn is_open(&self) -> bool {
            true
        }

        pub fn events(&mut self) -> Vec<WindowEvent> {
            Vec::new()
        }

        pub fn update(&mut self, _canvas: &Canvas) -> Result<()> {
            Ok(())
        }
    }
}

use debug_window::DebugWindow;

/// 受信状態の1行要約
fn status_summary(status: &DeviceStatus) -> String {
    format!(
        "mode {} B:{} | R{} Y{} G{} | msg: {}",
        status.mode,
        status.brightness,
        u8::from(status.red),
        u8::from(status.yellow),
        u8::from(status.green),
        status.last_line.as_deref().unwrap_or("-"),
    )
}

fn toggle_connection(connection: &mut Connection) {
    match connection.toggle() {
        Ok(open) => println!("Connection: {}", if open { "OPEN" } else { "CLOSED" }),
        Err(e) => log::warn!("connect failed: {:#}", e),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path);

    println!("Traffic Gesture ({})", env!("GIT_VERSION"));
    println!("Serial: {} @ {}", config.serial.port, config.serial.baud_rate);
    println!("Target FPS: {}", config.app.target_fps);
    println!("Gesture: threshold={}, slide delta={}ms, range={}..{}ms",
        config.gesture.threshold, config.gesture.slide_delta,
        config.gesture.time_min, config.gesture.time_max);
    println!("Debug view: {}", if config.debug.view { "ON" } else { "OFF" });
    println!();

    let input = HandInput::from_command(&config.hands.command);
    let console = if matches!(input, HandInput::Command(_)) {
        println!("コマンド:");
        println!("  r|y|g <ms>    - 点灯時間を設定 (例: y 800)");
        println!("  c             - 接続/切断");
        println!("  d             - 検出の停止/再開");
        println!("  !e / !b / !p  - 緊急 / 点滅 / 電源ボタン (sim 接続時)");
        println!("  q             - 終了");
        println!();
        Some(spawn_console())
    } else {
        None
    };

    let hands = ThreadedHandSource::start(input, HandDetector::from_config(&config.hands))?;
    let mut controller = Controller::from_config(&config);
    let mut connection = Connection::from_config(&config);
    if config.serial.auto_connect {
        if let Err(e) = connection.open() {
            log::warn!("auto connect failed: {:#}", e);
        }
    }

    let mut view = StatusView::new(config.debug.width, config.debug.height);
    let mut window = DebugWindow::open(&config.debug)?;

    let frame_duration = Duration::from_secs_f64(1.0 / config.app.target_fps as f64);

    // FPS計測
    let mut frame_count = 0u32;
    let mut detect_count = 0u64;
    let mut fps_timer = Instant::now();
    let mut last_frame_id = 0u64;

    loop {
        let loop_start = Instant::now();

        if !window.is_open() {
            break;
        }
        for event in window.events() {
            match event {
                WindowEvent::ToggleDetection => {
                    hands.toggle_detecting();
                }
                WindowEvent::ToggleConnection => toggle_connection(&mut connection),
            }
        }

        if let Some(ref rx) = console {
            let mut quit = false;
            for cmd in rx.try_iter() {
                match cmd {
                    ConsoleCommand::SetTiming(light, ms) => {
                        let commands = controller.set_timing(light, ms, connection.is_open());
                        if let Err(e) = connection.send_all(&commands) {
                            log::warn!("send failed: {:#}", e);
                        }
                        println!("{:?}: {}ms", light, controller.timings().get(light));
                    }
                    ConsoleCommand::ToggleConnection => toggle_connection(&mut connection),
                    ConsoleCommand::ToggleDetection => {
                        hands.toggle_detecting();
                    }
                    ConsoleCommand::Press(button) => {
                        if let Err(e) = connection.press(button) {
                            println!("{:#}", e);
                        }
                    }
                    ConsoleCommand::Quit => quit = true,
                }
            }
            if quit {
                break;
            }
        }

        let frame_id = hands.frame_id();
        if frame_id != last_frame_id {
            detect_count += frame_id - last_frame_id;
            last_frame_id = frame_id;
        }
        let current = hands.hands();

        let commands = controller.on_frame(&current, connection.is_open());
        if let Err(e) = connection.send_all(&commands) {
            log::warn!("send failed: {:#}", e);
        }
        for line in connection.poll_lines() {
            log::debug!("recv {}", line);
            controller.on_device_line(&line);
        }

        let state = ViewState {
            hands: &current,
            timings: controller.timings(),
            time_range: (config.gesture.time_min, config.gesture.time_max),
            slide_mode: controller.is_slide_mode(),
            status: controller.status(),
            connected: connection.is_open(),
            detecting: hands.is_detecting(),
        };
        window.update(view.draw(&state))?;

        // 状態表示（1秒に1回）
        frame_count += 1;
        let elapsed = fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let t = controller.timings();
            log::info!(
                "FPS: {:.1} (detect: {}) | hands {} | {} | {} | {}/{}/{}ms{}",
                frame_count as f32 / elapsed,
                detect_count,
                current.len(),
                connection.name().unwrap_or("disconnected"),
                status_summary(controller.status()),
                t.red,
                t.yellow,
                t.green,
                if controller.is_slide_mode() { " [SLIDE]" } else { "" },
            );
            frame_count = 0;
            detect_count = 0;
            fps_timer = Instant::now();
        }

        // 入力が尽きたら、ウィンドウも操作コンソールもなければ終了
        if hands.is_finished() && console.is_none() && !window.is_shown() {
            break;
        }

        let spent = loop_start.elapsed();
        if spent < frame_duration {
            thread::sleep(frame_duration - spent);
        }
    }

    println!("Shutting down...");
    connection.close();
    Ok(())
}
