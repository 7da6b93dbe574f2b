use anyhow::Result;
use std::io::{self, BufRead};

use traffic_gesture::config::Config;
use traffic_gesture::controller::Controller;
use traffic_gesture::gesture::{classify_tip, TipPosition};
use traffic_gesture::hand::{Hand, HandDetector, HandKeypointIndex};

const CONFIG_PATH: &str = "config.toml";
const WATCHED_FINGERS: [(HandKeypointIndex, &str); 3] = [
    (HandKeypointIndex::ThumbTip, "thumb"),
    (HandKeypointIndex::IndexTip, "index"),
    (HandKeypointIndex::PinkyTip, "pinky"),
];

fn describe_hand(hand: &Hand, threshold: f32) -> String {
    let tips: Vec<String> = WATCHED_FINGERS
        .iter()
        .map(|(finger, name)| {
            let position = match classify_tip(hand, *finger, threshold) {
                Some(TipPosition::Top) => "top",
                Some(TipPosition::Bottom) => "bottom",
                None => "-",
            };
            format!("{}={}", name, position)
        })
        .collect();
    format!(
        "{} y=[{:.0}, {:.0}] {}",
        if hand.handedness.is_empty() { "?" } else { hand.handedness.as_str() },
        hand.min_y(),
        hand.max_y(),
        tips.join(" ")
    )
}

/// 検出プロセスの出力を標準入力から読み、フレームごとの判定結果を表示する
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path);
    let detector = HandDetector::from_config(&config.hands);
    let mut controller = Controller::from_config(&config);
    let threshold = config.gesture.threshold;

    eprintln!("Gesture Monitor ({}) threshold={}", env!("GIT_VERSION"), threshold);

    let mut frame = 0u64;
    for line in io::stdin().lock().lines() {
        let line = line?;
        let Some(hands) = detector.parse_line(&line) else {
            continue;
        };
        frame += 1;

        let commands = controller.on_frame(&hands, true);
        let sent: Vec<String> = commands.iter().map(|c| c.encode()).collect();
        println!(
            "#{} hands={}{} send=[{}]",
            frame,
            hands.len(),
            if controller.is_slide_mode() { " [SLIDE]" } else { "" },
            sent.join(" ")
        );
        for (i, hand) in hands.iter().enumerate() {
            println!("  [{}] {}", i, describe_hand(hand, threshold));
        }
    }

    let t = controller.timings();
    eprintln!("{} frames, timings R={} Y={} G={}ms", frame, t.red, t.yellow, t.green);
    Ok(())
}
