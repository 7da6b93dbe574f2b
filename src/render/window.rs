use anyhow::Result;
use minifb::{Key, KeyRepeat, MouseButton, Window, WindowOptions};

use crate::render::canvas::Canvas;
use crate::render::view::WindowEvent;

/// minifbを使用したレンダラー
pub struct MinifbRenderer {
    window: Window,
    mouse_was_down: bool,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            mouse_was_down: false,
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    /// キャンバスを表示
    pub fn update(&mut self, canvas: &Canvas) -> Result<()> {
        self.window
            .update_with_buffer(canvas.buffer(), canvas.width(), canvas.height())?;
        Ok(())
    }

    /// 前回の呼び出し以降の操作
    pub fn events(&mut self) -> Vec<WindowEvent> {
        let mut events = Vec::new();

        let down = self.window.get_mouse_down(MouseButton::Left);
        if down && !self.mouse_was_down {
            events.push(WindowEvent::ToggleDetection);
        }
        self.mouse_was_down = down;

        if self.window.is_key_pressed(Key::C, KeyRepeat::No) {
            events.push(WindowEvent::ToggleConnection);
        }
        events
    }
}
