/// 0xRRGGBB のピクセルバッファ
pub struct Canvas {
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buffer: vec![0u32; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    pub fn clear(&mut self, color: u32) {
        self.buffer.fill(color);
    }

    /// 境界外は None
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if self.contains(x, y) {
            Some(self.buffer[y as usize * self.width + x as usize])
        } else {
            None
        }
    }

    /// Bresenhamのアルゴリズムで線を描画
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            self.set_pixel(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// 円を描画（塗りつぶし）
    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// 矩形を描画（塗りつぶし）
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        for py in y0..y1 {
            let row = py as usize * self.width;
            for px in x0..x1 {
                self.buffer[row + px as usize] = color;
            }
        }
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if self.contains(x, y) {
            self.buffer[y as usize * self.width + x as usize] = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_and_pixel() {
        let mut c = Canvas::new(4, 3);
        c.clear(0x123456);
        assert_eq!(c.pixel(3, 2), Some(0x123456));
        assert_eq!(c.pixel(4, 0), None);
        assert_eq!(c.pixel(-1, 0), None);
    }

    #[test]
    fn test_line_endpoints() {
        let mut c = Canvas::new(10, 10);
        c.draw_line(1, 1, 8, 5, 0xFF);
        assert_eq!(c.pixel(1, 1), Some(0xFF));
        assert_eq!(c.pixel(8, 5), Some(0xFF));
        assert_eq!(c.pixel(0, 9), Some(0));
    }

    #[test]
    fn test_circle_clipped() {
        let mut c = Canvas::new(10, 10);
        c.draw_circle(0, 0, 3, 0xAA);
        assert_eq!(c.pixel(0, 0), Some(0xAA));
        assert_eq!(c.pixel(3, 0), Some(0xAA));
        assert_eq!(c.pixel(3, 3), Some(0));
    }

    #[test]
    fn test_fill_rect_clipped() {
        let mut c = Canvas::new(5, 5);
        c.fill_rect(3, 3, 10, 10, 0x1);
        assert_eq!(c.pixel(4, 4), Some(0x1));
        assert_eq!(c.pixel(2, 2), Some(0));
        c.fill_rect(-2, -2, 3, 3, 0x2);
        assert_eq!(c.pixel(0, 0), Some(0x2));
        assert_eq!(c.pixel(1, 1), Some(0));
    }
}
