/// A vertical run of rows in document space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowSpan {
    pub top: u32,
    pub height: u32,
}

impl RowSpan {
    pub fn new(top: u32, height: u32) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }

    /// Fraction of `self` that lies inside `window`, in `0.0..=1.0`.
    ///
    /// A zero-height span counts as fully inside when its row is within the window.
    pub fn intersection_ratio(&self, window: RowSpan) -> f32 {
        if self.height == 0 {
            let inside = self.top >= window.top && self.top < window.bottom();
            return if inside { 1.0 } else { 0.0 };
        }
        self.overlap(window) as f32 / self.height as f32
    }

    /// Number of rows shared with `other`.
    pub fn overlap(&self, other: RowSpan) -> u32 {
        let start = self.top.max(other.top);
        let end = self.bottom().min(other.bottom());
        end.saturating_sub(start)
    }

    /// Like [`RowSpan::intersection_ratio`], but measured against the smaller of `self` and
    /// `window`, so a span taller than the window reads `1.0` when it fills it.
    pub fn coverage(&self, window: RowSpan) -> f32 {
        if self.height == 0 || window.height == 0 {
            return self.intersection_ratio(window);
        }
        self.overlap(window) as f32 / self.height.min(window.height) as f32
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ViewportState {
    pub x: u32,
    pub y: u32,
    pub viewport_w: u16,
    pub viewport_h: u16,
    pub content_w: u32,
    pub content_h: u32,
}

impl ViewportState {
    pub fn set_viewport(&mut self, w: u16, h: u16) {
        self.viewport_w = w;
        self.viewport_h = h;
        self.clamp();
    }

    pub fn set_content(&mut self, w: u32, h: u32) {
        self.content_w = w;
        self.content_h = h;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        let max_y = self.max_y();
        let max_x = self.max_x();
        self.y = self.y.min(max_y);
        self.x = self.x.min(max_x);
    }

    pub fn scroll_y_by(&mut self, delta: i32) {
        let next = self.y as i64 + delta as i64;
        self.y = next.clamp(0, self.max_y() as i64) as u32;
    }

    pub fn scroll_x_by(&mut self, delta: i32) {
        let next = self.x as i64 + delta as i64;
        self.x = next.clamp(0, self.max_x() as i64) as u32;
    }

    pub fn page_down(&mut self) {
        self.scroll_y_by(self.viewport_h.saturating_sub(1) as i32);
    }

    pub fn page_up(&mut self) {
        self.scroll_y_by(-(self.viewport_h.saturating_sub(1) as i32));
    }

    pub fn to_top(&mut self) {
        self.y = 0;
    }

    pub fn to_bottom(&mut self) {
        self.y = self.max_y();
    }

    pub fn is_at_bottom(&self) -> bool {
        self.y >= self.max_y()
    }

    /// Rows currently on screen.
    pub fn visible_rows(&self) -> RowSpan {
        RowSpan::new(self.y, self.viewport_h as u32)
    }

    /// Rows on screen, extended by `margin` rows above and below.
    pub fn visible_rows_with_margin(&self, margin: u16) -> RowSpan {
        let top = self.y.saturating_sub(margin as u32);
        let bottom = self
            .y
            .saturating_add(self.viewport_h as u32)
            .saturating_add(margin as u32);
        RowSpan::new(top, bottom - top)
    }

    fn max_y(&self) -> u32 {
        self.content_h.saturating_sub(self.viewport_h as u32)
    }

    fn max_x(&self) -> u32 {
        self.content_w.saturating_sub(self.viewport_w as u32)
    }
}
