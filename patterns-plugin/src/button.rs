use patterns_core::geometry::{Bounds2D, Point2};

const OPAQUE: f32 = 1.0;
const TRANSPARENT: f32 = 0.5;

/// 选区右上方的“保存为模式”按钮。
#[derive(Debug, Clone, PartialEq)]
pub struct PatternButton {
    visible: bool,
    position: Option<Point2>,
    hovered: bool,
    pressed: bool,
    opacity: f32,
}

impl Default for PatternButton {
    fn default() -> Self {
        Self {
            visible: false,
            position: None,
            hovered: false,
            pressed: false,
            opacity: OPAQUE,
        }
    }
}

impl PatternButton {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn position(&self) -> Option<Point2> {
        self.position
    }

    #[inline]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// 显示在选区右边缘外 `padding` 处，与选区顶边对齐。
    pub fn show_beside(&mut self, selection: &Bounds2D, padding: f64) {
        self.relocate(selection, padding);
        self.visible = true;
    }

    pub fn relocate(&mut self, selection: &Bounds2D, padding: f64) {
        let upper_left = selection.upper_left();
        self.position = Some(Point2::new(
            upper_left.x() + selection.width() + padding,
            upper_left.y(),
        ));
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn show_opaque(&mut self) {
        self.opacity = OPAQUE;
    }

    pub fn show_transparent(&mut self) {
        self.opacity = TRANSPARENT;
    }

    pub fn hover(&mut self) {
        self.hovered = true;
    }

    pub fn activate(&mut self) {
        self.pressed = true;
    }

    /// 松开鼠标后回到悬停状态。
    pub fn release(&mut self) {
        self.pressed = false;
        self.hovered = true;
    }

    pub fn unhover(&mut self) {
        self.pressed = false;
        self.hovered = false;
    }
}
