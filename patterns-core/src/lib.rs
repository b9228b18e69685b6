pub mod identity;
pub mod sanitize;
pub mod shape;
pub mod transform;

pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 画布上的二维点，内部以 `glam::DVec2` 表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维平移向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        pub const ZERO: Vector2 = Vector2(DVec2::ZERO);

        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn negate(self) -> Self {
            Self(-self.0)
        }

        #[inline]
        pub fn is_zero(self) -> bool {
            self.0 == DVec2::ZERO
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，`min` 为左上角，`max` 为右下角（画布坐标 y 轴向下）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(upper_left: Point2, lower_right: Point2) -> Self {
            let min = Point2::from_vec(upper_left.as_vec2().min(lower_right.as_vec2()));
            let max = Point2::from_vec(upper_left.as_vec2().max(lower_right.as_vec2()));
            Self { min, max }
        }

        #[inline]
        pub fn from_size(width: f64, height: f64) -> Self {
            Self::new(Point2::new(0.0, 0.0), Point2::new(width, height))
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn upper_left(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn lower_right(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        /// 扩展自身以同时覆盖 `other`。
        pub fn include(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }
    }

    /// 屏幕坐标到画布坐标的换算参数。
    ///
    /// `a`/`d` 为缩放，`e`/`f` 为画布左上角在屏幕上的偏移，
    /// `scroll_left`/`scroll_top` 为文档滚动距离。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct ScreenTransform {
        pub a: f64,
        pub d: f64,
        pub e: f64,
        pub f: f64,
        pub scroll_left: f64,
        pub scroll_top: f64,
    }

    impl ScreenTransform {
        pub fn to_canvas(&self, screen: Point2) -> Point2 {
            let mut x = screen.x() - self.e;
            let mut y = screen.y() - self.f;
            if self.a != 0.0 {
                x /= self.a;
            }
            if self.d != 0.0 {
                y /= self.d;
            }
            Point2::new(x - self.scroll_left, y - self.scroll_top)
        }
    }

    impl Default for ScreenTransform {
        fn default() -> Self {
            Self {
                a: 1.0,
                d: 1.0,
                e: 0.0,
                f: 0.0,
                scroll_left: 0.0,
                scroll_top: 0.0,
            }
        }
    }

}
