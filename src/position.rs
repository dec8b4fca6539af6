//! 窗口拖动与贴边状态机

use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// 左上角 + 尺寸
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    #[inline]
    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.origin.x
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.origin.y
    }

    /// 右边缘（不含）
    #[inline]
    pub fn right(&self) -> i32 {
        self.origin.x + self.size.width
    }

    /// 下边缘（不含）
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.origin.y + self.size.height
    }

    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// 拖动状态；释放后立即回到 `Idle`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// 上一次记录的全局指针位置
        anchor: Point,
    },
}

/// 按下鼠标后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    DragStarted,
    /// 右键：由外壳弹出上下文菜单
    ContextMenu(Point),
    Ignored,
}

/// 窗口定位器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Positioner {
    state: DragState,
    /// 水平方向的阈值作用于左右边缘，垂直方向的作用于上边缘
    edge_threshold: Size,
}

impl Positioner {
    #[inline]
    pub fn new(edge_threshold: Size) -> Self {
        Self {
            state: DragState::Idle,
            edge_threshold,
        }
    }

    #[inline]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// 左键按下开始拖动，右键交给外壳
    pub fn press(&mut self, global: Point, button: MouseButton) -> PressOutcome {
        match button {
            MouseButton::Left => {
                self.state = DragState::Dragging { anchor: global };
                PressOutcome::DragStarted
            }
            MouseButton::Right => PressOutcome::ContextMenu(global),
            MouseButton::Middle => PressOutcome::Ignored,
        }
    }

    /// 指针移动；返回新的窗口原点
    ///
    /// 位移按上一次指针位置增量计算，锚点随之更新。
    pub fn drag_to(&mut self, origin: Point, global: Point, left_held: bool) -> Option<Point> {
        let DragState::Dragging { anchor } = self.state else {
            return None;
        };
        if !left_held {
            return None;
        }

        self.state = DragState::Dragging { anchor: global };
        Some(origin + (global - anchor))
    }

    /// 释放按键；拖动中则执行一次贴边并回到 `Idle`
    pub fn release(&mut self, window: Rect, screen: Rect) -> Point {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;

        if was_dragging {
            snap_to_edge(window, screen, self.edge_threshold)
        } else {
            window.origin
        }
    }
}

/// 贴边规则：依次检查左、右、上边缘，只修正第一个命中的边
pub fn snap_to_edge(window: Rect, screen: Rect, threshold: Size) -> Point {
    let origin = window.origin;

    if (window.left() - screen.left()).abs() < threshold.width {
        Point::new(screen.left(), origin.y)
    } else if (window.right() - screen.right()).abs() < threshold.width {
        Point::new(screen.right() - window.size.width, origin.y)
    } else if (window.top() - screen.top()).abs() < threshold.height {
        Point::new(origin.x, screen.top())
    } else {
        origin
    }
}

/// 初始位置：水平方向按 `ratio` 分配剩余空间，顶部留出 `top_offset`
pub fn initial_origin(screen: Rect, size: Size, ratio: f64, top_offset: i32) -> Point {
    let spare = f64::from(screen.size.width - size.width);
    let x = if ratio > 0.0 { (spare / ratio) as i32 } else { 0 };
    Point::new(screen.left() + x, screen.top() + top_offset)
}
