//! 外壳状态：窗口模式、托盘与右键菜单、提示消息
//!
//! 核心逻辑从不修改这里的状态，只有外壳根据用户操作更新它。

use crate::config::{MINIMIZE_NOTICE, TOGGLE_NOTICE};
use crate::position::{Point, Rect, Size};
use log::info;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Normal,
    AlwaysOnTop,
    MinimizedToTray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    MinimizeToTray,
    ToggleAlwaysOnTop,
    RestorePanel,
    Exit,
}

/// 托盘图标的激活方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayActivation {
    /// 左键单击
    Trigger,
    /// 右键，弹出托盘菜单
    Context,
}

/// 托盘提示消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEffect {
    None,
    Notify(Notice),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    title: String,
    always_on_top: bool,
    hidden: bool,
}

impl ShellState {
    /// 初始为置顶且可见
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            always_on_top: true,
            hidden: false,
        }
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mode(&self) -> WindowMode {
        if self.hidden {
            WindowMode::MinimizedToTray
        } else if self.always_on_top {
            WindowMode::AlwaysOnTop
        } else {
            WindowMode::Normal
        }
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    #[inline]
    pub fn is_always_on_top(&self) -> bool {
        self.always_on_top
    }

    pub fn apply(&mut self, action: MenuAction) -> ShellEffect {
        match action {
            MenuAction::MinimizeToTray => {
                self.hidden = true;
                info!("面板已最小化到托盘");
                ShellEffect::Notify(self.notice("Panel minimized to system tray", MINIMIZE_NOTICE))
            }
            MenuAction::ToggleAlwaysOnTop => {
                self.always_on_top = !self.always_on_top;
                // 修改窗口标志后窗口会被重新显示
                self.hidden = false;
                info!("置顶状态: {}", self.always_on_top);
                let message = if self.always_on_top {
                    "Always on top enabled"
                } else {
                    "Always on top disabled"
                };
                ShellEffect::Notify(self.notice(message, TOGGLE_NOTICE))
            }
            MenuAction::RestorePanel => {
                self.hidden = false;
                ShellEffect::None
            }
            MenuAction::Exit => ShellEffect::Exit,
        }
    }

    /// 托盘图标被激活；返回需要弹出的托盘菜单
    pub fn tray_activated(&mut self, reason: TrayActivation, at: Point) -> Option<Menu> {
        match reason {
            TrayActivation::Trigger => {
                self.hidden = false;
                None
            }
            TrayActivation::Context => Some(Menu::tray(at)),
        }
    }

    /// 窗口关闭请求只会最小化到托盘
    #[inline]
    pub fn close_requested(&mut self) -> ShellEffect {
        self.apply(MenuAction::MinimizeToTray)
    }

    fn notice(&self, message: &str, duration: Duration) -> Notice {
        Notice {
            title: self.title.clone(),
            message: message.to_string(),
            duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Item { label: &'static str, action: MenuAction },
    Separator,
}

/// 弹出菜单，坐标为单元格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    origin: Point,
    entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn new(origin: Point, entries: Vec<MenuEntry>) -> Self {
        Self { origin, entries }
    }

    /// 面板右键菜单
    pub fn context(at: Point) -> Self {
        Self::new(
            at,
            vec![
                MenuEntry::Item {
                    label: "Minimize to Tray",
                    action: MenuAction::MinimizeToTray,
                },
                MenuEntry::Item {
                    label: "Toggle Always on Top",
                    action: MenuAction::ToggleAlwaysOnTop,
                },
                MenuEntry::Separator,
                MenuEntry::Item {
                    label: "Exit",
                    action: MenuAction::Exit,
                },
            ],
        )
    }

    /// 托盘菜单
    pub fn tray(at: Point) -> Self {
        Self::new(
            at,
            vec![
                MenuEntry::Item {
                    label: "Restore Panel",
                    action: MenuAction::RestorePanel,
                },
                MenuEntry::Item {
                    label: "Exit",
                    action: MenuAction::Exit,
                },
            ],
        )
    }

    #[inline]
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    #[inline]
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// 含边框的尺寸：每个条目一行，左右各留一格
    pub fn size(&self) -> Size {
        let widest = self
            .entries
            .iter()
            .map(|entry| match entry {
                MenuEntry::Item { label, .. } => label.chars().count(),
                MenuEntry::Separator => 0,
            })
            .max()
            .unwrap_or(0);
        Size::new(widest as i32 + 4, self.entries.len() as i32 + 2)
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_parts(self.origin, self.size())
    }

    /// 平移到 `bounds` 以内，放不下时贴住左上角
    pub fn placed_within(mut self, bounds: Rect) -> Self {
        let size = self.size();
        let max_x = (bounds.right() - size.width).max(bounds.left());
        let max_y = (bounds.bottom() - size.height).max(bounds.top());
        self.origin = Point::new(
            self.origin.x.clamp(bounds.left(), max_x),
            self.origin.y.clamp(bounds.top(), max_y),
        );
        self
    }

    /// 点击位置对应的菜单动作；边框与分隔线返回 `None`
    pub fn hit(&self, point: Point) -> Option<MenuAction> {
        let rect = self.rect();
        if !rect.contains(point) {
            return None;
        }

        let row = point.y - rect.top() - 1;
        if row < 0 || point.x == rect.left() || point.x == rect.right() - 1 {
            return None;
        }

        match self.entries.get(row as usize)? {
            MenuEntry::Item { action, .. } => Some(*action),
            MenuEntry::Separator => None,
        }
    }
}
