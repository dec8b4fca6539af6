//! 终端外壳
//!
//! 终端即屏幕，最后一行是任务栏（托盘图标与提示消息），其余区域是可用区域。
//! 面板按像素尺寸换算成单元格后绘制，拖动、贴边、菜单都在单元格坐标下进行。

use crate::config::HudConfig;
use crate::format::DisplayStrings;
use crate::hud::HudCore;
use crate::position::{MouseButton, Point, PressOutcome, Rect, Size, initial_origin};
use crate::render::{draw_menu, draw_panel, draw_taskbar, tray_icon_rect};
use crate::shell::{Menu, MenuAction, Notice, ShellEffect, ShellState, TrayActivation, WindowMode};
use crate::stats::{ProcSource, VitalsSource};
use anyhow::Result;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton as TermButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use log::{debug, info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use std::io;
use std::time::Instant;
use tokio::time::{self, MissedTickBehavior};

/// 一个单元格对应的像素宽度
pub const CELL_WIDTH_PX: i32 = 10;

/// 一个单元格对应的像素高度
pub const CELL_HEIGHT_PX: i32 = 20;

#[inline]
fn div_ceil(px: i32, cell: i32) -> i32 {
    (px + cell - 1) / cell
}

/// 把像素配置换算为单元格配置
pub fn to_cells(config: &HudConfig) -> HudConfig {
    HudConfig {
        size: Size::new(
            div_ceil(config.size.width, CELL_WIDTH_PX),
            div_ceil(config.size.height, CELL_HEIGHT_PX),
        ),
        top_offset: config.top_offset / CELL_HEIGHT_PX,
        // 向上取整：距离 d 格满足 d < ⌈T/c⌉ 当且仅当 d·c < T
        edge_threshold: Size::new(
            div_ceil(config.edge_threshold.width, CELL_WIDTH_PX),
            div_ceil(config.edge_threshold.height, CELL_HEIGHT_PX),
        ),
        ..config.clone()
    }
}

/// 可用区域：除去最后一行任务栏
#[inline]
pub fn available_area(terminal: Size) -> Rect {
    Rect::new(0, 0, terminal.width, (terminal.height - 1).max(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// 面板应用：持有核心与外壳状态，不直接接触终端
#[derive(Debug)]
pub struct PanelApp<S> {
    config: HudConfig,
    core: HudCore<S>,
    shell: ShellState,
    origin: Point,
    terminal: Size,
    display: DisplayStrings,
    menu: Option<Menu>,
    notice: Option<(Notice, Instant)>,
}

impl<S: VitalsSource> PanelApp<S> {
    pub fn new(source: S, config: &HudConfig, terminal: Size) -> Self {
        let config = to_cells(config);
        let origin = initial_origin(
            available_area(terminal),
            config.size,
            config.placement_ratio,
            config.top_offset,
        );

        Self {
            core: HudCore::new(source, &config),
            shell: ShellState::new(config.title),
            display: DisplayStrings::initial(config.decoration),
            origin,
            terminal,
            menu: None,
            notice: None,
            config,
        }
    }

    #[inline]
    pub async fn prime(&mut self) -> bool {
        self.core.prime().await
    }

    /// 定时器回调
    pub async fn tick(&mut self) {
        self.display = self.core.on_tick().await;
    }

    #[inline]
    pub fn origin(&self) -> Point {
        self.origin
    }

    #[inline]
    pub fn mode(&self) -> WindowMode {
        self.shell.mode()
    }

    #[inline]
    pub fn display(&self) -> &DisplayStrings {
        &self.display
    }

    #[inline]
    pub fn menu(&self) -> Option<&Menu> {
        self.menu.as_ref()
    }

    #[inline]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().map(|(notice, _)| notice)
    }

    #[inline]
    pub fn panel_rect(&self) -> Rect {
        Rect::from_parts(self.origin, self.config.size)
    }

    #[inline]
    fn screen(&self) -> Rect {
        available_area(self.terminal)
    }

    #[inline]
    fn terminal_rect(&self) -> Rect {
        Rect::from_parts(Point::default(), self.terminal)
    }

    #[inline]
    fn taskbar_row(&self) -> i32 {
        self.terminal.height - 1
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.terminal = Size::new(i32::from(width), i32::from(height));
        debug!("终端尺寸变为 {width}x{height}");
    }

    /// 提示消息到期后移除
    pub fn expire_notice(&mut self, now: Instant) {
        let expired = self.notice.as_ref().is_some_and(|(notice, shown_at)| {
            now.saturating_duration_since(*shown_at) >= notice.duration
        });
        if expired {
            self.notice = None;
        }
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) -> Flow {
        match event {
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Key(key) => self.handle_key(key, now),
            Event::Resize(width, height) => {
                self.resize(width, height);
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                info!("收到终止信号");
                Flow::Exit
            }
            KeyCode::Esc if self.menu.is_some() => {
                self.menu = None;
                Flow::Continue
            }
            // 关闭窗口等同于最小化到托盘
            KeyCode::Esc if self.shell.is_visible() => {
                let effect = self.shell.close_requested();
                self.apply_effect(effect, now)
            }
            _ => Flow::Continue,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Flow {
        let point = Point::new(i32::from(mouse.column), i32::from(mouse.row));

        // 菜单打开时，任何按下都会关闭菜单
        if let Some(menu) = self.menu.take() {
            if let MouseEventKind::Down(_) = mouse.kind {
                return match menu.hit(point) {
                    Some(action) => self.perform(action, now),
                    None => Flow::Continue,
                };
            }
            self.menu = Some(menu);
            return Flow::Continue;
        }

        match mouse.kind {
            MouseEventKind::Down(button) => self.press(point, button),
            MouseEventKind::Drag(button) => {
                let left_held = button == TermButton::Left;
                if let Some(origin) = self.core.on_mouse_move(self.origin, point, left_held) {
                    self.origin = origin;
                }
                Flow::Continue
            }
            MouseEventKind::Up(_) => {
                let dragging = self.core.positioner().is_dragging();
                self.origin = self.core.on_mouse_up(self.panel_rect(), self.screen());
                if dragging {
                    debug!("面板释放于 ({}, {})", self.origin.x, self.origin.y);
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn press(&mut self, point: Point, button: TermButton) -> Flow {
        let tray = tray_icon_rect(self.terminal.width, self.taskbar_row(), self.shell.title());
        if tray.contains(point) {
            let reason = match button {
                TermButton::Left => TrayActivation::Trigger,
                TermButton::Right => TrayActivation::Context,
                TermButton::Middle => return Flow::Continue,
            };
            if let Some(menu) = self.shell.tray_activated(reason, point) {
                // 托盘菜单向上弹出
                let above = Point::new(point.x, point.y - menu.size().height);
                let menu = Menu::new(above, menu.entries().to_vec());
                self.menu = Some(menu.placed_within(self.terminal_rect()));
            }
            return Flow::Continue;
        }

        if !self.shell.is_visible() || !self.panel_rect().contains(point) {
            return Flow::Continue;
        }

        let button = match button {
            TermButton::Left => MouseButton::Left,
            TermButton::Right => MouseButton::Right,
            TermButton::Middle => MouseButton::Middle,
        };
        if let PressOutcome::ContextMenu(at) = self.core.on_mouse_down(point, button) {
            self.menu = Some(Menu::context(at).placed_within(self.terminal_rect()));
        }
        Flow::Continue
    }

    fn perform(&mut self, action: MenuAction, now: Instant) -> Flow {
        let effect = self.shell.apply(action);
        self.apply_effect(effect, now)
    }

    fn apply_effect(&mut self, effect: ShellEffect, now: Instant) -> Flow {
        match effect {
            ShellEffect::None => Flow::Continue,
            ShellEffect::Notify(notice) => {
                self.notice = Some((notice, now));
                Flow::Continue
            }
            ShellEffect::Exit => Flow::Exit,
        }
    }

    /// 绘制整帧；置顶时面板盖住任务栏，否则任务栏在上
    pub fn render(&self, buf: &mut Buffer) {
        let row = self.taskbar_row();
        let title = self.shell.title();
        let panel = self.panel_rect();
        match self.shell.mode() {
            WindowMode::AlwaysOnTop => {
                draw_taskbar(buf, row, title, self.notice());
                draw_panel(buf, panel, self.config.variant, &self.display);
            }
            WindowMode::Normal => {
                draw_panel(buf, panel, self.config.variant, &self.display);
                draw_taskbar(buf, row, title, self.notice());
            }
            WindowMode::MinimizedToTray => {
                draw_taskbar(buf, row, title, self.notice());
            }
        }

        if let Some(menu) = &self.menu {
            draw_menu(buf, menu);
        }
    }
}

/// 进入终端的全屏模式，离开作用域时恢复
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), DisableMouseCapture, Show, LeaveAlternateScreen) {
            warn!("恢复终端失败: {e}");
        }
        if let Err(e) = disable_raw_mode() {
            warn!("关闭 raw 模式失败: {e}");
        }
    }
}

/// 运行面板，直到用户选择退出
pub async fn run(config: &HudConfig) -> Result<()> {
    let (width, height) = terminal::size()?;
    let _guard = TerminalGuard::enter()?;
    let mut screen = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let terminal = Size::new(i32::from(width), i32::from(height));
    let mut app = PanelApp::new(ProcSource::new(), config, terminal);
    app.prime().await;
    info!(
        "面板已启动: {} ({:?})，初始位置 ({}, {})",
        config.title,
        config.variant,
        app.origin().x,
        app.origin().y
    );

    let mut events = EventStream::new();
    let mut ticker = time::interval(config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // 第一次 tick 立即完成，跳过以保证完整的一个采样周期
    ticker.tick().await;

    loop {
        app.expire_notice(Instant::now());
        // 与上一帧比较，只输出变化的单元格
        screen.draw(|frame| app.render(frame.buffer_mut()))?;

        tokio::select! {
            _ = ticker.tick() => app.tick().await,
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if app.handle_event(event, Instant::now()) == Flow::Exit {
                        break;
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    info!("面板正常退出");
    Ok(())
}
