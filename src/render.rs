//! 面板、菜单与任务栏的绘制

use crate::config::PanelVariant;
use crate::format::{DisplayStrings, Emphasis, SpeedText};
use crate::position::{Point, Rect};
use crate::shell::{Menu, MenuEntry, Notice};
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Layout, Rect as Area};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Widget};

/// 配色
pub mod palette {
    use ratatui::style::Color;

    /// 数值：亮绿 #00FF7F
    pub const VALUE: Color = Color::Rgb(0, 255, 127);
    /// 前导零：#001100
    pub const DIM: Color = Color::Rgb(0, 17, 0);
    pub const LABEL: Color = Color::White;
    pub const BACKGROUND: Color = Color::Rgb(20, 20, 20);
    pub const BORDER: Color = Color::Rgb(60, 60, 60);
    pub const TASKBAR: Color = Color::Rgb(36, 36, 36);
    pub const MENU: Color = Color::Rgb(48, 48, 48);
}

/// 紧凑样式的四列：(距内区左侧的偏移, 宽度)
const COMPACT_COLUMNS: [(u16, u16); 4] = [(2, 6), (9, 6), (17, 11), (29, 11)];

fn value_style() -> Style {
    Style::new()
        .fg(palette::VALUE)
        .bg(palette::BACKGROUND)
        .add_modifier(Modifier::BOLD)
}

fn label_style() -> Style {
    Style::new()
        .fg(palette::LABEL)
        .bg(palette::BACKGROUND)
        .add_modifier(Modifier::BOLD)
}

fn speed_line(text: &SpeedText) -> Line<'_> {
    text.spans()
        .iter()
        .map(|span| {
            let style = match span.emphasis {
                Emphasis::Dim => value_style().fg(palette::DIM),
                Emphasis::Bright => value_style(),
            };
            Span::styled(span.text.as_str(), style)
        })
        .collect()
}

/// `rect` 在 `bounds` 内可见的部分
fn visible_area(rect: Rect, bounds: Area) -> Option<Area> {
    let left = rect.left().max(i32::from(bounds.left()));
    let top = rect.top().max(i32::from(bounds.top()));
    let right = rect.right().min(i32::from(bounds.right()));
    let bottom = rect.bottom().min(i32::from(bounds.bottom()));
    if left >= right || top >= bottom {
        return None;
    }

    Some(Area::new(
        u16::try_from(left).ok()?,
        u16::try_from(top).ok()?,
        u16::try_from(right - left).ok()?,
        u16::try_from(bottom - top).ok()?,
    ))
}

/// 把离屏缓冲复制到 `origin` 处，超出 `target` 的部分被裁剪
fn blit(source: &Buffer, origin: Point, target: &mut Buffer) {
    let area = source.area;
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            let at = origin + Point::new(i32::from(x), i32::from(y));
            let (Ok(tx), Ok(ty)) = (u16::try_from(at.x), u16::try_from(at.y)) else {
                continue;
            };
            if let (Some(cell), Some(slot)) = (source.cell((x, y)), target.cell_mut((tx, ty))) {
                *slot = cell.clone();
            }
        }
    }
}

/// 面板本体
struct PanelView<'a> {
    variant: PanelVariant,
    display: &'a DisplayStrings,
}

impl Widget for PanelView<'_> {
    fn render(self, area: Area, buf: &mut Buffer) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(palette::BORDER))
            .style(Style::new().fg(palette::LABEL).bg(palette::BACKGROUND));
        let inner = block.inner(area);
        block.render(area, buf);

        match self.variant {
            PanelVariant::Compact => render_compact(inner, self.display, buf),
            PanelVariant::Wide => render_wide(area, inner, self.display, buf),
        }
    }
}

fn render_compact(inner: Area, display: &DisplayStrings, buf: &mut Buffer) {
    let values = [
        Line::styled(display.cpu.as_str(), value_style()),
        Line::styled(display.ram.as_str(), value_style()),
        speed_line(&display.up),
        speed_line(&display.down),
    ];
    let labels = ["CPU", "RAM", "↑", "↓"];

    for (((offset, width), value), label) in COMPACT_COLUMNS.into_iter().zip(values).zip(labels) {
        let column = Area::new(inner.x + offset, inner.y, width, inner.height).intersection(inner);
        // 数值在上，标签在下
        Paragraph::new(vec![value, Line::styled(label, label_style())])
            .alignment(Alignment::Center)
            .render(column, buf);
    }
}

fn render_wide(area: Area, inner: Area, display: &DisplayStrings, buf: &mut Buffer) {
    let row = Area::new(
        inner.x,
        inner.y + inner.height.saturating_sub(1) / 2,
        inner.width,
        inner.height.min(1),
    );
    // 斜线分隔位于面板宽度的 60% 处
    let separator = area.x + area.width * 3 / 5;
    let [stats, slash, speeds] = Layout::horizontal([
        Constraint::Length(separator.saturating_sub(row.x)),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(row);

    let stats_line = Line::from(vec![
        Span::styled(format!("{:>4}", display.cpu), value_style()),
        Span::styled(" CPU", label_style()),
        Span::raw("    "),
        Span::styled(format!("{:>4}", display.ram), value_style()),
        Span::styled(" RAM", label_style()),
    ]);
    Paragraph::new(stats_line)
        .alignment(Alignment::Center)
        .render(stats, buf);
    Line::styled("╱", Style::new().fg(palette::BORDER)).render(slash, buf);

    let [up, down] = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(speeds);
    for (column, text) in [(up, &display.up), (down, &display.down)] {
        Paragraph::new(speed_line(text))
            .alignment(Alignment::Right)
            .render(column, buf);
    }
}

/// 绘制面板；`rect` 为单元格坐标，可以部分位于屏幕之外
pub fn draw_panel(buf: &mut Buffer, rect: Rect, variant: PanelVariant, display: &DisplayStrings) {
    let (Ok(width), Ok(height)) = (
        u16::try_from(rect.size.width),
        u16::try_from(rect.size.height),
    ) else {
        return;
    };

    // 先画到以 (0, 0) 为原点的离屏缓冲，再按实际位置裁剪复制
    let mut panel = Buffer::empty(Area::new(0, 0, width, height));
    PanelView { variant, display }.render(panel.area, &mut panel);
    blit(&panel, rect.origin, buf);
}

/// 托盘图标所在的区域
pub fn tray_icon_rect(screen_width: i32, row: i32, title: &str) -> Rect {
    let width = title.chars().count() as i32 + 4;
    Rect::new(screen_width - width, row, width, 1)
}

/// 绘制底部任务栏：左侧提示消息，右侧托盘图标
pub fn draw_taskbar(buf: &mut Buffer, row: i32, title: &str, notice: Option<&Notice>) {
    let width = i32::from(buf.area.width);
    let Some(bar) = visible_area(Rect::new(0, row, width, 1), buf.area) else {
        return;
    };

    let style = Style::new().fg(palette::LABEL).bg(palette::TASKBAR);
    let text = notice
        .map(|notice| {
            Line::styled(
                format!(" {}: {}", notice.title, notice.message),
                style.add_modifier(Modifier::BOLD),
            )
        })
        .unwrap_or_default();
    Paragraph::new(text).style(style).render(bar, buf);

    if let Some(icon) = visible_area(tray_icon_rect(width, row, title), buf.area) {
        Line::styled(
            format!(" ◉ {title} "),
            Style::new().fg(palette::VALUE).bg(palette::TASKBAR),
        )
        .render(icon, buf);
    }
}

/// 绘制弹出菜单
pub fn draw_menu(buf: &mut Buffer, menu: &Menu) {
    let Some(area) = visible_area(menu.rect(), buf.area) else {
        return;
    };

    let border = Style::new().fg(palette::BORDER).bg(palette::MENU);
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(border)
        .style(Style::new().fg(palette::LABEL).bg(palette::MENU));
    let inner = block.inner(area);

    Clear.render(area, buf);
    block.render(area, buf);

    let lines: Vec<Line> = menu
        .entries()
        .iter()
        .map(|entry| match entry {
            MenuEntry::Item { label, .. } => Line::raw(format!(" {label}")),
            MenuEntry::Separator => Line::styled("─".repeat(usize::from(inner.width)), border),
        })
        .collect();
    Paragraph::new(lines).render(inner, buf);

    // 分隔线两端接上边框
    for (i, entry) in menu.entries().iter().enumerate() {
        let Ok(offset) = u16::try_from(i) else {
            break;
        };
        let y = inner.y + offset;
        if matches!(entry, MenuEntry::Separator) && y < inner.bottom() {
            buf.set_string(area.left(), y, "├", border);
            buf.set_string(area.right() - 1, y, "┤", border);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::format::{DecorationMode, format_network};
    use crate::shell::MenuAction;
    use ratatui::style::Color;
    use std::time::Duration;

    /// 某一行的纯文本
    pub(crate) fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .filter_map(|x| buf.cell((x, y)).map(|cell| cell.symbol().to_string()))
            .collect()
    }

    fn display() -> DisplayStrings {
        DisplayStrings {
            cpu: "63%".to_string(),
            ram: "41%".to_string(),
            up: format_network(7.0 * 1024.0, DecorationMode::Dimmed),
            down: format_network(1_572_864.0, DecorationMode::Dimmed),
        }
    }

    fn buffer(width: u16, height: u16) -> Buffer {
        Buffer::empty(Area::new(0, 0, width, height))
    }

    #[test]
    fn test_visible_area_is_clipped() {
        let bounds = Area::new(0, 0, 20, 10);
        assert_eq!(
            visible_area(Rect::new(-5, 2, 10, 3), bounds),
            Some(Area::new(0, 2, 5, 3))
        );
        assert_eq!(
            visible_area(Rect::new(15, 8, 10, 5), bounds),
            Some(Area::new(15, 8, 5, 2))
        );
        assert_eq!(visible_area(Rect::new(-10, 0, 10, 3), bounds), None);
        assert_eq!(visible_area(Rect::new(0, 10, 5, 1), bounds), None);
    }

    #[test]
    fn test_draw_compact_panel() {
        let mut buf = buffer(50, 6);
        draw_panel(&mut buf, Rect::new(1, 1, 42, 4), PanelVariant::Compact, &display());

        assert!(row_text(&buf, 1).contains("╭────"));
        let values = row_text(&buf, 2);
        assert!(values.contains("63%"));
        assert!(values.contains("41%"));
        assert!(values.contains("0007 KB/s"));
        assert!(values.contains("1.5 MB/s"));

        let labels = row_text(&buf, 3);
        assert!(labels.contains("CPU"));
        assert!(labels.contains("RAM"));
        assert!(labels.contains('↑'));
        assert!(labels.contains('↓'));
        assert!(row_text(&buf, 4).contains("╰"));
    }

    #[test]
    fn test_dimmed_digits_use_dim_color() {
        let mut buf = buffer(50, 6);
        draw_panel(&mut buf, Rect::new(0, 0, 42, 4), PanelVariant::Compact, &display());

        let row: Vec<char> = row_text(&buf, 1).chars().collect();
        let start = row
            .windows(4)
            .position(|w| w == ['0', '0', '0', '7'])
            .unwrap() as u16;
        for x in start..start + 3 {
            assert_eq!(buf.cell((x, 1)).unwrap().fg, palette::DIM);
        }
        assert_eq!(buf.cell((start + 3, 1)).unwrap().fg, palette::VALUE);
        assert_eq!(buf.cell((start + 3, 1)).unwrap().bg, palette::BACKGROUND);
    }

    #[test]
    fn test_draw_wide_panel_single_line() {
        let mut buf = buffer(72, 4);
        let display = DisplayStrings {
            up: format_network(7.0 * 1024.0, DecorationMode::Plain),
            ..display()
        };
        draw_panel(&mut buf, Rect::new(0, 0, 70, 4), PanelVariant::Wide, &display);

        let line = row_text(&buf, 1);
        assert!(line.contains("63% CPU"));
        assert!(line.contains("41% RAM"));
        assert!(line.contains('╱'));
        assert!(line.contains("7 KB/s"));
        assert!(line.contains("1.5 MB/s"));
        assert!(!row_text(&buf, 2).contains("KB/s"));
    }

    #[test]
    fn test_panel_partially_off_screen() {
        let mut buf = buffer(20, 3);
        draw_panel(&mut buf, Rect::new(-30, -1, 42, 4), PanelVariant::Compact, &display());
        // 可见部分是面板的右下角，占据 0..12 列
        assert_eq!(buf.cell((11, 2)).unwrap().symbol(), "╯");
        assert_eq!(buf.cell((11, 0)).unwrap().bg, palette::BACKGROUND);
        assert_eq!(buf.cell((12, 0)).unwrap().bg, Color::Reset);
    }

    #[test]
    fn test_taskbar_with_notice() {
        let mut buf = buffer(60, 3);
        let notice = Notice {
            title: "SYSTEM HUD".to_string(),
            message: "Panel minimized to system tray".to_string(),
            duration: Duration::from_millis(2000),
        };
        draw_taskbar(&mut buf, 2, "SYSTEM HUD", Some(&notice));

        let row = row_text(&buf, 2);
        assert!(row.starts_with(" SYSTEM HUD: Panel minimized"));
        assert!(row.ends_with(" ◉ SYSTEM HUD "));
        assert_eq!(buf.cell((30, 2)).unwrap().bg, palette::TASKBAR);
        assert_eq!(tray_icon_rect(60, 2, "SYSTEM HUD"), Rect::new(46, 2, 14, 1));
    }

    #[test]
    fn test_draw_menu() {
        let mut buf = buffer(40, 10);
        buf.set_string(0, 2, "x".repeat(40), Style::new());
        let menu = Menu::context(Point::new(2, 1));
        draw_menu(&mut buf, &menu);

        assert!(row_text(&buf, 1).contains("╭"));
        assert!(row_text(&buf, 2).contains("│ Minimize to Tray"));
        // 菜单区域之外保持原样
        assert!(row_text(&buf, 2).starts_with("xx│"));
        assert!(row_text(&buf, 4).contains("├──"));
        assert!(row_text(&buf, 4).contains("─┤"));
        assert!(row_text(&buf, 5).contains("Exit"));
        assert_eq!(menu.hit(Point::new(4, 5)), Some(MenuAction::Exit));
    }
}
