use crate::format::DecorationMode;
use crate::position::Size;
use clap::ValueEnum;
use std::time::Duration;

/// 采样周期
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// 贴边阈值（像素）
pub const EDGE_THRESHOLD: i32 = 50;

/// 初始位置距屏幕顶部的距离（像素）
pub const TOP_OFFSET: i32 = 20;

/// 最小化到托盘的提示时长
pub const MINIMIZE_NOTICE: Duration = Duration::from_millis(2000);

/// 切换置顶的提示时长
pub const TOGGLE_NOTICE: Duration = Duration::from_millis(1000);

/// 面板样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PanelVariant {
    /// 420×70，数值在上、标签在下，网络速率前导零暗色显示
    #[default]
    Compact,
    /// 700×80，单行排列，网络速率不补零
    Wide,
}

/// 面板配置
#[derive(Debug, Clone, PartialEq)]
pub struct HudConfig {
    /// 面板样式
    pub variant: PanelVariant,
    /// 窗口标题，同时用于托盘提示
    pub title: &'static str,
    /// 固定窗口尺寸（像素）
    pub size: Size,
    /// 初始水平位置：剩余宽度除以该比例
    pub placement_ratio: f64,
    /// 初始位置距屏幕顶部的距离（像素）
    pub top_offset: i32,
    /// 网络速率装饰模式
    pub decoration: DecorationMode,
    /// 采样周期
    pub tick_interval: Duration,
    /// 贴边阈值（像素），分别作用于水平与垂直方向
    pub edge_threshold: Size,
}

impl Default for HudConfig {
    #[inline]
    fn default() -> Self {
        Self::for_variant(PanelVariant::default())
    }
}

impl From<PanelVariant> for HudConfig {
    #[inline]
    fn from(variant: PanelVariant) -> Self {
        Self::for_variant(variant)
    }
}

impl HudConfig {
    /// 按面板样式构建配置
    pub fn for_variant(variant: PanelVariant) -> Self {
        let (title, size, placement_ratio, decoration) = match variant {
            PanelVariant::Compact => (
                "SYSTEM HUD",
                Size::new(420, 70),
                1.2,
                DecorationMode::Dimmed,
            ),
            PanelVariant::Wide => (
                "Stark Panel",
                Size::new(700, 80),
                2.0,
                DecorationMode::Plain,
            ),
        };

        Self {
            variant,
            title,
            size,
            placement_ratio,
            top_offset: TOP_OFFSET,
            decoration,
            tick_interval: TICK_INTERVAL,
            edge_threshold: Size::new(EDGE_THRESHOLD, EDGE_THRESHOLD),
        }
    }
}
