//! 系统资源 HUD 面板库
//!
//! 每秒采样一次 CPU、内存与网络吞吐，格式化为固定宽度的显示文本，
//! 并提供窗口拖动与贴边的状态机。外壳（终端渲染、托盘、菜单）只调用这里的接口。

pub mod cache;
pub mod config;
pub mod format;
pub mod hud;
pub mod position;
pub mod render;
pub mod shell;
pub mod stats;
pub mod terminal;

// 重新导出主要的公共类型
pub use cache::SampleCache;
pub use config::{HudConfig, PanelVariant};
pub use format::{DecorationMode, DisplayStrings, Formatter, format_network, format_percent};
pub use hud::HudCore;
pub use position::{Point, Positioner, Rect, snap_to_edge};
pub use shell::WindowMode;
pub use stats::{ProcSource, Sample, Sampler, StatsError, VitalsSource};
