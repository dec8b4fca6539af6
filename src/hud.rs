//! 面板核心：外壳每个 tick 与每个鼠标事件都调用这里

use crate::cache::SampleCache;
use crate::config::HudConfig;
use crate::format::{DisplayStrings, Formatter};
use crate::position::{MouseButton, Point, Positioner, PressOutcome, Rect};
use crate::stats::{Sampler, VitalsSource};
use log::{debug, info, warn};

/// 采样器 + 格式化器 + 定位器
#[derive(Debug)]
pub struct HudCore<S> {
    sampler: Sampler<S>,
    cache: SampleCache,
    formatter: Formatter,
    positioner: Positioner,
    last_display: Option<DisplayStrings>,
}

impl<S: VitalsSource> HudCore<S> {
    pub fn new(source: S, config: &HudConfig) -> Self {
        Self {
            sampler: Sampler::new(source),
            cache: SampleCache::new(),
            formatter: Formatter::new(config.decoration, config.tick_interval),
            positioner: Positioner::new(config.edge_threshold),
            last_display: None,
        }
    }

    /// 建立网络计数器与 CPU 的基准，第一次 tick 才有一个完整周期的增量
    pub async fn prime(&mut self) -> bool {
        match self.sampler.sample().await {
            Ok(sample) => {
                self.cache.update(sample);
                info!("采样基准已建立");
                true
            }
            Err(e) => {
                warn!("建立采样基准失败: {e}");
                false
            }
        }
    }

    /// 每个 tick 调用一次
    ///
    /// 统计源不可用时保留上一次的显示内容；从未成功过则返回占位符。
    pub async fn on_tick(&mut self) -> DisplayStrings {
        match self.sampler.sample().await {
            Ok(current) => {
                let previous = self.cache.update(current.clone());
                let display = self
                    .formatter
                    .render(&current, previous.as_ref().unwrap_or(&current));

                debug!(
                    "CPU {} RAM {} ↑ {} ↓ {}",
                    display.cpu, display.ram, display.up, display.down
                );
                self.last_display = Some(display.clone());
                display
            }
            Err(e) => {
                warn!("统计源不可用，保留上一次的显示: {e}");
                // 下一次成功的增量不能跨两个周期
                self.cache.invalidate();
                self.last_display
                    .clone()
                    .unwrap_or_else(DisplayStrings::placeholder)
            }
        }
    }

    #[inline]
    pub fn on_mouse_down(&mut self, global: Point, button: MouseButton) -> PressOutcome {
        self.positioner.press(global, button)
    }

    #[inline]
    pub fn on_mouse_move(
        &mut self,
        origin: Point,
        global: Point,
        left_held: bool,
    ) -> Option<Point> {
        self.positioner.drag_to(origin, global, left_held)
    }

    #[inline]
    pub fn on_mouse_up(&mut self, window: Rect, screen: Rect) -> Point {
        self.positioner.release(window, screen)
    }

    #[inline]
    pub fn last_display(&self) -> Option<&DisplayStrings> {
        self.last_display.as_ref()
    }

    #[inline]
    pub fn positioner(&self) -> &Positioner {
        &self.positioner
    }
}
