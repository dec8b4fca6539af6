//! 显示字符串格式化
//!
//! 把采样结果变成固定宽度的展示文本：百分比截断取整，网络速率在 KB/s 与
//! MB/s 之间切换，可选地把前导零渲染为暗色。

use crate::stats::Sample;
use std::fmt;
use std::time::Duration;

/// 统计源不可用且尚无可显示数据时的占位符
pub const PLACEHOLDER: &str = "—";

const KIB: f64 = 1024.0;

/// 暗色模式下 KB/s 数字的固定位数
const DIMMED_WIDTH: usize = 4;

/// 两次采样之间的网络字节增量
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Throughput {
    pub up_bytes_per_tick: f64,
    pub down_bytes_per_tick: f64,
}

impl Throughput {
    /// 计算增量；计数器回退（重置或回绕）时记为 0
    pub fn between(current: &Sample, previous: &Sample) -> Self {
        Self {
            up_bytes_per_tick: current
                .bytes_sent_total
                .saturating_sub(previous.bytes_sent_total) as f64,
            down_bytes_per_tick: current
                .bytes_recv_total
                .saturating_sub(previous.bytes_recv_total) as f64,
        }
    }

    /// 按 tick 间隔换算为每秒字节数 `(上行, 下行)`
    pub fn per_second(&self, tick: Duration) -> (f64, f64) {
        let secs = tick.as_secs_f64();
        if secs <= 0.0 {
            return (self.up_bytes_per_tick, self.down_bytes_per_tick);
        }
        (
            self.up_bytes_per_tick / secs,
            self.down_bytes_per_tick / secs,
        )
    }
}

/// 网络速率的数值部分
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    /// 整数 KB/s，小于 1024
    Kilo(u64),
    /// MB/s
    Mega(f64),
}

impl Rate {
    pub fn from_bytes_per_second(bytes: f64) -> Self {
        let kilo = bytes.max(0.0) / KIB;
        if kilo < KIB {
            Rate::Kilo(kilo as u64)
        } else {
            Rate::Mega(kilo / KIB)
        }
    }
}

/// 网络速率的装饰模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecorationMode {
    /// "N KB/s" / "N.N MB/s"
    #[default]
    Plain,
    /// KB/s 补零到四位，前导零暗色显示
    Dimmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Dim,
    Bright,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub emphasis: Emphasis,
}

impl Span {
    #[inline]
    fn new(text: impl Into<String>, emphasis: Emphasis) -> Self {
        Self {
            text: text.into(),
            emphasis,
        }
    }
}

/// 带强调信息的速率文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedText {
    spans: Vec<Span>,
}

impl SpeedText {
    /// 整段为亮色的文本
    pub fn bright(text: impl Into<String>) -> Self {
        Self {
            spans: vec![Span::new(text, Emphasis::Bright)],
        }
    }

    #[inline]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// 暗色前缀
    pub fn dim_prefix(&self) -> &str {
        match self.spans.first() {
            Some(span) if span.emphasis == Emphasis::Dim => &span.text,
            _ => "",
        }
    }
}

impl fmt::Display for SpeedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for span in &self.spans {
            f.write_str(&span.text)?;
        }
        Ok(())
    }
}

/// 一次 tick 的全部显示文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayStrings {
    pub cpu: String,
    pub ram: String,
    pub up: SpeedText,
    pub down: SpeedText,
}

impl DisplayStrings {
    /// 没有任何数据时的占位显示
    pub fn placeholder() -> Self {
        Self {
            cpu: PLACEHOLDER.to_string(),
            ram: PLACEHOLDER.to_string(),
            up: SpeedText::bright(PLACEHOLDER),
            down: SpeedText::bright(PLACEHOLDER),
        }
    }

    /// 第一次 tick 之前的初始显示
    pub fn initial(mode: DecorationMode) -> Self {
        let zero = format_network(0.0, mode);
        Self {
            cpu: format_percent(0.0),
            ram: format_percent(0.0),
            up: zero.clone(),
            down: zero,
        }
    }
}

/// 百分比向零截断取整，例如 63.7 → "63%"
pub fn format_percent(percent: f64) -> String {
    let whole = percent.clamp(0.0, 100.0).trunc() as u64;
    format!("{whole}%")
}

/// KB/s 数值中亮色显示的位数
#[inline]
pub fn significant_digits(kilo: u64) -> usize {
    if kilo > 999 {
        4
    } else if kilo > 99 {
        3
    } else if kilo > 9 {
        2
    } else {
        1
    }
}

/// 把每秒字节数格式化为速率文本
pub fn format_network(bytes_per_second: f64, mode: DecorationMode) -> SpeedText {
    match (Rate::from_bytes_per_second(bytes_per_second), mode) {
        (Rate::Mega(mega), _) => SpeedText::bright(format!("{mega:.1} MB/s")),
        (Rate::Kilo(kilo), DecorationMode::Plain) => SpeedText::bright(format!("{kilo} KB/s")),
        (Rate::Kilo(kilo), DecorationMode::Dimmed) => {
            let digits = format!("{kilo:0width$}", width = DIMMED_WIDTH);
            let split = digits.len() - significant_digits(kilo);
            let (dim, bright) = digits.split_at(split);

            let mut spans = Vec::with_capacity(2);
            if !dim.is_empty() {
                spans.push(Span::new(dim, Emphasis::Dim));
            }
            spans.push(Span::new(format!("{bright} KB/s"), Emphasis::Bright));
            SpeedText { spans }
        }
    }
}

/// 格式化器：纯函数，不持有跨调用的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatter {
    mode: DecorationMode,
    tick: Duration,
}

impl Formatter {
    #[inline]
    pub fn new(mode: DecorationMode, tick: Duration) -> Self {
        Self { mode, tick }
    }

    /// 根据当前与上一次样本生成四个显示文本
    pub fn render(&self, current: &Sample, previous: &Sample) -> DisplayStrings {
        let (up, down) = Throughput::between(current, previous).per_second(self.tick);

        DisplayStrings {
            cpu: format_percent(current.cpu_percent),
            ram: format_percent(current.mem_percent),
            up: format_network(up, self.mode),
            down: format_network(down, self.mode),
        }
    }
}
