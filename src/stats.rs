use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// 默认的 procfs 挂载点
pub const PROC_ROOT: &str = "/proc";

/// CPU 时间统计（单位：jiffies）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// 总时间（guest 已计入 user，不重复累加）
    #[inline]
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// 空闲时间，包含等待 IO 的时间
    #[inline]
    pub fn idle_all(&self) -> u64 {
        self.idle + self.iowait
    }

    /// 相对于 `previous` 的 CPU 使用率，范围 0-100
    pub fn usage_since(&self, previous: &CpuTimes) -> f64 {
        let total_diff = self.total().saturating_sub(previous.total());
        let idle_diff = self.idle_all().saturating_sub(previous.idle_all());

        if total_diff == 0 {
            return 0.0;
        }

        let usage = 100.0 * (1.0 - idle_diff as f64 / total_diff as f64);
        usage.clamp(0.0, 100.0)
    }
}

/// 单次采样结果
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub cpu_percent: f64,      // CPU 使用率 (0-100)
    pub mem_percent: f64,      // 内存使用率 (0-100)
    pub bytes_sent_total: u64, // 累计发送字节数
    pub bytes_recv_total: u64, // 累计接收字节数
    pub taken_at: Instant,     // 采样时间戳
}

impl Sample {
    #[inline]
    pub fn new(
        cpu_percent: f64,
        mem_percent: f64,
        bytes_sent_total: u64,
        bytes_recv_total: u64,
    ) -> Self {
        Self {
            cpu_percent,
            mem_percent,
            bytes_sent_total,
            bytes_recv_total,
            taken_at: Instant::now(),
        }
    }
}

/// 系统资源获取错误类型
///
/// 所有变体都表示本次 tick 统计源不可用，调用方不应因此中断 tick 循环。
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("解析错误: {0}")]
    Parse(String),
    #[error("不支持的平台")]
    UnsupportedPlatform,
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// 操作系统指标来源
#[allow(async_fn_in_trait)]
pub trait VitalsSource {
    /// 自上次调用以来的 CPU 使用率 (0-100)
    async fn current_cpu_percent(&mut self) -> Result<f64>;

    /// 当前内存使用率 (0-100)
    async fn current_memory_percent(&mut self) -> Result<f64>;

    /// 累计网络字节数 `(bytes_sent, bytes_recv)`
    async fn current_network_counters(&mut self) -> Result<(u64, u64)>;
}

/// 基于 procfs 的指标来源
#[derive(Debug)]
pub struct ProcSource {
    root: PathBuf,
    previous_cpu: Option<CpuTimes>,
}

impl Default for ProcSource {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ProcSource {
    /// 读取系统 `/proc`
    #[inline]
    pub fn new() -> Self {
        Self::with_root(PROC_ROOT)
    }

    /// 从指定目录读取，目录结构与 `/proc` 相同
    #[inline]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            previous_cpu: None,
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read(&self, name: &str) -> Result<String> {
        if cfg!(not(target_os = "linux")) && self.root == Path::new(PROC_ROOT) {
            return Err(StatsError::UnsupportedPlatform);
        }

        let content = tokio::fs::read_to_string(self.root.join(name)).await?;
        Ok(content)
    }
}

impl VitalsSource for ProcSource {
    async fn current_cpu_percent(&mut self) -> Result<f64> {
        let content = self.read("stat").await?;
        let current = parse_cpu_times(&content)?;

        // 第一次调用没有基准，返回 0
        let usage = match self.previous_cpu {
            Some(previous) => current.usage_since(&previous),
            None => 0.0,
        };
        self.previous_cpu = Some(current);

        Ok(usage)
    }

    async fn current_memory_percent(&mut self) -> Result<f64> {
        let content = self.read("meminfo").await?;
        let info = parse_meminfo(&content)?;
        Ok(info.used_percent())
    }

    async fn current_network_counters(&mut self) -> Result<(u64, u64)> {
        let content = self.read("net/dev").await?;
        parse_net_dev(&content)
    }
}

/// 采样器：每个 tick 调用一次 [`Sampler::sample`]
#[derive(Debug)]
pub struct Sampler<S> {
    source: S,
}

impl<S: VitalsSource> Sampler<S> {
    #[inline]
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// 读取一次完整的系统指标
    pub async fn sample(&mut self) -> Result<Sample> {
        let cpu_percent = self.source.current_cpu_percent().await?;
        let mem_percent = self.source.current_memory_percent().await?;
        let (bytes_sent_total, bytes_recv_total) = self.source.current_network_counters().await?;

        Ok(Sample {
            cpu_percent,
            mem_percent,
            bytes_sent_total,
            bytes_recv_total,
            taken_at: Instant::now(),
        })
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }
}

/// 内存信息结构（字节）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
}

impl MemoryInfo {
    /// 已用内存占比 = (总内存 - 可用内存) / 总内存
    pub fn used_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let used = self.total.saturating_sub(self.available);
        (used as f64 / self.total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// 解析 `/proc/stat` 首行的 CPU 总时间
pub fn parse_cpu_times(content: &str) -> Result<CpuTimes> {
    let first_line = content
        .lines()
        .next()
        .ok_or_else(|| StatsError::Parse("/proc/stat 为空".to_string()))?;

    let mut parts = first_line.split_whitespace();
    if parts.next() != Some("cpu") {
        return Err(StatsError::Parse(format!("无法识别的 CPU 行: {first_line}")));
    }

    let mut fields = [0u64; 8];
    for (slot, raw) in fields.iter_mut().zip(parts) {
        *slot = raw
            .parse()
            .map_err(|_| StatsError::Parse(format!("无效的 CPU 时间: {raw}")))?;
    }

    // 旧内核缺少的字段保持为 0
    let [user, nice, system, idle, iowait, irq, softirq, steal] = fields;
    Ok(CpuTimes {
        user,
        nice,
        system,
        idle,
        iowait,
        irq,
        softirq,
        steal,
    })
}

/// 解析 `/proc/meminfo`
pub fn parse_meminfo(content: &str) -> Result<MemoryInfo> {
    let mut total = None;
    let mut available = None;
    let mut free = 0;
    let mut buffers = 0;
    let mut cached = 0;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            let Ok(value) = value.parse::<u64>() else {
                continue;
            };
            let value = value.saturating_mul(1024); // 转换为字节

            match key {
                "MemTotal:" => total = Some(value),
                "MemAvailable:" => available = Some(value),
                "MemFree:" => free = value,
                "Buffers:" => buffers = value,
                "Cached:" => cached = value,
                _ => {}
            }
        }
    }

    let total = total
        .filter(|&t| t > 0)
        .ok_or_else(|| StatsError::Parse("/proc/meminfo 缺少 MemTotal".to_string()))?;

    // 没有 MemAvailable 的旧内核用 空闲 + 缓冲 + 缓存 估算
    let available = available
        .unwrap_or(free.saturating_add(buffers).saturating_add(cached))
        .min(total);

    Ok(MemoryInfo { total, available })
}

/// 解析 `/proc/net/dev`，返回所有网卡累计的 `(发送字节, 接收字节)`
pub fn parse_net_dev(content: &str) -> Result<(u64, u64)> {
    let mut sent = 0u64;
    let mut recv = 0u64;

    for line in content.lines() {
        // 表头两行没有冒号
        let Some((iface, counters)) = line.split_once(':') else {
            continue;
        };

        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() < 9 {
            return Err(StatsError::Parse(format!(
                "网卡 {} 的字段数不足: {}",
                iface.trim(),
                fields.len()
            )));
        }

        let parse = |raw: &str| {
            raw.parse::<u64>()
                .map_err(|_| StatsError::Parse(format!("无效的字节计数: {raw}")))
        };
        recv = recv.wrapping_add(parse(fields[0])?);
        sent = sent.wrapping_add(parse(fields[8])?);
    }

    Ok((sent, recv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const STAT_1: &str = "cpu  100 0 100 700 100 0 0 0 0 0\ncpu0 50 0 50 350 50 0 0 0 0 0\n";
    const STAT_2: &str = "cpu  200 0 200 1300 100 0 0 0 0 0\ncpu0 100 0 100 650 50 0 0 0 0 0\n";

    const MEMINFO: &str = "MemTotal:       16000000 kB\n\
                           MemFree:         2000000 kB\n\
                           MemAvailable:    4000000 kB\n\
                           Buffers:          500000 kB\n\
                           Cached:          3000000 kB\n";

    const NET_DEV: &str = "Inter-|   Receive                                                |  Transmit\n \
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n    \
    lo:    1000      10    0    0    0     0          0         0     1000      10    0    0    0     0       0          0\n  \
  eth0: 5000000    4000    0    0    0     0          0         0   250000    2000    0    0    0     0       0          0\n";

    fn fake_proc(stat: &str, meminfo: &str, net_dev: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("stat"), stat).unwrap();
        fs::write(dir.path().join("meminfo"), meminfo).unwrap();
        fs::create_dir(dir.path().join("net")).unwrap();
        fs::write(dir.path().join("net").join("dev"), net_dev).unwrap();
        dir
    }

    #[test]
    fn test_cpu_times_default() {
        let times = CpuTimes::default();
        assert_eq!(times.total(), 0);
        assert_eq!(times.idle_all(), 0);
    }

    #[test]
    fn test_parse_cpu_times_valid() {
        let times = parse_cpu_times("cpu  1234 567 890 1234 10 1 2 3 0 0").unwrap();
        assert_eq!(times.user, 1234);
        assert_eq!(times.nice, 567);
        assert_eq!(times.system, 890);
        assert_eq!(times.idle, 1234);
        assert_eq!(times.iowait, 10);
        assert_eq!(times.steal, 3);
        assert_eq!(times.total(), 1234 + 567 + 890 + 1234 + 10 + 1 + 2 + 3);
        assert_eq!(times.idle_all(), 1244);
    }

    #[test]
    fn test_parse_cpu_times_short_line() {
        // 旧内核只有四个字段
        let times = parse_cpu_times("cpu 1 2 3 4").unwrap();
        assert_eq!(times.total(), 10);
        assert_eq!(times.iowait, 0);
    }

    #[test]
    fn test_parse_cpu_times_invalid() {
        assert!(matches!(
            parse_cpu_times("invalid content"),
            Err(StatsError::Parse(_))
        ));
        assert!(matches!(
            parse_cpu_times("cpu 1 x 3 4"),
            Err(StatsError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_cpu_times_empty() {
        assert!(parse_cpu_times("").is_err());
    }

    #[test]
    fn test_cpu_usage_since() {
        let first = parse_cpu_times(STAT_1).unwrap();
        let second = parse_cpu_times(STAT_2).unwrap();
        // 总增量 800，空闲增量 600
        assert_eq!(second.usage_since(&first), 25.0);
        // 计数器未变化时为 0
        assert_eq!(first.usage_since(&first), 0.0);
        // 计数器回退不会产生负值
        assert_eq!(first.usage_since(&second), 0.0);
    }

    #[test]
    fn test_parse_meminfo() {
        let info = parse_meminfo(MEMINFO).unwrap();
        assert_eq!(info.total, 16_000_000 * 1024);
        assert_eq!(info.available, 4_000_000 * 1024);
        assert_eq!(info.used_percent(), 75.0);
    }

    #[test]
    fn test_parse_meminfo_without_available() {
        let content = "MemTotal: 1000 kB\nMemFree: 100 kB\nBuffers: 100 kB\nCached: 300 kB\n";
        let info = parse_meminfo(content).unwrap();
        assert_eq!(info.available, 500 * 1024);
        assert_eq!(info.used_percent(), 50.0);
    }

    #[test]
    fn test_parse_meminfo_missing_total() {
        assert!(matches!(
            parse_meminfo("MemFree: 100 kB\n"),
            Err(StatsError::Parse(_))
        ));
        assert!(parse_meminfo("").is_err());
    }

    #[test]
    fn test_parse_meminfo_huge_values_saturate() {
        let content = format!(
            "MemTotal: {max} kB\nMemFree: {max} kB\nBuffers: {max} kB\nCached: {max} kB\n",
            max = u64::MAX
        );
        let info = parse_meminfo(&content).unwrap();
        assert_eq!(info.total, u64::MAX);
        assert_eq!(info.available, u64::MAX);
        assert_eq!(info.used_percent(), 0.0);
    }

    #[test]
    fn test_parse_net_dev_sums_all_interfaces() {
        let (sent, recv) = parse_net_dev(NET_DEV).unwrap();
        assert_eq!(sent, 1000 + 250_000);
        assert_eq!(recv, 1000 + 5_000_000);
    }

    #[test]
    fn test_parse_net_dev_headers_only() {
        let headers: String = NET_DEV.lines().take(2).collect::<Vec<_>>().join("\n");
        assert_eq!(parse_net_dev(&headers).unwrap(), (0, 0));
    }

    #[test]
    fn test_parse_net_dev_truncated_line() {
        assert!(matches!(
            parse_net_dev("eth0: 1 2 3"),
            Err(StatsError::Parse(_))
        ));
    }

    #[test]
    fn test_stats_error_display() {
        let io_error = StatsError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "test error",
        ));
        assert_eq!(format!("{}", io_error), "IO 错误: test error");

        let parse_error = StatsError::Parse("test parse error".to_string());
        assert_eq!(format!("{}", parse_error), "解析错误: test parse error");

        assert_eq!(format!("{}", StatsError::UnsupportedPlatform), "不支持的平台");
    }

    #[test]
    fn test_stats_error_from_io() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        match StatsError::from(io_error) {
            StatsError::Io(_) => {} // 预期的类型
            other => panic!("应该是 Io 类型: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_proc_source_reads_fake_root() {
        let dir = fake_proc(STAT_1, MEMINFO, NET_DEV);
        let mut source = ProcSource::with_root(dir.path());

        // 第一次没有基准
        assert_eq!(source.current_cpu_percent().await.unwrap(), 0.0);

        fs::write(dir.path().join("stat"), STAT_2).unwrap();
        assert_eq!(source.current_cpu_percent().await.unwrap(), 25.0);

        assert_eq!(source.current_memory_percent().await.unwrap(), 75.0);
        assert_eq!(
            source.current_network_counters().await.unwrap(),
            (251_000, 5_001_000)
        );
    }

    #[tokio::test]
    async fn test_proc_source_missing_files() {
        let dir = TempDir::new().unwrap();
        let mut source = ProcSource::with_root(dir.path());
        assert!(matches!(
            source.current_cpu_percent().await,
            Err(StatsError::Io(_))
        ));
        assert!(source.current_network_counters().await.is_err());
    }

    #[tokio::test]
    async fn test_sampler_builds_sample() {
        let dir = fake_proc(STAT_1, MEMINFO, NET_DEV);
        let mut sampler = Sampler::new(ProcSource::with_root(dir.path()));

        let sample = sampler.sample().await.unwrap();
        assert_eq!(sample.cpu_percent, 0.0);
        assert_eq!(sample.mem_percent, 75.0);
        assert_eq!(sample.bytes_sent_total, 251_000);
        assert_eq!(sample.bytes_recv_total, 5_001_000);
        assert_eq!(sampler.source().root(), dir.path());
    }

    #[test]
    fn test_sampler_outside_async_context() {
        let dir = fake_proc(STAT_1, MEMINFO, NET_DEV);
        let mut sampler = Sampler::new(ProcSource::with_root(dir.path()));
        let sample = tokio_test::block_on(sampler.sample()).unwrap();
        assert_eq!(sample.bytes_sent_total, 251_000);
    }

    #[tokio::test]
    async fn test_sampler_propagates_unavailable() {
        let dir = fake_proc(STAT_1, "garbage", NET_DEV);
        let mut sampler = Sampler::new(ProcSource::with_root(dir.path()));
        assert!(matches!(sampler.sample().await, Err(StatsError::Parse(_))));
    }

    #[tokio::test]
    #[cfg(target_os = "linux")]
    async fn test_collect_linux_stats() {
        // 在某些环境中可能失败，这是可以接受的
        let mut sampler = Sampler::new(ProcSource::new());
        match sampler.sample().await {
            Ok(sample) => {
                assert!((0.0..=100.0).contains(&sample.cpu_percent));
                assert!((0.0..=100.0).contains(&sample.mem_percent));
            }
            Err(e) => println!("收集系统统计失败: {}", e),
        }
    }

    #[tokio::test]
    #[cfg(not(target_os = "linux"))]
    async fn test_collect_stats_unsupported() {
        let mut sampler = Sampler::new(ProcSource::new());
        assert!(matches!(
            sampler.sample().await,
            Err(StatsError::UnsupportedPlatform)
        ));
    }
}
