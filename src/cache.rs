use crate::stats::Sample;

/// 上一次采样的缓存
///
/// 只保留紧邻的上一个样本，用于计算网络增量；不保存历史。
#[derive(Debug, Default)]
pub struct SampleCache {
    previous: Option<Sample>,
}

impl SampleCache {
    /// 创建新的缓存实例
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取上一次的样本
    #[inline]
    pub fn get(&self) -> Option<&Sample> {
        self.previous.as_ref()
    }

    /// 存入最新样本，返回被替换掉的上一个样本
    #[inline]
    pub fn update(&mut self, current: Sample) -> Option<Sample> {
        self.previous.replace(current)
    }

    /// 丢弃上一次的样本，下一次增量从零开始
    #[inline]
    pub fn invalidate(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic_operations() {
        let mut cache = SampleCache::new();

        // 初始状态应该返回 None
        assert!(cache.get().is_none());

        let replaced = cache.update(Sample::new(10.0, 20.0, 100, 200));
        assert!(replaced.is_none());

        let cached = cache.get().unwrap();
        assert_eq!(cached.cpu_percent, 10.0);
        assert_eq!(cached.bytes_recv_total, 200);
    }

    #[test]
    fn test_cache_returns_previous_on_update() {
        let mut cache = SampleCache::new();
        cache.update(Sample::new(10.0, 20.0, 100, 200));

        let previous = cache.update(Sample::new(30.0, 40.0, 300, 400)).unwrap();
        assert_eq!(previous.bytes_sent_total, 100);
        assert_eq!(cache.get().unwrap().bytes_sent_total, 300);
    }

    #[test]
    fn test_cache_invalidate() {
        let mut cache = SampleCache::new();
        cache.update(Sample::new(10.0, 20.0, 100, 200));
        assert!(cache.get().is_some());

        cache.invalidate();
        assert!(cache.get().is_none());

        // 失效后再次写入不会返回旧样本
        assert!(cache.update(Sample::new(0.0, 0.0, 1, 1)).is_none());
    }
}
