use std::time::{Duration, Instant};

/// 阶段计时器, 支持多次开始/结束并累计.
#[derive(Clone, Debug)]
pub(crate) struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时.
    #[inline]
    pub fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    pub fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本次计时时长.
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    pub fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计时长.
    #[inline]
    pub fn total(&self) -> Duration {
        self.consumed
    }
}

impl Default for AccTimer {
    fn default() -> Self {
        Self::new()
    }
}
