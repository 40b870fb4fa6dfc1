use std::fmt;
use std::time::Duration;

use super::timer::AccTimer;
use super::{ArtifactStore, Stage};

/// 单轮运行结果.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PassOutcome {
    /// 所有阶段均返回 `true`.
    Completed,

    /// 非首个阶段返回 `false`, 本轮余下阶段被跳过.
    Aborted {
        /// 中止本轮的阶段名称.
        stage: String,
    },

    /// 首个阶段返回 `false`: 没有更多病例. 空流水线同样视为已耗尽.
    Exhausted,
}

/// 完整运行的统计.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// 处理过的病例数, 即未耗尽的轮数.
    pub passes: usize,

    /// 正常完成的轮数.
    pub completed: usize,

    /// 被中止的轮数.
    pub aborted: usize,

    /// 各阶段累计耗时, 按阶段顺序排列.
    pub stage_time: Vec<(String, Duration)>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} cases: {} completed, {} aborted",
            self.passes, self.completed, self.aborted
        )?;
        for (name, d) in self.stage_time.iter() {
            writeln!(f, "  {name:<24} {d:.3?}")?;
        }
        Ok(())
    }
}

/// 阶段流水线. 持有有序的阶段列表与共享的产物仓库.
pub struct StageRunner {
    stages: Vec<Box<dyn Stage>>,
    timers: Vec<AccTimer>,
    store: ArtifactStore,
    show_stage_time: bool,
}

impl Default for StageRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRunner {
    /// 空流水线. 默认记录各阶段耗时.
    pub fn new() -> Self {
        Self {
            stages: vec![],
            timers: vec![],
            store: ArtifactStore::new(),
            show_stage_time: true,
        }
    }

    /// 是否在日志中输出每个阶段的耗时.
    #[inline]
    pub fn show_stage_time(mut self, show: bool) -> Self {
        self.show_stage_time = show;
        self
    }

    /// 在末尾追加一个阶段.
    pub fn push<S: Stage + 'static>(&mut self, stage: S) {
        self.push_boxed(Box::new(stage));
    }

    /// 在末尾追加一个已装箱的阶段.
    pub fn push_boxed(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
        self.timers.push(AccTimer::new());
    }

    /// 在末尾追加一个阶段, 链式调用.
    #[inline]
    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.push(stage);
        self
    }

    /// 阶段个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// 是否没有任何阶段.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// 共享的产物仓库.
    #[inline]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// 运行一轮: 依次调用各阶段, 任一阶段返回 `false` 即停止本轮.
    pub fn run_once(&mut self) -> PassOutcome {
        if self.stages.is_empty() {
            return PassOutcome::Exhausted;
        }
        for (i, (stage, timer)) in self.stages.iter_mut().zip(self.timers.iter_mut()).enumerate() {
            timer.start();
            let go_on = stage.process(&mut self.store);
            let d = timer.elapsed();
            if self.show_stage_time {
                log::info!("Stage `{}` took {d:.3?}", stage.name());
            }
            if !go_on {
                if i == 0 {
                    return PassOutcome::Exhausted;
                }
                log::info!("Stage `{}` aborted this pass", stage.name());
                return PassOutcome::Aborted {
                    stage: stage.name().to_owned(),
                };
            }
        }
        PassOutcome::Completed
    }

    /// 反复运行, 直到首个阶段报告没有更多病例.
    pub fn run_to_completion(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        loop {
            match self.run_once() {
                PassOutcome::Completed => summary.completed += 1,
                PassOutcome::Aborted { .. } => summary.aborted += 1,
                PassOutcome::Exhausted => break,
            }
            summary.passes += 1;
            log::info!("Pass {} finished", summary.passes);
        }
        summary.stage_time = self
            .stages
            .iter()
            .zip(self.timers.iter())
            .map(|(s, t)| (s.name().to_owned(), t.total()))
            .collect();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::{PassOutcome, StageRunner};
    use crate::pipeline::{ArtifactStore, Stage};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    /// 前 `n` 次返回 `true` 的数据源.
    struct Countdown {
        left: usize,
        journal: Journal,
    }

    impl Stage for Countdown {
        fn name(&self) -> &str {
            "countdown"
        }

        fn process(&mut self, _: &mut ArtifactStore) -> bool {
            self.journal.borrow_mut().push(format!("source:{}", self.left));
            if self.left == 0 {
                return false;
            }
            self.left -= 1;
            true
        }
    }

    /// 在第 `fail_at` 次调用时返回 `false`.
    struct Flaky {
        calls: usize,
        fail_at: usize,
        journal: Journal,
    }

    impl Stage for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn process(&mut self, _: &mut ArtifactStore) -> bool {
            self.calls += 1;
            self.journal.borrow_mut().push(format!("flaky:{}", self.calls));
            self.calls != self.fail_at
        }
    }

    struct Tail(Journal);

    impl Stage for Tail {
        fn name(&self) -> &str {
            "tail"
        }

        fn process(&mut self, _: &mut ArtifactStore) -> bool {
            self.0.borrow_mut().push("tail".to_owned());
            true
        }
    }

    fn runner(cases: usize, fail_at: usize, journal: &Journal) -> StageRunner {
        StageRunner::new()
            .show_stage_time(false)
            .stage(Countdown {
                left: cases,
                journal: journal.clone(),
            })
            .stage(Flaky {
                calls: 0,
                fail_at,
                journal: journal.clone(),
            })
            .stage(Tail(journal.clone()))
    }

    #[test]
    fn test_empty_runner_is_exhausted() {
        let mut r = StageRunner::new();
        assert!(r.is_empty());
        assert_eq!(r.run_once(), PassOutcome::Exhausted);
        assert_eq!(r.run_to_completion().passes, 0);
    }

    #[test]
    fn test_abort_skips_rest_of_pass_only() {
        let journal = Journal::default();
        let mut r = runner(3, 2, &journal);
        assert_eq!(r.len(), 3);
        let summary = r.run_to_completion();
        assert_eq!(summary.passes, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.aborted, 1);
        assert_eq!(
            *journal.borrow(),
            [
                "source:3", "flaky:1", "tail", "source:2", "flaky:2", "source:1", "flaky:3",
                "tail", "source:0",
            ]
        );
        let names: Vec<_> = summary.stage_time.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["countdown", "flaky", "tail"]);
    }

    #[test]
    fn test_run_once_outcomes() {
        let journal = Journal::default();
        let mut r = runner(2, 1, &journal);
        assert_eq!(
            r.run_once(),
            PassOutcome::Aborted {
                stage: "flaky".to_owned()
            }
        );
        assert_eq!(r.run_once(), PassOutcome::Completed);
        assert_eq!(r.run_once(), PassOutcome::Exhausted);
        // 耗尽后再次调用仍然耗尽.
        assert_eq!(r.run_once(), PassOutcome::Exhausted);
    }
}
