//! 所有远程调用共用的重试策略
//!
//! 只重试限流错误。其他错误立即结束循环并交还调用方，由调用方决定缓存为错误值还是跳过该条目。

use std::time::Duration;

use thiserror::Error;

use crate::error::PipelineError;

/// 两次尝试之间的阻塞等待
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// 让当前线程休眠
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * 2^attempt`
    Exponential { base: Duration },
    Fixed(Duration),
}

impl Backoff {
    /// 第 `attempt` 次（从 0 开始）失败后的等待时间
    pub fn delay(&self, attempt: usize) -> Duration {
        match *self {
            Backoff::Exponential { base } => {
                let factor = 1u32 << attempt.min(20);
                base.saturating_mul(factor)
            }
            Backoff::Fixed(delay) => delay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff: Backoff,
    cooldown_on_exhaustion: bool,
}

/// 重试放弃的原因
#[derive(Error, Debug, Clone)]
pub enum RetryError {
    /// 每次尝试都被限流
    #[error("gave up after {attempts} rate-limited attempts: {last}")]
    Exhausted {
        attempts: usize,
        last: PipelineError,
    },

    /// 不可重试的失败结束了循环
    #[error("{0}")]
    Aborted(PipelineError),
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            cooldown_on_exhaustion: false,
        }
    }

    /// 最后一次被限流后也等待一个退避间隔
    pub fn with_cooldown(mut self, cooldown_on_exhaustion: bool) -> Self {
        self.cooldown_on_exhaustion = cooldown_on_exhaustion;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        self.backoff.delay(attempt)
    }

    /// 反复执行 `operation`，直到成功、遇到非限流错误或用完尝试次数
    ///
    /// 闭包参数为从 0 开始的尝试序号。
    pub fn run<T, S, F>(&self, sleeper: &S, mut operation: F) -> Result<T, RetryError>
    where
        S: Sleeper + ?Sized,
        F: FnMut(usize) -> Result<T, PipelineError>,
    {
        let mut attempt = 0;
        loop {
            match operation(attempt) {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!("succeeded after {} retries", attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_rate_limit() => {
                    let delay = self.delay_for_attempt(attempt);
                    if attempt + 1 < self.max_attempts {
                        tracing::warn!(
                            "rate limit hit, retrying in {:.1} seconds (attempt {}/{})",
                            delay.as_secs_f32(),
                            attempt + 1,
                            self.max_attempts
                        );
                        sleeper.sleep(delay);
                        attempt += 1;
                        continue;
                    }

                    if self.cooldown_on_exhaustion {
                        tracing::warn!("rate limit hit, waiting {:.1} seconds", delay.as_secs_f32());
                        sleeper.sleep(delay);
                    }
                    return Err(RetryError::Exhausted {
                        attempts: attempt + 1,
                        last: e,
                    });
                }
                Err(e) => return Err(RetryError::Aborted(e)),
            }
        }
    }
}
