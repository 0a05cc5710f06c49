//! 一覧取得リトライのバックオフ表

use std::time::Duration;

/// バックオフ設定
///
/// 初回の試行前にも`initial_delay`だけ待つ（バースト緩和）。
/// n回目（n ≥ 1）の試行前は`base_delay * 2^n`待つ。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffSchedule {
    /// 初回試行前の待機
    pub initial_delay: Duration,
    /// 指数バックオフの基準値
    pub base_delay: Duration,
    /// レート制限の通信エラー時に追加で待つ時間
    pub throttle_penalty: Duration,
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            base_delay: Duration::from_millis(500),
            throttle_penalty: Duration::from_secs(1),
        }
    }
}

impl BackoffSchedule {
    /// 試行番号（0始まり）に対する待機時間
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// 全試行分の待機時間の合計（追加待機は含まない）
    pub fn total_delay(&self, max_retries: u32) -> Duration {
        (0..=max_retries)
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
