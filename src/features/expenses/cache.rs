//! 経費一覧の短期キャッシュ
//!
//! 単一スロットのキャッシュで、最後に書き込んだものが勝つ。
//! 同時に走る取得処理の重複排除は行わない。

use super::models::Expense;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// キャッシュエントリ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    /// キャッシュされた経費一覧
    pub data: Option<Vec<Expense>>,
    /// 最後に格納した時刻（`None`は未格納）
    pub timestamp: Option<Instant>,
    /// データ取得時のユーザーID
    pub user_id: Option<String>,
}

impl CacheEntry {
    /// 取得結果からエントリを作成
    pub fn new(user_id: &str, data: Vec<Expense>) -> Self {
        Self {
            data: Some(data),
            timestamp: Some(Instant::now()),
            user_id: Some(user_id.to_string()),
        }
    }

    /// 有効期間内かどうか
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.timestamp
            .map(|stored_at| stored_at.elapsed() < ttl)
            .unwrap_or(false)
    }

    /// 有効期間内であればデータを返す
    pub fn fresh_data(&self, ttl: Duration) -> Option<&Vec<Expense>> {
        if self.is_fresh(ttl) {
            self.data.as_ref()
        } else {
            None
        }
    }
}

/// キャッシュストア
pub trait CacheStore: Send + Sync {
    /// 指定ユーザーのエントリを取得（ユーザーIDが一致しなければ`None`）
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// エントリを格納（既存のエントリは上書き）
    fn set(&self, key: &str, entry: CacheEntry);

    /// キャッシュを無効化
    fn clear(&self);
}

/// メモリ上の単一スロットキャッシュ
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    slot: Mutex<CacheEntry>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheEntry> {
        // キャッシュは最適化にすぎないため、ポイズニングされても中身をそのまま使う
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 現在のスロットの内容を取得
    pub fn snapshot(&self) -> CacheEntry {
        self.lock().clone()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let slot = self.lock();
        if slot.user_id.as_deref() == Some(key) {
            Some(slot.clone())
        } else {
            None
        }
    }

    fn set(&self, key: &str, mut entry: CacheEntry) {
        entry.user_id = Some(key.to_string());
        *self.lock() = entry;
    }

    fn clear(&self) {
        *self.lock() = CacheEntry::default();
    }
}
