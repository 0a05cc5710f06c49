/// 機能別モジュール
///
/// 各機能モジュールは、その機能に関連するすべてのコード（モデル、通信、キャッシュ、サービス）
/// を含む自己完結型のユニットです。
pub mod expenses;
