//! 経費一覧取得クライアント
//!
//! GraphQLバックエンドから経費一覧を取得し、短期キャッシュ・
//! レート制限時のバックオフ付きリトライ・部分的な欠損の復旧を行う。

pub mod features;
pub mod shared;

pub use features::expenses::{
    CreateExpenseDto, Expense, ExpenseService, ResilientListFetcher, UpdateExpenseDto,
};
pub use shared::errors::{AppError, AppResult};
