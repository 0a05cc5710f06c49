use keihi_client::shared::config::environment::{
    initialize_logging_system, load_environment_variables,
};
use keihi_client::{AppResult, ExpenseService};
use log::info;

/// コマンドライン引数から`--user <id>`を取り出す
fn parse_user_arg(args: &[String]) -> Option<String> {
    args.iter()
        .position(|arg| arg == "--user")
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> AppResult<()> {
    load_environment_variables();
    initialize_logging_system();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let user_id = parse_user_arg(&args);

    let service = ExpenseService::from_env()?;
    let expenses = service.list_expenses(user_id.as_deref()).await;

    let placeholders = expenses.iter().filter(|e| e.is_placeholder).count();
    info!(
        "経費一覧: count={}, placeholders={placeholders}",
        expenses.len()
    );

    println!("{}", serde_json::to_string_pretty(&expenses)?);
    Ok(())
}
