use chrono::{Local, NaiveDate};
use clap::Args;
use focusbee_core::quote;

use super::CliResult;

#[derive(Args)]
pub struct QuoteArgs {
    /// Day to pick the quote for (YYYY-MM-DD), today by default
    #[arg(long)]
    date: Option<NaiveDate>,
}

pub fn run(args: QuoteArgs) -> CliResult {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    println!("{}", quote::daily(&quote::builtin(), date));
    Ok(())
}
