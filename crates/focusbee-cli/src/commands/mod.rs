pub mod block;
pub mod config;
pub mod quote;
pub mod sound;
pub mod task;
pub mod timer;

use std::rc::Rc;

use focusbee_core::{Config, Controller, Database, OffscreenPlayer, StoredRuleTable};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// The controller as the CLI runs it: state and installed rules in the
/// SQLite kv store, playback kept in-process.
pub type CliController = Controller<Rc<Database>, StoredRuleTable<Rc<Database>>, OffscreenPlayer>;

pub fn open_controller(config: Config) -> Result<CliController, Box<dyn std::error::Error>> {
    let db = Rc::new(Database::open()?);
    let rules = StoredRuleTable::new(Rc::clone(&db));
    Ok(Controller::new(db, rules, OffscreenPlayer::new(), config))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
