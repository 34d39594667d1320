//! ArgMatches → Action conversion.

use chatkv::{FileId, KeyOrder};
use clap::ArgMatches;

/// A parsed command, ready to run against a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MapGet { key: String },
    MapSet { key: String, value: String },
    CounterGet { id: FileId, extra: Option<String> },
    CounterSet { id: FileId, extra: Option<String>, value: i64 },
    CounterInc { id: FileId, extra: Option<String> },
    CounterDec { id: FileId, extra: Option<String> },
    FlagSet { id: FileId, key: String, extra: Option<String> },
    FlagClear { id: FileId, key: String, extra: Option<String> },
    FlagCheck { id: FileId, key: String, extra: Option<String> },
    ListAdd { id: FileId, key: Option<String>, value: i32 },
    ListRemove { id: FileId, key: Option<String>, value: i32 },
    ListContains { id: FileId, key: Option<String>, value: i32 },
    ListShow { id: FileId, key: Option<String> },
    TreeInsert { ns: FileId, orders: Option<Vec<KeyOrder>>, key: Vec<String>, data: String },
    TreeDelete { ns: FileId, orders: Option<Vec<KeyOrder>>, key: Vec<String> },
    TreeGet { ns: FileId, orders: Option<Vec<KeyOrder>>, key: Vec<String> },
    TreeList { ns: FileId, orders: Option<Vec<KeyOrder>> },
    TreeTop { ns: FileId, n: usize },
    TreeSize { ns: FileId },
    Compact,
}

/// Convert clap ArgMatches into an Action.
pub fn matches_to_action(matches: &ArgMatches) -> Result<Action, String> {
    let (sub_name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "map" => parse_map(sub_matches),
        "counter" => parse_counter(sub_matches),
        "flag" => parse_flag(sub_matches),
        "list" => parse_list(sub_matches),
        "tree" => parse_tree(sub_matches),
        "compact" => Ok(Action::Compact),
        other => Err(format!("Unknown command: {}", other)),
    }
}

// =========================================================================
// Argument helpers
// =========================================================================

fn string(m: &ArgMatches, name: &str) -> Result<String, String> {
    m.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("Missing argument: {}", name))
}

fn number<T: Clone + Send + Sync + 'static>(m: &ArgMatches, name: &str) -> Result<T, String> {
    m.get_one::<T>(name)
        .cloned()
        .ok_or_else(|| format!("Missing argument: {}", name))
}

fn id(m: &ArgMatches, name: &str) -> Result<FileId, String> {
    number::<u64>(m, name).map(FileId)
}

fn key_parts(m: &ArgMatches) -> Vec<String> {
    m.get_many::<String>("key")
        .map(|parts| parts.cloned().collect())
        .unwrap_or_default()
}

/// Comparators from `--order`, if given. `None` defers to the orders the
/// tree was created with.
fn orders(m: &ArgMatches, arity: usize) -> Result<Option<Vec<KeyOrder>>, String> {
    let Some(raw) = m.get_one::<String>("order") else {
        return Ok(None);
    };
    let orders = KeyOrder::parse_list(raw)?;
    if arity > 0 && orders.len() != arity {
        return Err(format!(
            "--order names {} components but the key has {}",
            orders.len(),
            arity
        ));
    }
    Ok(Some(orders))
}

// =========================================================================
// Fields
// =========================================================================

fn parse_map(matches: &ArgMatches) -> Result<Action, String> {
    let (sub, m) = matches.subcommand().ok_or("No map subcommand")?;
    match sub {
        "get" => Ok(Action::MapGet {
            key: string(m, "key")?,
        }),
        "set" => Ok(Action::MapSet {
            key: string(m, "key")?,
            value: string(m, "value")?,
        }),
        other => Err(format!("Unknown map subcommand: {}", other)),
    }
}

fn parse_counter(matches: &ArgMatches) -> Result<Action, String> {
    let (sub, m) = matches.subcommand().ok_or("No counter subcommand")?;
    let id = id(m, "id")?;
    let extra = m.get_one::<String>("extra").cloned();
    match sub {
        "get" => Ok(Action::CounterGet { id, extra }),
        "set" => Ok(Action::CounterSet {
            id,
            extra,
            value: number(m, "value")?,
        }),
        "inc" => Ok(Action::CounterInc { id, extra }),
        "dec" => Ok(Action::CounterDec { id, extra }),
        other => Err(format!("Unknown counter subcommand: {}", other)),
    }
}

fn parse_flag(matches: &ArgMatches) -> Result<Action, String> {
    let (sub, m) = matches.subcommand().ok_or("No flag subcommand")?;
    let id = id(m, "id")?;
    let key = string(m, "key")?;
    let extra = m.get_one::<String>("extra").cloned();
    match sub {
        "set" => Ok(Action::FlagSet { id, key, extra }),
        "clear" => Ok(Action::FlagClear { id, key, extra }),
        "check" => Ok(Action::FlagCheck { id, key, extra }),
        other => Err(format!("Unknown flag subcommand: {}", other)),
    }
}

fn parse_list(matches: &ArgMatches) -> Result<Action, String> {
    let (sub, m) = matches.subcommand().ok_or("No list subcommand")?;
    let id = id(m, "id")?;
    let key = m.get_one::<String>("key").cloned();
    match sub {
        "add" => Ok(Action::ListAdd {
            id,
            key,
            value: number(m, "value")?,
        }),
        "remove" => Ok(Action::ListRemove {
            id,
            key,
            value: number(m, "value")?,
        }),
        "contains" => Ok(Action::ListContains {
            id,
            key,
            value: number(m, "value")?,
        }),
        "show" => Ok(Action::ListShow { id, key }),
        other => Err(format!("Unknown list subcommand: {}", other)),
    }
}

// =========================================================================
// Trees
// =========================================================================

fn parse_tree(matches: &ArgMatches) -> Result<Action, String> {
    let (sub, m) = matches.subcommand().ok_or("No tree subcommand")?;
    let ns = id(m, "ns")?;
    match sub {
        "insert" => {
            let key = key_parts(m);
            Ok(Action::TreeInsert {
                ns,
                orders: orders(m, key.len())?,
                data: string(m, "data")?,
                key,
            })
        }
        "delete" => {
            let key = key_parts(m);
            Ok(Action::TreeDelete {
                ns,
                orders: orders(m, key.len())?,
                key,
            })
        }
        "get" => {
            let key = key_parts(m);
            Ok(Action::TreeGet {
                ns,
                orders: orders(m, key.len())?,
                key,
            })
        }
        "list" => Ok(Action::TreeList {
            ns,
            orders: orders(m, 0)?,
        }),
        "top" => Ok(Action::TreeTop {
            ns,
            n: number(m, "n")?,
        }),
        "size" => Ok(Action::TreeSize { ns }),
        other => Err(format!("Unknown tree subcommand: {}", other)),
    }
}
