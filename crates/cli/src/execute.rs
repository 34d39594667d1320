//! Run actions against an open database and render their results.

use std::fmt;

use chatkv::{AvlTree, ChatKv, Error, FileId, KeyOrder, Result};
use tracing::debug;

use crate::parse::Action;

/// Result of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Ok,
    Nil,
    Text(String),
    Integer(i64),
    Bool(bool),
    List(Vec<String>),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Ok => write!(f, "OK"),
            Output::Nil => write!(f, "(nil)"),
            Output::Text(s) => write!(f, "\"{}\"", s),
            Output::Integer(n) => write!(f, "(integer) {}", n),
            Output::Bool(b) => write!(f, "({})", if *b { "true" } else { "false" }),
            Output::List(items) if items.is_empty() => write!(f, "(empty list)"),
            Output::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
        }
    }
}

/// Execute `action` against `db`.
pub fn execute(db: &ChatKv, action: Action) -> Result<Output> {
    debug!("Executing {:?}", action);
    let fields = db.fields();
    let output = match action {
        Action::MapGet { key } => fields.read_map(&key)?.map_or(Output::Nil, Output::Text),
        Action::MapSet { key, value } => {
            fields.write_map(&key, &value)?;
            Output::Ok
        }

        Action::CounterGet { id, extra } => {
            Output::Integer(fields.get_counter(id, extra.as_deref())?)
        }
        Action::CounterSet { id, extra, value } => {
            fields.set_counter(id, extra.as_deref(), value)?;
            Output::Ok
        }
        Action::CounterInc { id, extra } => {
            Output::Integer(fields.inc_counter(id, extra.as_deref())?)
        }
        Action::CounterDec { id, extra } => {
            Output::Integer(fields.dec_counter(id, extra.as_deref())?)
        }

        Action::FlagSet { id, key, extra } => {
            fields.make_valid(id, &key, extra.as_deref())?;
            Output::Ok
        }
        Action::FlagClear { id, key, extra } => {
            fields.invalidate(id, &key, extra.as_deref())?;
            Output::Ok
        }
        Action::FlagCheck { id, key, extra } => {
            Output::Bool(fields.is_valid(id, &key, extra.as_deref())?)
        }

        Action::ListAdd { id, key, value } => {
            Output::Bool(fields.add_to_list(id, key.as_deref(), value)?)
        }
        Action::ListRemove { id, key, value } => {
            Output::Bool(fields.remove_from_list(id, key.as_deref(), value)?)
        }
        Action::ListContains { id, key, value } => {
            Output::Bool(fields.list_contains(id, key.as_deref(), value)?)
        }
        Action::ListShow { id, key } => Output::List(
            fields
                .get_list(id, key.as_deref())?
                .iter()
                .map(i32::to_string)
                .collect(),
        ),

        Action::TreeInsert {
            ns,
            orders,
            key,
            data,
        } => {
            open_tree(db, ns, orders, key.len(), true)?.insert(&key, data)?;
            Output::Ok
        }
        Action::TreeDelete { ns, orders, key } => {
            Output::Bool(open_tree(db, ns, orders, key.len(), false)?.delete(&key)?)
        }
        Action::TreeGet { ns, orders, key } => open_tree(db, ns, orders, key.len(), false)?
            .get(&key)?
            .map_or(Output::Nil, Output::Text),
        Action::TreeList { ns, orders } => Output::List(
            open_tree(db, ns, orders, 0, false)?
                .entries_in_order()?
                .into_iter()
                .map(|(key, data)| format!("{} => {}", key.join(" "), data))
                .collect(),
        ),
        Action::TreeTop { ns, n } => {
            Output::List(open_tree(db, ns, None, 0, false)?.top_n_descending(n)?)
        }
        Action::TreeSize { ns } => {
            Output::Integer(open_tree(db, ns, None, 0, false)?.size()? as i64)
        }

        Action::Compact => Output::Integer(db.compact()? as i64),
    };
    Ok(output)
}

/// Open the tree at `ns` for a command whose key has `arity` components
/// (0 when the command takes no key).
///
/// Orders come from `--order`, then from the tree's recorded orders, then
/// default to `lex` per component. Trees with recorded orders are always
/// checked against them; `record` pins the orders of a new tree.
fn open_tree(
    db: &ChatKv,
    ns: FileId,
    requested: Option<Vec<KeyOrder>>,
    arity: usize,
    record: bool,
) -> Result<AvlTree> {
    let recorded = db.recorded_orders(ns)?;
    let orders = requested
        .or_else(|| recorded.clone())
        .unwrap_or_else(|| vec![KeyOrder::Lexicographic; arity.max(1)]);
    if arity > 0 && orders.len() != arity {
        return Err(Error::OrderMismatch(format!(
            "tree {} keys have {} components, got {}",
            ns,
            orders.len(),
            arity
        )));
    }
    if record || recorded.is_some() {
        db.open_tree(ns, &orders)
    } else {
        Ok(db.tree_with_orders(ns, &orders))
    }
}
