//! clap command tree.
//!
//! Built with the builder API so the same tree serves both the process
//! arguments and each line of pipe mode (with `no_binary_name`).

use clap::{Arg, ArgAction, Command};

/// Full CLI, including global flags.
pub fn build_cli() -> Command {
    Command::new("chatkv")
        .about("Inspect and edit a chatkv database")
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("PATH")
                .default_value(".chatkv")
                .global(true)
                .help("Database directory"),
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Use an in-memory database"),
        )
        .arg(
            Arg::new("lru")
                .long("lru")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .global(true)
                .help("Use an LRU cache of N entries"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Log more (repeat for more detail)"),
        )
        .subcommands(subcommands())
}

/// Subcommands only, for lines read in pipe mode.
pub fn build_line_cli() -> Command {
    Command::new("chatkv")
        .no_binary_name(true)
        .subcommand_required(true)
        .subcommands(subcommands())
}

fn subcommands() -> Vec<Command> {
    vec![
        map_cmd(),
        counter_cmd(),
        flag_cmd(),
        list_cmd(),
        tree_cmd(),
        Command::new("compact").about("Rewrite the log keeping only live values"),
    ]
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(clap::value_parser!(u64))
        .help("Entity id")
}

fn extra_arg() -> Arg {
    Arg::new("extra")
        .long("extra")
        .value_name("EXTRA")
        .help("Optional key suffix")
}

fn map_cmd() -> Command {
    Command::new("map")
        .about("Free-form map entries")
        .subcommand_required(true)
        .subcommand(
            Command::new("get")
                .about("Read an entry")
                .arg(Arg::new("key").required(true)),
        )
        .subcommand(
            Command::new("set")
                .about("Write an entry")
                .arg(Arg::new("key").required(true))
                .arg(Arg::new("value").required(true)),
        )
}

fn counter_cmd() -> Command {
    Command::new("counter")
        .about("Integer counters")
        .subcommand_required(true)
        .subcommand(
            Command::new("get")
                .about("Read a counter (0 if unset)")
                .arg(id_arg())
                .arg(extra_arg()),
        )
        .subcommand(
            Command::new("set")
                .about("Overwrite a counter")
                .arg(id_arg())
                .arg(
                    Arg::new("value")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(extra_arg()),
        )
        .subcommand(
            Command::new("inc")
                .about("Add one and print the new value")
                .arg(id_arg())
                .arg(extra_arg()),
        )
        .subcommand(
            Command::new("dec")
                .about("Subtract one and print the new value")
                .arg(id_arg())
                .arg(extra_arg()),
        )
}

fn flag_cmd() -> Command {
    let flag = |name: &'static str, about: &'static str| {
        Command::new(name)
            .about(about)
            .arg(id_arg())
            .arg(Arg::new("key").required(true))
            .arg(extra_arg())
    };
    Command::new("flag")
        .about("Per-key validity flags")
        .subcommand_required(true)
        .subcommand(flag("set", "Mark a key valid"))
        .subcommand(flag("clear", "Mark a key invalid"))
        .subcommand(flag("check", "Print whether a key is valid"))
}

fn list_cmd() -> Command {
    let key_arg = || Arg::new("key").long("key").value_name("KEY").help("List key");
    let value_arg = || {
        Arg::new("value")
            .required(true)
            .allow_negative_numbers(true)
            .value_parser(clap::value_parser!(i32))
    };
    let member = |name: &'static str, about: &'static str| {
        Command::new(name)
            .about(about)
            .arg(id_arg())
            .arg(value_arg())
            .arg(key_arg())
    };
    Command::new("list")
        .about("Integer lists")
        .subcommand_required(true)
        .subcommand(member("add", "Append a value if absent"))
        .subcommand(member("remove", "Remove a value"))
        .subcommand(member("contains", "Print whether a value is present"))
        .subcommand(
            Command::new("show")
                .about("Print the list")
                .arg(id_arg())
                .arg(key_arg()),
        )
}

fn tree_cmd() -> Command {
    let ns_arg = || {
        Arg::new("ns")
            .required(true)
            .value_parser(clap::value_parser!(u64))
            .help("Tree namespace")
    };
    let key_arg = || {
        Arg::new("key")
            .required(true)
            .num_args(1..)
            .allow_negative_numbers(true)
            .help("Key components")
    };
    let order_arg = || {
        Arg::new("order")
            .long("order")
            .value_name("ORDERS")
            .help(
                "Comma-separated comparator per key component: lex, asc or desc \
                 (defaults to the orders the tree was created with)",
            )
    };
    Command::new("tree")
        .about("Persistent ordered dictionaries")
        .subcommand_required(true)
        .subcommand(
            Command::new("insert")
                .about("Insert or overwrite an entry")
                .arg(ns_arg())
                .arg(Arg::new("data").required(true))
                .arg(key_arg())
                .arg(order_arg()),
        )
        .subcommand(
            Command::new("delete")
                .about("Remove an entry")
                .arg(ns_arg())
                .arg(key_arg())
                .arg(order_arg()),
        )
        .subcommand(
            Command::new("get")
                .about("Print the payload of an entry")
                .arg(ns_arg())
                .arg(key_arg())
                .arg(order_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("Print all entries in key order")
                .arg(ns_arg())
                .arg(order_arg()),
        )
        .subcommand(
            Command::new("top")
                .about("Print the payloads of the N greatest keys")
                .arg(ns_arg())
                .arg(
                    Arg::new("n")
                        .required(true)
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("size")
                .about("Print the number of entries")
                .arg(ns_arg()),
        )
}
