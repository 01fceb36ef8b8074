//! Bot commands and their argument formats.

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Debug, Clone, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Commands:")]
pub enum Command {
    #[command(description = "choose a table or create a new one")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "list the tables of the spreadsheet")]
    Tables,
    #[command(description = "list the columns of the current table")]
    Columns,
    #[command(description = "enter a record one column at a time")]
    Add,
    #[command(description = "find rows: /search <column> <value>")]
    Search(String),
    #[command(description = "find similar rows: /fuzzy <column> <value>")]
    Fuzzy(String),
    #[command(description = "change a row: /update <column> <value>, then name: value lines")]
    Update(String),
    #[command(description = "drop the current question")]
    Cancel,
    #[command(description = "open the Students table")]
    Students,
    #[command(description = "open the Teachers table")]
    Teachers,
    #[command(description = "open the StudentProgress table")]
    Progress,
}

/// A `<column> <value>` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub column: String,
    pub value: String,
}

impl Lookup {
    /// Split `args` at the first whitespace. The value keeps inner spaces.
    #[must_use]
    pub fn parse(args: &str) -> Option<Self> {
        let (column, value) = args.trim().split_once(char::is_whitespace)?;
        let value = value.trim();
        if column.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self {
            column: column.to_string(),
            value: value.to_string(),
        })
    }
}

/// Arguments of `/update`: a condition line followed by `name: value` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateArgs {
    pub lookup: Lookup,
    pub changes: String,
}

impl UpdateArgs {
    #[must_use]
    pub fn parse(args: &str) -> Option<Self> {
        let (condition, changes) = args.trim_start().split_once('\n')?;
        let changes = changes.trim();
        if changes.is_empty() {
            return None;
        }
        Some(Self {
            lookup: Lookup::parse(condition)?,
            changes: changes.to_string(),
        })
    }
}
