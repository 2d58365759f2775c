//! Terminal rendering of the single page and parsing of user input.

use std::fmt::Write as _;

use inventory_core::{Field, ItemForm, ItemList, Session};

pub const HELP: &str = "\
commands:
  name <text> | description <text> | quantity <n> | price <amount>
  save                 create the item, or save changes in edit mode
  edit <row>           load a row into the form
  cancel               leave edit mode
  delete <row>         delete a row (asks for confirmation)
  refresh              reload the list from the server
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(Field, String),
    Save,
    Edit(usize),
    Cancel,
    Delete(usize),
    Refresh,
    Help,
    Quit,
}

/// Parse one input line. Rows are 1-based on screen and 0-based here.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let row = || -> Result<usize, String> {
        match rest.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("{word} expects a row number, got {rest:?}")),
        }
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "name" => Command::Set(Field::Name, rest.to_string()),
        "description" | "desc" => Command::Set(Field::Description, rest.to_string()),
        "quantity" | "qty" => Command::Set(Field::Quantity, rest.to_string()),
        "price" => Command::Set(Field::Price, rest.to_string()),
        "save" | "submit" => Command::Save,
        "edit" => Command::Edit(row()?),
        "cancel" => Command::Cancel,
        "delete" | "rm" => Command::Delete(row()?),
        "refresh" => Command::Refresh,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "" => return Err("empty command; type help".to_string()),
        other => return Err(format!("unknown command {other:?}; type help")),
    };
    Ok(command)
}

pub fn render_form(form: &ItemForm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", form.title());
    for field in Field::ALL {
        let _ = write!(out, "{:<12} {}", format!("{}:", field.label()), form.value(field));
        if let Some(err) = form.error(field) {
            let _ = write!(out, "   ({} {err})", field.label());
        }
        out.push('\n');
    }
    let _ = write!(out, "[{}]", form.submit_label());
    if form.can_cancel() {
        out.push_str("  [Cancel]");
    }
    out
}

pub fn render_page(session: &Session, form: &ItemForm) -> String {
    let mut out = String::from("Inventory Manager\n\n");
    if let Some(error) = &session.error {
        let _ = writeln!(out, "! {error}\n");
    }
    out.push_str(&render_form(form));
    out.push_str("\n\n");
    if session.loading {
        out.push_str("Loading items...");
    } else {
        out.push_str("== Inventory ==\n");
        let _ = write!(out, "{}", ItemList::new(&session.items, session.submitting));
    }
    out
}
