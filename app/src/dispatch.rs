//! Routes one parsed command to the form and the controller.

use inventory_core::{Controller, ItemForm, ItemList, ListAction, SubmitError, Transport};

use crate::view::{Command, HELP};

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Keep going, printing the message first if there is one.
    Continue(Option<String>),
    Quit,
}

impl Step {
    fn say(message: impl Into<String>) -> Self {
        Step::Continue(Some(message.into()))
    }

    fn quiet() -> Self {
        Step::Continue(None)
    }
}

/// Bring the form in line with the session before rendering.
pub fn sync_form<T: Transport>(controller: &Controller<T>, form: &mut ItemForm) {
    let session = controller.session();
    form.set_disabled(session.submitting);
    form.sync_selection(session.selected_item.as_ref());
}

/// Delete confirmation: `y` or `Y` confirms; anything else, a read error or
/// end of input declines.
pub fn is_yes<E>(answer: Option<Result<String, E>>) -> bool {
    matches!(answer, Some(Ok(line)) if line.trim().eq_ignore_ascii_case("y"))
}

/// Run one command. Failed requests are recorded in the session and shown on
/// the next render, so only local problems come back as a message.
pub fn dispatch<T: Transport>(
    controller: &Controller<T>,
    form: &mut ItemForm,
    command: Command,
    confirm: impl FnOnce(&str) -> bool,
) -> Step {
    let session = controller.session();
    let list = ItemList::new(&session.items, session.submitting);
    match command {
        Command::Set(field, value) => {
            form.set_field(field, &value);
            Step::quiet()
        }
        Command::Save => match form.submit() {
            Ok(draft) => {
                form.set_disabled(true);
                let saved = controller.submit(draft).is_ok();
                form.set_disabled(false);
                if saved {
                    form.reset();
                }
                Step::quiet()
            }
            Err(SubmitError::Invalid(_)) => Step::say("fix the highlighted fields first"),
            Err(SubmitError::Disabled) => Step::quiet(),
        },
        Command::Edit(row) => match list.edit(row) {
            Some(ListAction::Edit(item)) => {
                controller.select(item);
                Step::quiet()
            }
            _ => Step::say(format!("no row {}", row + 1)),
        },
        Command::Cancel => {
            if form.cancel() {
                controller.cancel_edit();
            }
            Step::quiet()
        }
        Command::Delete(row) => match list.delete(row) {
            Some(ListAction::Delete(id)) => {
                let _ = controller.delete(&id, confirm);
                Step::quiet()
            }
            _ => Step::say(format!("no row {}", row + 1)),
        },
        Command::Refresh => {
            let _ = controller.load();
            Step::quiet()
        }
        Command::Help => Step::say(HELP),
        Command::Quit => Step::Quit,
    }
}
