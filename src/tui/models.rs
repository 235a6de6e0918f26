use crate::tracker::Intent;

/// What the keyboard is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    AddItem,
    CreateList,
    RenameList,
    MergeList,
    ConfirmDelete,
}

impl InputMode {
    pub fn prompt(self) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::AddItem => "Add item (workId)",
            InputMode::CreateList => "New list name",
            InputMode::RenameList => "Rename list to",
            InputMode::MergeList => "Merge from list",
            InputMode::ConfirmDelete => "Delete this list? (y/n)",
        }
    }

    pub fn takes_text(self) -> bool {
        !matches!(self, InputMode::Normal | InputMode::ConfirmDelete)
    }
}

/// Builds the intent for a submitted prompt. `Err` carries a message for the status line.
pub fn intent_for_input(
    mode: InputMode,
    input: &str,
    current_list: &str,
) -> Result<Option<Intent>, String> {
    let input = input.trim();
    if mode.takes_text() && input.is_empty() {
        return Ok(None);
    }

    Ok(match mode {
        InputMode::Normal | InputMode::ConfirmDelete => None,
        InputMode::AddItem => {
            let id = input
                .parse()
                .map_err(|_| format!("'{input}' is not a numeric workId"))?;
            Some(Intent::Add(id))
        }
        InputMode::CreateList => Some(Intent::CreateList(input.to_string())),
        InputMode::RenameList => Some(Intent::RenameList {
            from: current_list.to_string(),
            to: input.to_string(),
        }),
        InputMode::MergeList => Some(Intent::MergeList(input.to_string())),
    })
}

/// The list after (or before) `current`, wrapping around.
pub fn neighbour_list<'a>(names: &'a [String], current: &str, forward: bool) -> Option<&'a str> {
    if names.len() < 2 {
        return None;
    }
    let position = names.iter().position(|name| name == current).unwrap_or(0);
    let next = if forward {
        (position + 1) % names.len()
    } else {
        (position + names.len() - 1) % names.len()
    };
    Some(names[next].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackedItemId;

    #[test]
    fn test_intent_for_input() {
        assert_eq!(
            intent_for_input(InputMode::AddItem, " 26609 ", "default"),
            Ok(Some(Intent::Add(TrackedItemId(26609))))
        );
        assert!(intent_for_input(InputMode::AddItem, "abc", "default").is_err());
        assert_eq!(intent_for_input(InputMode::CreateList, "   ", "default"), Ok(None));
        assert_eq!(
            intent_for_input(InputMode::RenameList, "weekly", "seasonal"),
            Ok(Some(Intent::RenameList {
                from: "seasonal".to_string(),
                to: "weekly".to_string()
            }))
        );
    }

    #[test]
    fn test_neighbour_list_wraps() {
        let names = vec!["default".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(neighbour_list(&names, "default", true), Some("a"));
        assert_eq!(neighbour_list(&names, "b", true), Some("default"));
        assert_eq!(neighbour_list(&names, "default", false), Some("b"));
        assert_eq!(neighbour_list(&names[..1], "default", true), None);
    }
}
