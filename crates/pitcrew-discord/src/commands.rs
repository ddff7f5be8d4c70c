// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-command definitions and registration.

use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption};

fn id_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "id", "Work order ID").required(true)
}

fn priority_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "priority", "Priority level")
        .add_string_choice("Low", "LOW")
        .add_string_choice("Medium", "MEDIUM")
        .add_string_choice("High", "HIGH")
}

fn subsystem_option(required: bool) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "subsystem", "Subsystem category")
        .set_autocomplete(true)
        .required(required)
}

/// All slash commands the bot registers.
pub fn definitions() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("wo-create")
            .description("Create a new work order")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "title", "Short title")
                    .required(true),
            )
            .add_option(subsystem_option(true))
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "description",
                "What needs to be done",
            ))
            .add_option(priority_option())
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "cad-link",
                "Link to the CAD model",
            )),
        CreateCommand::new("wo-edit")
            .description("Edit a work order (creator or admin)")
            .add_option(id_option())
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "title",
                "New title",
            ))
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "description",
                "New description",
            ))
            .add_option(priority_option())
            .add_option(subsystem_option(false))
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "cad-link",
                "New CAD link",
            )),
        CreateCommand::new("wo-claim")
            .description("Claim an open work order")
            .add_option(id_option()),
        CreateCommand::new("wo-unclaim")
            .description("Release your claim on a work order")
            .add_option(id_option()),
        CreateCommand::new("wo-finish")
            .description("Mark a work order as done")
            .add_option(id_option()),
        CreateCommand::new("wo-cancel")
            .description("Cancel an open work order (creator or admin)")
            .add_option(id_option()),
        CreateCommand::new("wo-assign")
            .description("Assign a work order to a member (admin only)")
            .add_option(id_option())
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, "member", "Member to assign")
                    .required(true),
            ),
        CreateCommand::new("wo-remove")
            .description("Remove a work order (admin only)")
            .add_option(id_option()),
        CreateCommand::new("wo-list").description("List open work orders"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_commands_are_defined() {
        // serde_json rendering is the only stable way to inspect builders.
        let defs = definitions();
        assert_eq!(defs.len(), 9);
        let names: Vec<String> = defs
            .iter()
            .map(|d| {
                serde_json::to_value(d).unwrap()["name"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        for expected in [
            "wo-create",
            "wo-edit",
            "wo-claim",
            "wo-unclaim",
            "wo-finish",
            "wo-cancel",
            "wo-assign",
            "wo-remove",
            "wo-list",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn create_requires_title_and_subsystem() {
        let defs = definitions();
        let create = serde_json::to_value(&defs[0]).unwrap();
        let options = create["options"].as_array().unwrap();
        let required: Vec<&str> = options
            .iter()
            .filter(|o| o["required"].as_bool().unwrap_or(false))
            .map(|o| o["name"].as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["title", "subsystem"]);
    }
}
