#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }

        let prefix = args.remove(0);
        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_add_images()
            || cmd.is_remove_image()
            || cmd.is_list_images()
            || cmd.is_list_ingredients()
            || cmd.is_edit_begin()
            || cmd.is_edit_set()
            || cmd.is_edit_slot()
            || cmd.is_edit_drop()
            || cmd.is_edit_save()
            || cmd.is_edit_cancel()
            || cmd.is_generate()
            || cmd.is_show_recipe()
            || cmd.is_quick_question()
            || cmd.is_list_classes()
        {
            return Some(cmd);
        }

        return None;
    }

    /// The first argument parsed as a 1-based position.
    pub fn position(&self) -> Option<usize> {
        return self
            .args
            .first()
            .and_then(|arg| return arg.parse::<usize>().ok())
            .filter(|idx| return *idx > 0);
    }

    /// Everything after the first argument, joined back together.
    pub fn rest(&self) -> String {
        return self.args.iter().skip(1).cloned().collect::<Vec<String>>().join(" ");
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_add_images(&self) -> bool {
        return ["/a", "/add"].contains(&self.command.as_str()) && !self.args.is_empty();
    }

    pub fn is_remove_image(&self) -> bool {
        return ["/rm", "/remove"].contains(&self.command.as_str()) && self.args.len() == 1;
    }

    pub fn is_list_images(&self) -> bool {
        return ["/i", "/images"].contains(&self.command.as_str());
    }

    pub fn is_list_ingredients(&self) -> bool {
        return ["/l", "/ingredients"].contains(&self.command.as_str());
    }

    pub fn is_edit_begin(&self) -> bool {
        return ["/e", "/edit"].contains(&self.command.as_str());
    }

    pub fn is_edit_set(&self) -> bool {
        return self.command == "/set" && self.position().is_some();
    }

    pub fn is_edit_slot(&self) -> bool {
        return self.command == "/slot";
    }

    pub fn is_edit_drop(&self) -> bool {
        return self.command == "/drop" && self.position().is_some();
    }

    pub fn is_edit_save(&self) -> bool {
        return self.command == "/save";
    }

    pub fn is_edit_cancel(&self) -> bool {
        return self.command == "/cancel";
    }

    pub fn is_generate(&self) -> bool {
        return ["/g", "/generate"].contains(&self.command.as_str());
    }

    pub fn is_show_recipe(&self) -> bool {
        return ["/r", "/recipe"].contains(&self.command.as_str());
    }

    pub fn is_quick_question(&self) -> bool {
        return ["/qq", "/quick"].contains(&self.command.as_str());
    }

    pub fn is_list_classes(&self) -> bool {
        return ["/c", "/classes"].contains(&self.command.as_str());
    }
}
