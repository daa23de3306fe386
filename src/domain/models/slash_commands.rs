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
            || cmd.is_new()
            || cmd.is_history()
            || cmd.is_open()
            || cmd.is_delete()
            || cmd.is_login()
            || cmd.is_logout()
            || cmd.is_help()
        {
            return Some(cmd);
        }

        return None;
    }

    /// One-based index argument as typed after `/open` and `/delete`.
    pub fn index_arg(&self) -> Option<usize> {
        return self.args.first()?.parse::<usize>().ok();
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_new(&self) -> bool {
        return ["/n", "/new"].contains(&self.command.as_str());
    }

    pub fn is_history(&self) -> bool {
        return ["/ls", "/history"].contains(&self.command.as_str());
    }

    pub fn is_open(&self) -> bool {
        return ["/o", "/open"].contains(&self.command.as_str());
    }

    pub fn is_delete(&self) -> bool {
        return ["/d", "/delete"].contains(&self.command.as_str());
    }

    pub fn is_login(&self) -> bool {
        return self.command == "/login";
    }

    pub fn is_logout(&self) -> bool {
        return self.command == "/logout";
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }
}
