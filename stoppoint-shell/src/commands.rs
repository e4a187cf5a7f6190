// Shell command table
//
// Usage strings for every command the handler understands

pub struct CommandHelp {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

pub fn get_commands() -> Vec<CommandHelp> {
    vec![
        CommandHelp {
            name: "stop",
            usage: "stop <class:line | class.method[(args)]>",
            description: "Set a line or method breakpoint",
        },
        CommandHelp {
            name: "catch",
            usage: "catch [caught|uncaught|both] <pattern>",
            description: "Stop when a matching exception is thrown",
        },
        CommandHelp {
            name: "watch",
            usage: "watch [access|modify|both] <field>",
            description: "Stop when a field is read or written",
        },
        CommandHelp {
            name: "thread",
            usage: "thread [start|death|both] [name]",
            description: "Stop when threads start or die",
        },
        CommandHelp {
            name: "class",
            usage: "class [prepare|unload|both] <pattern,...>",
            description: "Stop when matching classes load or unload",
        },
        CommandHelp {
            name: "trace",
            usage: "trace [classes] [threads]",
            description: "Report method entry and exit without stopping",
        },
        CommandHelp {
            name: "clear",
            usage: "clear <n|all>",
            description: "Remove breakpoints",
        },
        CommandHelp {
            name: "enable",
            usage: "enable <n|all>",
            description: "Enable breakpoints",
        },
        CommandHelp {
            name: "disable",
            usage: "disable <n|all>",
            description: "Disable breakpoints",
        },
        CommandHelp {
            name: "group",
            usage: "group add <name> [parent] | remove|enable|disable <name> | rename <name> <new> | move <n> <name>",
            description: "Manage breakpoint groups",
        },
        CommandHelp {
            name: "condition",
            usage: "condition <n> expr <expr> | value <var>=<val> | remove <index>",
            description: "Edit breakpoint conditions",
        },
        CommandHelp {
            name: "monitor",
            usage: "monitor <n> command <cmd> | log <text> | remove <index>",
            description: "Edit breakpoint monitors",
        },
        CommandHelp {
            name: "suspend",
            usage: "suspend <n> [all|thread|none]",
            description: "Show or set the suspend policy",
        },
        CommandHelp {
            name: "skip",
            usage: "skip <n> [count]",
            description: "Show or set the number of hits to ignore",
        },
        CommandHelp {
            name: "expire",
            usage: "expire <n> [count] [delete]",
            description: "Show or set the hit count after which the breakpoint expires",
        },
        CommandHelp {
            name: "filter",
            usage: "filter <n> class|thread [list]",
            description: "Show or set filters (breakpoint must be disabled to set)",
        },
        CommandHelp {
            name: "list",
            usage: "list",
            description: "List breakpoints",
        },
        CommandHelp {
            name: "groups",
            usage: "groups",
            description: "Show the group tree",
        },
        CommandHelp {
            name: "save",
            usage: "save [path]",
            description: "Write breakpoints to a file",
        },
        CommandHelp {
            name: "help",
            usage: "help [command]",
            description: "Show this table, or one command's usage",
        },
        CommandHelp {
            name: "quit",
            usage: "quit",
            description: "Save and exit",
        },
    ]
}

/// Usage for a single command
pub fn command_help(name: &str) -> Option<String> {
    get_commands()
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| format!("{}\n  {}", c.usage, c.description))
}

pub fn help_text() -> String {
    get_commands()
        .iter()
        .map(|c| format!("{:<60} {}", c.usage, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}
