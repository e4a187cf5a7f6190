// Shell command handlers
//
// Each command line is split shell-style and routed to a handler that
// returns the text to print, or an error message

use crate::commands;
use crate::session::ShellSession;
use std::fmt::Display;
use std::path::PathBuf;
use stoppoint::group::GroupTree;
use stoppoint::{BreakpointManager, Condition, GroupId, Monitor, SuspendPolicy};
use tracing::debug;

pub type CommandResult = Result<String, String>;

pub struct CommandHandler {
    session: ShellSession,
}

impl CommandHandler {
    pub fn new(session: ShellSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &ShellSession {
        &self.session
    }

    pub fn handle_line(&self, line: &str) -> CommandResult {
        let tokens = shlex::split(line).ok_or_else(|| "Unbalanced quotes".to_string())?;
        let Some((command, args)) = tokens.split_first() else {
            return Ok(String::new());
        };
        debug!("Command {} {:?}", command, args);

        let mut manager = self.session.manager().lock();
        match command.as_str() {
            "stop" => handle_stop(&mut manager, args),
            "catch" => handle_catch(&mut manager, args),
            "watch" => handle_watch(&mut manager, args),
            "thread" => handle_thread(&mut manager, args),
            "class" => handle_class(&mut manager, args),
            "trace" => handle_trace(&mut manager, args),
            "clear" => handle_clear(&mut manager, args),
            "enable" => handle_enable(&mut manager, args, true),
            "disable" => handle_enable(&mut manager, args, false),
            "group" => handle_group(&mut manager, args),
            "condition" => handle_condition(&mut manager, args),
            "monitor" => handle_monitor(&mut manager, args),
            "suspend" => handle_suspend(&mut manager, args),
            "skip" => handle_skip(&mut manager, args),
            "expire" => handle_expire(&mut manager, args),
            "filter" => handle_filter(&mut manager, args),
            "list" => handle_list(&manager),
            "groups" => handle_groups(&manager),
            "save" => {
                let path = match args.first() {
                    Some(path) => PathBuf::from(path),
                    None => self
                        .session
                        .breakpoints_file()
                        .cloned()
                        .ok_or("No breakpoints file configured, give a path")?,
                };
                manager.save(&path).map_err(err)?;
                Ok(format!("Saved {} breakpoints to {}", manager.len(), path.display()))
            }
            "help" => match args.first() {
                Some(name) => commands::command_help(name)
                    .ok_or_else(|| format!("Unknown command: {}", name)),
                None => Ok(commands::help_text()),
            },
            _ => Err(format!("Unknown command: {} (try help)", command)),
        }
    }
}

fn err(e: impl Display) -> String {
    e.to_string()
}

fn number(args: &[String], idx: usize) -> Result<u32, String> {
    let token = args.get(idx).ok_or("Breakpoint number required")?;
    token
        .parse()
        .map_err(|_| format!("Not a breakpoint number: {}", token))
}

fn count(token: &str) -> Result<u32, String> {
    token
        .parse()
        .map_err(|_| format!("Not a count: {}", token))
}

/// Leading `<a>|<b>|both` selector; absent means both
fn mode<'a>(args: &'a [String], first: &str, second: &str) -> (bool, bool, &'a [String]) {
    match args.first().map(String::as_str) {
        Some(m) if m == first => (true, false, &args[1..]),
        Some(m) if m == second => (false, true, &args[1..]),
        Some("both") => (true, true, &args[1..]),
        _ => (true, true, args),
    }
}

fn created(manager: &BreakpointManager, number: u32) -> CommandResult {
    let line = manager.describe(number).map_err(err)?;
    Ok(format!("Set breakpoint {}", line.trim_start()))
}

fn handle_stop(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    if args.is_empty() {
        return Err("Usage: stop <class:line | class.method[(args)]>".to_string());
    }
    let n = manager
        .create_location_breakpoint(&args.join(" "), None)
        .map_err(err)?;
    created(manager, n)
}

fn handle_catch(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let (caught, uncaught, rest) = mode(args, "caught", "uncaught");
    let pattern = rest.first().ok_or("Usage: catch [caught|uncaught|both] <pattern>")?;
    let n = manager
        .create_exception_breakpoint(pattern, caught, uncaught)
        .map_err(err)?;
    created(manager, n)
}

fn handle_watch(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let (access, modify, rest) = mode(args, "access", "modify");
    let field = rest.first().ok_or("Usage: watch [access|modify|both] <field>")?;
    let n = manager
        .create_watch_breakpoint(field, None, access, modify)
        .map_err(err)?;
    created(manager, n)
}

fn handle_thread(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let (start, death, rest) = mode(args, "start", "death");
    let n = manager
        .create_thread_breakpoint(rest.first().map(String::as_str), start, death)
        .map_err(err)?;
    created(manager, n)
}

fn handle_class(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let (prepare, unload, rest) = mode(args, "prepare", "unload");
    if rest.is_empty() {
        return Err("Usage: class [prepare|unload|both] <pattern,...>".to_string());
    }
    let n = manager
        .create_class_breakpoint(&rest.join(","), prepare, unload)
        .map_err(err)?;
    created(manager, n)
}

fn handle_trace(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let n = manager
        .create_trace_breakpoint(
            args.first().map(String::as_str),
            args.get(1).map(String::as_str),
        )
        .map_err(err)?;
    created(manager, n)
}

fn handle_clear(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    if args.first().map(String::as_str) == Some("all") {
        let removed = manager.len();
        manager.remove_all();
        return Ok(format!("Removed {} breakpoints", removed));
    }
    let n = number(args, 0)?;
    manager.remove_breakpoint(n).map_err(err)?;
    Ok(format!("Removed breakpoint {}", n))
}

fn handle_enable(manager: &mut BreakpointManager, args: &[String], enabled: bool) -> CommandResult {
    let verb = if enabled { "Enabled" } else { "Disabled" };
    if args.first().map(String::as_str) == Some("all") {
        manager.set_all_enabled(enabled);
        return Ok(format!("{} all breakpoints", verb));
    }
    let n = number(args, 0)?;
    manager.set_enabled(n, enabled).map_err(err)?;
    Ok(format!("{} breakpoint {}", verb, n))
}

fn find_group(manager: &BreakpointManager, name: Option<&String>) -> Result<GroupId, String> {
    let name = name.ok_or("Group name required")?;
    manager
        .find_group(name)
        .ok_or_else(|| format!("No such group: {}", name))
}

fn handle_group(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let sub = args.first().map(String::as_str).unwrap_or_default();
    match sub {
        "add" => {
            let name = args.get(1).ok_or("Group name required")?;
            let parent = match args.get(2) {
                Some(_) => Some(find_group(manager, args.get(2))?),
                None => None,
            };
            manager.create_group(name, parent).map_err(err)?;
            Ok(format!("Added group {}", name))
        }
        "remove" => {
            let id = find_group(manager, args.get(1))?;
            manager.remove_group(id).map_err(err)?;
            Ok(format!("Removed group {}", args[1]))
        }
        "enable" | "disable" => {
            let id = find_group(manager, args.get(1))?;
            manager.set_group_enabled(id, sub == "enable").map_err(err)?;
            Ok(format!("Group {} {}d", args[1], sub))
        }
        "rename" => {
            let id = find_group(manager, args.get(1))?;
            let name = args.get(2).ok_or("New name required")?;
            manager.rename_group(id, name).map_err(err)?;
            Ok(format!("Renamed group {} to {}", args[1], name))
        }
        "move" => {
            let n = number(args, 1)?;
            let id = find_group(manager, args.get(2))?;
            manager.move_breakpoint(n, id).map_err(err)?;
            Ok(format!("Moved breakpoint {} to {}", n, args[2]))
        }
        _ => Err("Usage: group add|remove|enable|disable|rename|move ...".to_string()),
    }
}

fn handle_condition(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let n = number(args, 0)?;
    let rest = args.get(2..).unwrap_or_default().join(" ");
    match args.get(1).map(String::as_str) {
        None => {
            let bp = manager.breakpoint(n).map_err(err)?;
            Ok(indexed(bp.conditions()))
        }
        Some("expr") if !rest.is_empty() => {
            manager.add_condition(n, Condition::expr(rest)).map_err(err)?;
            Ok(format!("Condition added to breakpoint {}", n))
        }
        Some("value") => {
            let condition = Condition::value_from_str(&rest).map_err(err)?;
            manager.add_condition(n, condition).map_err(err)?;
            Ok(format!("Condition added to breakpoint {}", n))
        }
        Some("remove") => {
            let index = args.get(2).ok_or("Index required")?;
            let index = index.parse().map_err(|_| format!("Not an index: {}", index))?;
            let removed = manager.remove_condition(n, index).map_err(err)?;
            Ok(format!("Removed {}", removed))
        }
        _ => Err("Usage: condition <n> expr <expr> | value <var>=<val> | remove <index>".to_string()),
    }
}

fn handle_monitor(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let n = number(args, 0)?;
    let rest = args.get(2..).unwrap_or_default().join(" ");
    match args.get(1).map(String::as_str) {
        None => {
            let bp = manager.breakpoint(n).map_err(err)?;
            Ok(indexed(bp.monitors()))
        }
        Some("command") if !rest.is_empty() => {
            manager.add_monitor(n, Monitor::command(rest)).map_err(err)?;
            Ok(format!("Monitor added to breakpoint {}", n))
        }
        Some("log") if !rest.is_empty() => {
            manager.add_monitor(n, Monitor::log(rest)).map_err(err)?;
            Ok(format!("Monitor added to breakpoint {}", n))
        }
        Some("remove") => {
            let index = args.get(2).ok_or("Index required")?;
            let index = index.parse().map_err(|_| format!("Not an index: {}", index))?;
            let removed = manager.remove_monitor(n, index).map_err(err)?;
            Ok(format!("Removed {}", removed))
        }
        _ => Err("Usage: monitor <n> command <cmd> | log <text> | remove <index>".to_string()),
    }
}

fn indexed<T: Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "None".to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}: {}", i, item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn handle_suspend(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let n = number(args, 0)?;
    match args.get(1) {
        None => Ok(manager.suspend_policy(n).map_err(err)?.to_string()),
        Some(policy) => {
            let policy: SuspendPolicy = policy.parse().map_err(err)?;
            manager.set_suspend_policy(n, policy).map_err(err)?;
            Ok(format!("Breakpoint {}: {}", n, policy))
        }
    }
}

fn handle_skip(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let n = number(args, 0)?;
    match args.get(1) {
        None => Ok(format!("Skip count {}", manager.skip_count(n).map_err(err)?)),
        Some(value) => {
            manager.set_skip_count(n, count(value)?).map_err(err)?;
            Ok(format!("Breakpoint {} skips {} hits", n, value))
        }
    }
}

fn handle_expire(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let n = number(args, 0)?;
    match args.get(1) {
        None => Ok(format!("Expire count {}", manager.expire_count(n).map_err(err)?)),
        Some(value) => {
            manager.set_expire_count(n, count(value)?).map_err(err)?;
            let delete = args.get(2).map(String::as_str) == Some("delete");
            manager.set_delete_on_expire(n, delete).map_err(err)?;
            Ok(format!(
                "Breakpoint {} expires after {} hits{}",
                n,
                value,
                if delete { " and is then deleted" } else { "" }
            ))
        }
    }
}

fn handle_filter(manager: &mut BreakpointManager, args: &[String]) -> CommandResult {
    let n = number(args, 0)?;
    let list = args.get(2..).filter(|rest| !rest.is_empty()).map(|rest| rest.join(","));
    match (args.get(1).map(String::as_str), list) {
        (Some("class"), None) => Ok(manager
            .class_filters(n)
            .map_err(err)?
            .unwrap_or_else(|| "None".to_string())),
        (Some("thread"), None) => Ok(manager
            .thread_filters(n)
            .map_err(err)?
            .unwrap_or_else(|| "None".to_string())),
        (Some("class"), Some(list)) => {
            manager.set_class_filters(n, Some(list)).map_err(err)?;
            Ok(format!("Class filters set on breakpoint {}", n))
        }
        (Some("thread"), Some(list)) => {
            manager.set_thread_filters(n, Some(list)).map_err(err)?;
            Ok(format!("Thread filters set on breakpoint {}", n))
        }
        _ => Err("Usage: filter <n> class|thread [list]".to_string()),
    }
}

fn handle_list(manager: &BreakpointManager) -> CommandResult {
    let numbers: Vec<u32> = manager.breakpoints().iter().map(|bp| bp.number()).collect();
    if numbers.is_empty() {
        return Ok("No breakpoints".to_string());
    }
    let mut lines = Vec::new();
    for n in numbers {
        lines.push(manager.describe(n).map_err(err)?);
        let bp = manager.breakpoint(n).map_err(err)?;
        for condition in bp.conditions() {
            lines.push(format!("      if {}", condition));
        }
        for monitor in bp.monitors() {
            lines.push(format!("      do {}", monitor));
        }
    }
    Ok(lines.join("\n"))
}

fn handle_groups(manager: &BreakpointManager) -> CommandResult {
    let mut lines = Vec::new();
    render_group(manager.groups(), manager.root_group(), 0, &mut lines);
    Ok(lines.join("\n"))
}

fn render_group(tree: &GroupTree, id: GroupId, depth: usize, lines: &mut Vec<String>) {
    let Some(group) = tree.get(id) else { return };
    lines.push(format!(
        "{}{} [{}] {} breakpoints",
        "  ".repeat(depth),
        group.name(),
        if group.is_enabled_flag() { "enabled" } else { "disabled" },
        group.breakpoints().len()
    ));
    for child in group.groups() {
        render_group(tree, *child, depth + 1, lines);
    }
}
