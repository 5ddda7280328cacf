//! Console host for the microcycle instruction-cycle simulator.

mod table;

use std::env;
use std::ffi::OsString;
use std::io::{self, BufRead, Write};

use microcycle_core::{
    list_profiles, list_programs, new_session, EngineState, ProfileId, Session, SimError,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use table::{menu_number, render_catalog, render_view, rule};

const USAGE_TEXT: &str = "\
Usage: microcycle [options]

Options:
  -p, --profile <name>  Machine profile: hypothetical | ias
  -n, --program <n>     Program number within the profile (see --list)
  -a, --auto            Run every step without waiting for ENTER
  -l, --list            List profiles and programs, then exit
  -v, --verbose         Log every micro-step to stderr
  -h, --help            Show this help message

While stepping: ENTER advances, 'r' resets, 'q' quits.

Examples:
  microcycle --list
  microcycle --profile ias --program 2
  microcycle -p hypothetical -n 2 --auto
";

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    profile: Option<ProfileId>,
    program: Option<usize>,
    auto: bool,
    list: bool,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum ParseResult {
    Run(Options),
    Help,
}

#[allow(clippy::while_let_on_iterator)]
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut options = Options::default();

    while let Some(arg) = args.next() {
        let arg = arg.to_string_lossy().to_string();
        match arg.as_str() {
            "--help" | "-h" => return Ok(ParseResult::Help),
            "--auto" | "-a" => options.auto = true,
            "--list" | "-l" => options.list = true,
            "--verbose" | "-v" => options.verbose = true,
            "--profile" | "-p" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for {arg}"))?;
                let key = value.to_string_lossy();
                let profile = ProfileId::from_key(&key)
                    .ok_or_else(|| format!("unknown profile: {key}"))?;
                options.profile = Some(profile);
            }
            "--program" | "-n" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for {arg}"))?;
                let id = value
                    .to_string_lossy()
                    .parse::<usize>()
                    .ok()
                    .and_then(|number| number.checked_sub(1))
                    .ok_or_else(|| {
                        format!("invalid program number: {}", value.to_string_lossy())
                    })?;
                options.program = Some(id);
            }
            other => return Err(format!("unknown option: {other}")),
        }
    }

    if options.program.is_some() && options.profile.is_none() {
        return Err("--program requires --profile".to_string());
    }
    Ok(ParseResult::Run(options))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("warning: logging disabled: {error}");
    }
}

fn catalog() -> Vec<(ProfileId, Vec<microcycle_core::ProgramEntry>)> {
    list_profiles()
        .iter()
        .map(|&profile| (profile, list_programs(profile)))
        .collect()
}

/// What the user typed at the step prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepCommand {
    Next,
    Reset,
    Quit,
}

fn parse_step_command(line: &str) -> Option<StepCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Some(StepCommand::Next),
        "r" | "reset" => Some(StepCommand::Reset),
        "q" | "quit" | "exit" => Some(StepCommand::Quit),
        _ => None,
    }
}

/// Reads lines until one parses, returning `None` at end of input.
fn prompt<R: BufRead, W: Write, T>(
    input: &mut R,
    out: &mut W,
    question: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> io::Result<Option<T>> {
    loop {
        write!(out, "{question}")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if let Some(value) = parse(&line) {
            return Ok(Some(value));
        }
        writeln!(out, "Invalid option. Try again.")?;
    }
}

fn choose_session<R: BufRead, W: Write>(
    options: &Options,
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<Session>> {
    let profile = match options.profile {
        Some(profile) => profile,
        None => {
            writeln!(out, "{}", rule('='))?;
            writeln!(out, "COMPUTER ARCHITECTURE SIMULATOR")?;
            writeln!(out, "{}", rule('='))?;
            for (index, profile) in list_profiles().iter().enumerate() {
                writeln!(out, "{}. {profile}", index + 1)?;
            }
            let chosen = prompt(input, out, "Select a machine: ", |line| {
                let index = line.trim().parse::<usize>().ok()?;
                list_profiles().get(index.checked_sub(1)?).copied()
            })?;
            match chosen {
                Some(profile) => profile,
                None => return Ok(None),
            }
        }
    };

    let id = match options.program {
        Some(id) => id,
        None => {
            writeln!(out, "\nAvailable programs:")?;
            writeln!(out, "{}", rule('-'))?;
            for entry in list_programs(profile) {
                writeln!(out, "{}. {}", menu_number(entry.id), entry.name)?;
            }
            writeln!(out, "{}", rule('-'))?;
            let programs = list_programs(profile).len();
            let chosen = prompt(input, out, "Select a program: ", |line| {
                let number = line.trim().parse::<usize>().ok()?;
                number.checked_sub(1).filter(|id| *id < programs)
            })?;
            match chosen {
                Some(id) => id,
                None => return Ok(None),
            }
        }
    };

    match new_session(profile, id) {
        Ok(session) => {
            info!(profile = profile.key(), program = id, auto = options.auto, "session opened");
            Ok(Some(session))
        }
        Err(err) => {
            writeln!(out, "error: {err}")?;
            Ok(None)
        }
    }
}

/// Steps `session` to the end, pausing for a command unless `auto` is set.
fn drive<R: BufRead, W: Write>(
    session: &mut Session,
    auto: bool,
    input: &mut R,
    out: &mut W,
) -> io::Result<Result<(), SimError>> {
    let mut message = session.status_line();

    loop {
        if !auto {
            write!(out, "{CLEAR_SCREEN}")?;
        }
        writeln!(out, "{}", render_view(&session.snapshot(), &message))?;

        match session.state() {
            EngineState::Completed => {
                writeln!(out, "\nSimulation completed!")?;
                return Ok(Ok(()));
            }
            EngineState::Aborted => {
                writeln!(out, "\nSimulation aborted.")?;
                return Ok(session.latched_fault().cloned().map_or(Ok(()), Err));
            }
            EngineState::Loaded | EngineState::Running => {}
        }

        let command = if auto {
            StepCommand::Next
        } else {
            writeln!(out, "{}", rule('-'))?;
            prompt(
                input,
                out,
                "ENTER: next step | r: reset | q: quit > ",
                parse_step_command,
            )?
            .unwrap_or(StepCommand::Quit)
        };

        match command {
            StepCommand::Next => match session.advance() {
                Ok(result) => message = result.description,
                Err(err) => message = format!("error: {err}"),
            },
            StepCommand::Reset => {
                if let Err(err) = session.reset() {
                    return Ok(Err(err));
                }
                message = session.status_line();
            }
            StepCommand::Quit => {
                if let Err(err) = session.abort() {
                    return Ok(Err(err));
                }
                message = session.status_line();
            }
        }
    }
}

fn run(options: &Options) -> Result<(), i32> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut session = match choose_session(options, &mut input, &mut out) {
        Ok(Some(session)) => session,
        Ok(None) => return Err(1),
        Err(e) => {
            eprintln!("error: {e}");
            return Err(1);
        }
    };

    match drive(&mut session, options.auto, &mut input, &mut out) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(fault)) => {
            eprintln!("error: {fault}");
            Err(2)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Err(1)
        }
    }
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(options)) => {
            init_tracing(options.verbose);
            if options.list {
                print!("{}", render_catalog(&catalog()));
                0
            } else {
                match run(&options) {
                    Ok(()) => 0,
                    Err(code) => code,
                }
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn args(list: &[&str]) -> impl Iterator<Item = OsString> {
        list.iter()
            .map(OsString::from)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_profile_and_program() {
        let result = parse_args(args(&["--profile", "ias", "-n", "2", "--auto"]))
            .expect("valid args should parse");

        assert_eq!(
            result,
            ParseResult::Run(Options {
                profile: Some(ProfileId::Ias),
                program: Some(1),
                auto: true,
                list: false,
                verbose: false,
            })
        );
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(args(&["-v", "--help"])).expect("help should parse");
        assert_eq!(result, ParseResult::Help);
    }

    #[test]
    fn rejects_unknown_profile() {
        let error = parse_args(args(&["-p", "pdp11"])).expect_err("unknown profile");
        assert!(error.contains("unknown profile"));
    }

    #[test]
    fn rejects_program_without_profile() {
        let error = parse_args(args(&["--program", "1"])).expect_err("needs profile");
        assert!(error.contains("requires --profile"));
    }

    #[test]
    fn rejects_non_numeric_program() {
        let error = parse_args(args(&["-p", "hyp", "-n", "two"])).expect_err("bad id");
        assert!(error.contains("invalid program number"));
    }

    #[test]
    fn program_numbers_start_at_one() {
        let error = parse_args(args(&["-p", "hyp", "-n", "0"])).expect_err("zero");
        assert!(error.contains("invalid program number: 0"));

        let result = parse_args(args(&["-p", "hyp", "-n", "1"])).expect("first program");
        assert!(matches!(
            result,
            ParseResult::Run(Options {
                program: Some(0),
                ..
            })
        ));
    }

    #[test]
    fn step_commands_accept_short_and_long_forms() {
        assert_eq!(parse_step_command("\n"), Some(StepCommand::Next));
        assert_eq!(parse_step_command("R\n"), Some(StepCommand::Reset));
        assert_eq!(parse_step_command("quit"), Some(StepCommand::Quit));
        assert_eq!(parse_step_command("jump"), None);
    }

    #[test]
    fn auto_mode_runs_to_completion() {
        let options = Options {
            profile: Some(ProfileId::Hypothetical),
            program: Some(1),
            auto: true,
            ..Options::default()
        };
        let mut input = Cursor::new(Vec::new());
        let mut out = Vec::new();

        let mut session = choose_session(&options, &mut input, &mut out)
            .unwrap()
            .expect("session");
        let outcome = drive(&mut session, true, &mut input, &mut out).unwrap();

        assert_eq!(outcome, Ok(()));
        assert_eq!(session.state(), EngineState::Completed);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Simulation completed!"));
    }

    #[test]
    fn interactive_menu_selects_then_quits() {
        let options = Options::default();
        let mut input = Cursor::new(b"2\n0\n2\n\n\nq\n".to_vec());
        let mut out = Vec::new();

        let mut session = choose_session(&options, &mut input, &mut out)
            .unwrap()
            .expect("session");
        assert_eq!(session.profile().id(), ProfileId::Ias);
        assert_eq!(session.steps().len(), 57);
        let menu = String::from_utf8(out.clone()).unwrap();
        assert!(menu.contains("1. Basic Sum (5 + 10)\n2. Multiply and Divide"));
        assert!(menu.contains("Invalid option. Try again."));

        drive(&mut session, false, &mut input, &mut out)
            .unwrap()
            .unwrap();
        assert_eq!(session.state(), EngineState::Aborted);
        assert_eq!(session.progress().0, 2);
    }

    #[test]
    fn end_of_input_quits_the_session() {
        let mut session = new_session(ProfileId::Hypothetical, 0).unwrap();
        let mut input = Cursor::new(Vec::new());
        let mut out = Vec::new();

        drive(&mut session, false, &mut input, &mut out)
            .unwrap()
            .unwrap();
        assert_eq!(session.state(), EngineState::Aborted);
    }
}
