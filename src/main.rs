use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Result;
use tracing::debug;

use ish_engine::{cli, logging, parser, Config, Control, Sequence};

const PROMPT: &[u8] = b"ish> ";
const EXIT_PARSE: i32 = 2;

fn main() {
	if let Err(err) = run_main() {
		eprintln!("ish: {err:?}");
		std::process::exit(1);
	}
}

fn run_main() -> Result<()> {
	let args = cli::parse();
	logging::init_logging(args.log_level)?;

	let mut config = Config::from_env();
	if let Some(path) = args.history_file {
		config = config.with_history_file(path);
	}
	debug!(?config, "session configuration");

	match args.command {
		Some(line) => if let Control::Continue(code) = run_line(&config, &line) {
			std::process::exit(code);
		},
		None => repl(&config)?,
	}
	Ok(())
}

fn run_line(config: &Config, line: &str) -> Control {
	match parser::parse(line) {
		Ok(pipelines) => Sequence::new(config, pipelines).execute(),
		Err(e) => {
			eprintln!("ish: {}", e);
			Control::Continue(EXIT_PARSE)
		},
	}
}

fn repl(config: &Config) -> Result<()> {
	let interactive = io::stdin().is_terminal();
	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	loop {
		if interactive {
			stdout.write_all(PROMPT)?;
			stdout.flush()?;
		}
		let mut line: Vec<u8> = vec![];
		if stdin_locked.read_until(b'\n', &mut line)? == 0 {
			break;
		}
		if matches!(run_line(config, &String::from_utf8_lossy(&line)), Control::Exit) {
			break;
		}
	}
	Ok(())
}
