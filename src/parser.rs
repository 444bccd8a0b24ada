use std::os::unix::io::RawFd;

use crate::types::*;

type ParseResult<T> = Result<T, String>;

struct Parser<'a> {
	line: &'a str,
	i: usize,
}

impl<'a> Parser<'a> {
	fn peek(&self) -> Option<u8> {
		self.line.as_bytes().get(self.i).cloned()
	}

	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.peek() {
			if !f(c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		match c {
			b' ' | b'\t' | b'\n' | b'\r' => true,
			_ => false,
		}
	}

	fn is_letter(c: u8) -> bool {
		match c {
			b'>' | b'<' | b'&' | b'|' | b';' => false,
			_ => !Parser::is_whitespace(c),
		}
	}

	fn is_digit(c: u8) -> bool {
		c.is_ascii_digit()
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	fn read_word(&mut self) -> &'a str {
		let orig = self.i;
		self.proceed_while(Parser::is_letter);
		&self.line[orig .. self.i]
	}

	fn read_number(&mut self) -> Option<Result<RawFd, std::num::ParseIntError>> {
		let orig = self.i;
		self.proceed_while(Parser::is_digit);
		if orig == self.i {
			None
		} else {
			Some(self.line[orig .. self.i].parse())
		}
	}

	fn read_target(&mut self) -> ParseResult<String> {
		if self.peek() == Some(b'&') {
			self.i += 1;
			return match self.read_number() {
				Some(Ok(n)) => Ok(format!("&{}", n)),
				Some(Err(e)) => Err(e.to_string()),
				None => Err("expected a descriptor number after '&'".to_string()),
			};
		}
		let target = self.read_word();
		if target.is_empty() {
			return Err("empty redirect".to_string());
		}
		Ok(target.to_string())
	}

	fn parse_redirect(&mut self) -> ParseResult<Option<RedirectSpec>> {
		let orig = self.i;
		let num = self.read_number();

		let mode = match self.peek() {
			Some(b'<') => {
				self.i += 1;
				RedirectMode::Read
			},
			Some(b'>') => if self.line.as_bytes().get(self.i + 1) == Some(&b'>') {
				self.i += 2;
				RedirectMode::Append
			} else {
				self.i += 1;
				RedirectMode::Truncate
			},
			_ => {
				self.i = orig;
				return Ok(None);
			},
		};

		let from = match num {
			None => if mode == RedirectMode::Read { 0 } else { 1 },
			Some(Ok(n)) => n,
			Some(Err(e)) => { return Err(e.to_string()); },
		};

		self.skip_whitespaces();
		let target = self.read_target()?;
		Ok(Some(RedirectSpec::new(from, mode, target)))
	}

	fn parse_command(&mut self) -> ParseResult<CommandStep> {
		let mut redirects: Vec<RedirectSpec> = vec![];
		let mut words: Vec<String> = vec![];

		loop {
			self.skip_whitespaces();
			if let Some(redirect) = self.parse_redirect()? {
				redirects.push(redirect);
				continue;
			}
			let word = self.read_word();
			if word.is_empty() {
				break;
			}
			words.push(word.to_string());
		}

		let mut words = words.into_iter();
		let name = words.next().ok_or_else(|| "empty command".to_string())?;
		Ok(CommandStep::new(name, words.collect(), redirects))
	}

	fn parse_pipeline(&mut self) -> ParseResult<Pipeline> {
		let mut steps: Vec<CommandStep> = vec![];
		let mut is_background = false;

		loop {
			steps.push(self.parse_command()?);
			match self.peek() {
				Some(b'|') => { self.i += 1; },
				Some(b'&') => {
					self.i += 1;
					is_background = true;
					break;
				},
				Some(b';') => {
					self.i += 1;
					break;
				},
				Some(c) => { return Err(format!("unknown command separator: '{}'", c as char)); },
				None => { break; },
			}
		}
		Ok(Pipeline::new(steps, is_background))
	}

	fn parse_sequence(&mut self) -> ParseResult<Vec<Pipeline>> {
		let mut pipelines = vec![];
		loop {
			self.skip_whitespaces();
			if self.peek().is_none() {
				break;
			}
			pipelines.push(self.parse_pipeline()?);
		}
		Ok(pipelines)
	}
}

/// Splits one input line into pipelines. `;` and `&` end a pipeline, `|`
/// joins steps. There is no quoting or expansion.
pub fn parse(line: &str) -> ParseResult<Vec<Pipeline>> {
	let mut parser = Parser { line: line, i: 0 };
	parser.parse_sequence()
}
