//! SVG path data parsing and formatting
//!
//! Parsing runs in two passes. A nom grammar splits the data into segments
//! (a command letter plus its numbers), then each segment is resolved against
//! the current point into absolute [`Command`]s:
//!
//! - relative commands become absolute
//! - `H`/`V` become lines
//! - `S`/`T` get their reflected control point
//! - implicit repeats are expanded (extra pairs after a move are lines)
//!
//! Elliptical arcs are rejected.

use nom::{
    branch::alt,
    character::complete::{char, multispace1, one_of},
    combinator::value,
    error::{context, VerboseError, VerboseErrorKind},
    multi::many0,
    number::complete::double,
    sequence::preceded,
    Finish, IResult,
};
use tracing::debug;

use crate::command::{Command, SvgChar};
use crate::error::{PathError, Result};
use crate::geometry::Point;

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

const COMMAND_LETTERS: &str = "MmLlHhVvCcSsQqTtAaZz";

/// Whitespace and commas between tokens
fn separator(input: &str) -> ParseResult<()> {
    value(
        (),
        many0(alt((value((), multispace1), value((), char(','))))),
    )(input)
}

/// A command letter followed by its numbers
fn segment(input: &str) -> ParseResult<(char, Vec<f64>)> {
    let (input, letter) = context("command letter", one_of(COMMAND_LETTERS))(input)?;
    let (input, numbers) = many0(preceded(separator, double))(input)?;
    let (input, _) = separator(input)?;
    Ok((input, (letter, numbers)))
}

/// Format a VerboseError into a human-readable message
fn format_verbose_error(err: &VerboseError<&str>) -> String {
    let parts: Vec<String> = err
        .errors
        .iter()
        .map(|(input, kind)| {
            let preview: String = input.chars().take(20).collect();
            match kind {
                VerboseErrorKind::Context(ctx) => format!("expected {} near \"{}\"", ctx, preview),
                VerboseErrorKind::Char(c) => format!("expected '{}' near \"{}\"", c, preview),
                VerboseErrorKind::Nom(ek) => format!("{:?} near \"{}\"", ek, preview),
            }
        })
        .collect();
    if parts.is_empty() {
        "unknown parse error".to_string()
    } else {
        parts.join(", ")
    }
}

fn parse_error(offset: usize, message: impl Into<String>) -> PathError {
    PathError::Parse {
        offset,
        message: message.into(),
    }
}

/// Numbers consumed by one repetition of a command
fn arity(letter: char) -> usize {
    match letter.to_ascii_uppercase() {
        'M' | 'L' | 'T' => 2,
        'H' | 'V' => 1,
        'S' | 'Q' => 4,
        'C' => 6,
        'A' => 7,
        _ => 0,
    }
}

/// Pen state while resolving segments
#[derive(Default)]
struct Pen {
    commands: Vec<Command>,
    current: Point,
    sub_path_start: Point,
    /// Second control point of the previous cubic, for `S`
    last_cubic_control: Option<Point>,
    /// Control point of the previous quadratic, for `T`
    last_quad_control: Option<Point>,
    closed: bool,
}

impl Pen {
    fn resolve(&self, relative: bool, x: f64, y: f64) -> Point {
        if relative {
            Point::new(self.current.x + x, self.current.y + y)
        } else {
            Point::new(x, y)
        }
    }

    fn push(&mut self, command: Command) {
        self.current = command.end();
        self.commands.push(command);
    }

    fn move_to(&mut self, end: Point) {
        let start = (!self.commands.is_empty()).then_some(self.current);
        self.push(Command::move_to(start, end));
        self.sub_path_start = end;
    }

    fn line_to(&mut self, end: Point) {
        self.push(Command::line_to(self.current, end));
    }

    /// Apply one repetition of `letter` with its numbers
    fn apply(&mut self, letter: char, n: &[f64], repeat: usize) {
        let relative = letter.is_ascii_lowercase();
        let mut cubic_control = None;
        let mut quad_control = None;
        match letter.to_ascii_uppercase() {
            'M' if repeat == 0 => self.move_to(self.resolve(relative, n[0], n[1])),
            'M' | 'L' => self.line_to(self.resolve(relative, n[0], n[1])),
            'H' => {
                let x = if relative { self.current.x + n[0] } else { n[0] };
                self.line_to(Point::new(x, self.current.y));
            }
            'V' => {
                let y = if relative { self.current.y + n[0] } else { n[0] };
                self.line_to(Point::new(self.current.x, y));
            }
            'C' => {
                let c1 = self.resolve(relative, n[0], n[1]);
                let c2 = self.resolve(relative, n[2], n[3]);
                let end = self.resolve(relative, n[4], n[5]);
                self.push(Command::cubic_to(self.current, c1, c2, end));
                cubic_control = Some(c2);
            }
            'S' => {
                let c1 = self.reflect(self.last_cubic_control);
                let c2 = self.resolve(relative, n[0], n[1]);
                let end = self.resolve(relative, n[2], n[3]);
                self.push(Command::cubic_to(self.current, c1, c2, end));
                cubic_control = Some(c2);
            }
            'Q' => {
                let control = self.resolve(relative, n[0], n[1]);
                let end = self.resolve(relative, n[2], n[3]);
                self.push(Command::quad_to(self.current, control, end));
                quad_control = Some(control);
            }
            'T' => {
                let control = self.reflect(self.last_quad_control);
                let end = self.resolve(relative, n[0], n[1]);
                self.push(Command::quad_to(self.current, control, end));
                quad_control = Some(control);
            }
            'Z' => {
                self.push(Command::close_path(self.current, self.sub_path_start));
                self.closed = true;
            }
            _ => {}
        }
        self.last_cubic_control = cubic_control;
        self.last_quad_control = quad_control;
    }

    /// Reflect a previous control point about the current point
    fn reflect(&self, control: Option<Point>) -> Point {
        control.map_or(self.current, |c| {
            Point::new(2.0 * self.current.x - c.x, 2.0 * self.current.y - c.y)
        })
    }
}

/// Parse SVG path data into absolute commands.
///
/// Empty (or blank) data yields no commands.
pub fn parse_path(data: &str) -> Result<Vec<Command>> {
    let mut pen = Pen::default();
    let (mut rest, _) = separator(data)
        .finish()
        .map_err(|e| parse_error(0, format_verbose_error(&e)))?;

    while !rest.is_empty() {
        let offset = data.len() - rest.len();
        let (next, (letter, numbers)) = segment(rest).finish().map_err(|e| {
            let at = e
                .errors
                .first()
                .map_or(offset, |(fragment, _)| data.len() - fragment.len());
            parse_error(at, format_verbose_error(&e))
        })?;
        rest = next;

        if pen.commands.is_empty() && !matches!(letter, 'M' | 'm') {
            return Err(parse_error(offset, "path data must start with a move"));
        }
        if matches!(letter, 'A' | 'a') {
            return Err(parse_error(offset, "elliptical arcs are not supported"));
        }
        if numbers.iter().any(|n| !n.is_finite()) {
            return Err(parse_error(offset, "coordinates must be finite"));
        }
        let arity = arity(letter);
        let valid = if arity == 0 {
            numbers.is_empty()
        } else {
            !numbers.is_empty() && numbers.len() % arity == 0
        };
        if !valid {
            return Err(parse_error(
                offset,
                format!(
                    "'{}' expects a multiple of {} numbers, found {}",
                    letter,
                    arity,
                    numbers.len()
                ),
            ));
        }

        // Drawing after a close starts a new subpath at the closed one's start.
        if pen.closed && !matches!(letter, 'M' | 'm') {
            pen.move_to(pen.sub_path_start);
        }
        pen.closed = false;

        if arity == 0 {
            pen.apply(letter, &[], 0);
        } else {
            for (repeat, n) in numbers.chunks_exact(arity).enumerate() {
                pen.apply(letter, n, repeat);
            }
        }
    }

    debug!(commands = pen.commands.len(), "parsed path data");
    Ok(pen.commands)
}

/// Format a coordinate, trimming trailing zeros
fn format_number(value: f64, precision: Option<usize>) -> String {
    let Some(precision) = precision else {
        return value.to_string();
    };
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        s = s.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Canonical path data: absolute commands separated by single spaces
pub fn format_commands(commands: &[Command], precision: Option<usize>) -> String {
    let mut out = String::new();
    for command in commands {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push(command.svg_char().letter());
        if command.svg_char() == SvgChar::ClosePath {
            continue;
        }
        for point in &command.points()[1..] {
            out.push(' ');
            out.push_str(&format_number(point.x, precision));
            out.push(' ');
            out.push_str(&format_number(point.y, precision));
        }
    }
    out
}
