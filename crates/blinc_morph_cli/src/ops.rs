//! Edit operations accepted by `blinc-morph edit --op`
//!
//! Each op is a whitespace-separated string such as `split 0 2 0.25 0.5` or
//! `reverse 1`, applied in order to one [`PathMutator`].

use std::str::FromStr;

use blinc_morph::{Matrix, PathMutator, Point, SvgChar};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum OpError {
    #[error("empty operation")]
    Empty,

    #[error("unknown operation `{0}`")]
    Unknown(String),

    #[error("`{op}` expects {expected} arguments, found {found}")]
    Arity {
        op: String,
        expected: &'static str,
        found: usize,
    },

    #[error("invalid argument `{token}` for `{op}`")]
    Argument { op: String, token: String },
}

/// One mutator call
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Split { sub: usize, cmd: usize, ts: Vec<f64> },
    SplitHalf { sub: usize, cmd: usize },
    Unsplit { sub: usize, cmd: usize },
    Convert { sub: usize, cmd: usize, svg_char: SvgChar },
    Unconvert { sub: usize },
    Reverse { sub: usize },
    ShiftForward { sub: usize },
    ShiftBack { sub: usize },
    Move { from: usize, to: usize },
    SplitStroke { sub: usize, cmd: usize },
    SplitFill { sub: usize, start: usize, end: usize },
    UnsplitStroke { sub: usize },
    UnsplitFill { sub: usize },
    DeleteSegment { first: usize, second: usize },
    Translate { dx: f64, dy: f64 },
    Scale { sx: f64, sy: f64 },
    Collapse { x: f64, y: f64, n: usize },
    Uncollapse,
    Revert,
}

/// Tokens of one op after its name
struct Args<'a> {
    op: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Args<'a> {
    fn exactly(&self, n: usize, expected: &'static str) -> Result<(), OpError> {
        if self.tokens.len() != n {
            return Err(self.arity(expected));
        }
        Ok(())
    }

    fn arity(&self, expected: &'static str) -> OpError {
        OpError::Arity {
            op: self.op.to_string(),
            expected,
            found: self.tokens.len(),
        }
    }

    fn get<T: FromStr>(&self, i: usize) -> Result<T, OpError> {
        let token = self.tokens[i];
        token.parse().map_err(|_| OpError::Argument {
            op: self.op.to_string(),
            token: token.to_string(),
        })
    }

    fn svg_char(&self, i: usize) -> Result<SvgChar, OpError> {
        let token = self.tokens[i];
        let mut chars = token.chars();
        let svg_char = match (chars.next(), chars.next()) {
            (Some(c), None) => SvgChar::from_letter(c.to_ascii_uppercase()),
            _ => None,
        };
        svg_char.ok_or_else(|| OpError::Argument {
            op: self.op.to_string(),
            token: token.to_string(),
        })
    }
}

impl FromStr for Op {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, OpError> {
        let mut tokens = s.split_whitespace();
        let op = tokens.next().ok_or(OpError::Empty)?;
        let a = Args {
            op,
            tokens: tokens.collect(),
        };

        let parsed = match op {
            "split" => {
                if a.tokens.len() < 3 {
                    return Err(a.arity("at least 3"));
                }
                Op::Split {
                    sub: a.get(0)?,
                    cmd: a.get(1)?,
                    ts: (2..a.tokens.len())
                        .map(|i| a.get(i))
                        .collect::<Result<Vec<f64>, _>>()?,
                }
            }
            "split-half" | "unsplit" | "split-stroke" => {
                a.exactly(2, "2")?;
                let (sub, cmd) = (a.get(0)?, a.get(1)?);
                match op {
                    "split-half" => Op::SplitHalf { sub, cmd },
                    "unsplit" => Op::Unsplit { sub, cmd },
                    _ => Op::SplitStroke { sub, cmd },
                }
            }
            "convert" => {
                a.exactly(3, "3")?;
                Op::Convert {
                    sub: a.get(0)?,
                    cmd: a.get(1)?,
                    svg_char: a.svg_char(2)?,
                }
            }
            "unconvert" | "reverse" | "shift-forward" | "shift-back" | "unsplit-stroke"
            | "unsplit-fill" => {
                a.exactly(1, "1")?;
                let sub = a.get(0)?;
                match op {
                    "unconvert" => Op::Unconvert { sub },
                    "reverse" => Op::Reverse { sub },
                    "shift-forward" => Op::ShiftForward { sub },
                    "shift-back" => Op::ShiftBack { sub },
                    "unsplit-stroke" => Op::UnsplitStroke { sub },
                    _ => Op::UnsplitFill { sub },
                }
            }
            "move" => {
                a.exactly(2, "2")?;
                Op::Move {
                    from: a.get(0)?,
                    to: a.get(1)?,
                }
            }
            "split-fill" => {
                a.exactly(3, "3")?;
                Op::SplitFill {
                    sub: a.get(0)?,
                    start: a.get(1)?,
                    end: a.get(2)?,
                }
            }
            "delete-segment" => {
                a.exactly(2, "2")?;
                Op::DeleteSegment {
                    first: a.get(0)?,
                    second: a.get(1)?,
                }
            }
            "translate" => {
                a.exactly(2, "2")?;
                Op::Translate {
                    dx: a.get(0)?,
                    dy: a.get(1)?,
                }
            }
            "scale" => {
                a.exactly(2, "2")?;
                Op::Scale {
                    sx: a.get(0)?,
                    sy: a.get(1)?,
                }
            }
            "collapse" => {
                a.exactly(3, "3")?;
                Op::Collapse {
                    x: a.get(0)?,
                    y: a.get(1)?,
                    n: a.get(2)?,
                }
            }
            "uncollapse" => {
                a.exactly(0, "no")?;
                Op::Uncollapse
            }
            "revert" => {
                a.exactly(0, "no")?;
                Op::Revert
            }
            other => return Err(OpError::Unknown(other.to_string())),
        };
        Ok(parsed)
    }
}

impl Op {
    pub fn apply(&self, mutator: &mut PathMutator) -> blinc_morph::Result<()> {
        match *self {
            Op::Split { sub, cmd, ref ts } => {
                mutator.split_command(sub, cmd, ts)?;
            }
            Op::SplitHalf { sub, cmd } => {
                mutator.split_command_in_half(sub, cmd)?;
            }
            Op::Unsplit { sub, cmd } => {
                mutator.unsplit_command(sub, cmd)?;
            }
            Op::Convert { sub, cmd, svg_char } => {
                mutator.convert_command(sub, cmd, svg_char)?;
            }
            Op::Unconvert { sub } => {
                mutator.unconvert_sub_path(sub)?;
            }
            Op::Reverse { sub } => {
                mutator.reverse_sub_path(sub)?;
            }
            Op::ShiftForward { sub } => {
                mutator.shift_sub_path_forward(sub)?;
            }
            Op::ShiftBack { sub } => {
                mutator.shift_sub_path_back(sub)?;
            }
            Op::Move { from, to } => {
                mutator.move_sub_path(from, to)?;
            }
            Op::SplitStroke { sub, cmd } => {
                mutator.split_stroked_sub_path(sub, cmd)?;
            }
            Op::SplitFill { sub, start, end } => {
                mutator.split_filled_sub_path(sub, start, end)?;
            }
            Op::UnsplitStroke { sub } => {
                mutator.unsplit_stroked_sub_path(sub)?;
            }
            Op::UnsplitFill { sub } => {
                mutator.unsplit_filled_sub_path(sub)?;
            }
            Op::DeleteSegment { first, second } => {
                mutator.delete_sub_path_split_segment(first, second)?;
            }
            Op::Translate { dx, dy } => {
                mutator.add_transforms(&[Matrix::translation(dx, dy)]);
            }
            Op::Scale { sx, sy } => {
                mutator.add_transforms(&[Matrix::scale(sx, sy)]);
            }
            Op::Collapse { x, y, n } => {
                mutator.add_collapsing_sub_path(Point::new(x, y), n);
            }
            Op::Uncollapse => {
                mutator.delete_collapsing_sub_paths();
            }
            Op::Revert => {
                mutator.revert();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinc_morph::{Path, PathError};

    fn apply_all(data: &str, ops: &[&str]) -> blinc_morph::Result<String> {
        let path = Path::parse(data)?;
        let mut mutator = path.mutate();
        for op in ops {
            op.parse::<Op>().unwrap().apply(&mut mutator)?;
        }
        Ok(mutator.build().path_string())
    }

    #[test]
    fn test_parse_ops() {
        assert_eq!(
            "split 0 2 0.25 0.5".parse::<Op>(),
            Ok(Op::Split {
                sub: 0,
                cmd: 2,
                ts: vec![0.25, 0.5]
            })
        );
        assert_eq!(
            "convert 1 3 c".parse::<Op>(),
            Ok(Op::Convert {
                sub: 1,
                cmd: 3,
                svg_char: SvgChar::CubicCurve
            })
        );
        assert_eq!("  reverse   2 ".parse::<Op>(), Ok(Op::Reverse { sub: 2 }));
        assert_eq!(
            "translate -5 2.5".parse::<Op>(),
            Ok(Op::Translate { dx: -5.0, dy: 2.5 })
        );
        assert_eq!("revert".parse::<Op>(), Ok(Op::Revert));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Op>(), Err(OpError::Empty));
        assert_eq!(
            "twist 0".parse::<Op>(),
            Err(OpError::Unknown("twist".to_string()))
        );
        assert!(matches!(
            "split 0 1".parse::<Op>(),
            Err(OpError::Arity { found: 2, .. })
        ));
        assert!(matches!(
            "reverse x".parse::<Op>(),
            Err(OpError::Argument { .. })
        ));
        assert!(matches!(
            "convert 0 1 X".parse::<Op>(),
            Err(OpError::Argument { .. })
        ));
        assert!(matches!(
            "revert 1".parse::<Op>(),
            Err(OpError::Arity { .. })
        ));
    }

    #[test]
    fn test_apply_chain() {
        assert_eq!(
            apply_all("M 0 0 L 10 10 L 20 20", &["split 0 2 0.5"]).unwrap(),
            "M 0 0 L 10 10 L 15 15 L 20 20"
        );
        assert_eq!(
            apply_all(
                "M 19 11 L 5 11 L 5 13 L 19 13 Z",
                &["reverse 0", "reverse 0", "translate 1 1"]
            )
            .unwrap(),
            "M 20 12 L 6 12 L 6 14 L 20 14 Z"
        );
        assert_eq!(
            apply_all("M 0 0 L 10 0", &["collapse 5 5 2", "uncollapse"]).unwrap(),
            "M 0 0 L 10 0"
        );
    }

    #[test]
    fn test_apply_reports_engine_errors() {
        assert_eq!(
            apply_all("M 0 0 L 10 0", &["split 0 1 2"]),
            Err(PathError::InvalidParameter(2.0))
        );
        assert!(matches!(
            apply_all("M 0 0 L 10 0", &["reverse 4"]),
            Err(PathError::SubPathIndex { index: 4, .. })
        ));
    }
}
