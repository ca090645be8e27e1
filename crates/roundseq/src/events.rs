use radial::{Point, TouchId, TouchInput, TouchPhase};
use std::str::{FromStr, SplitWhitespace};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Touch(TouchInput),
    Octave(OctaveChange),
    ConfigReload,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OctaveChange {
    Up,
    Down,
    Set(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command '{0}'")]
    Unknown(String),
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("Invalid {what} '{value}'")]
    Invalid { what: &'static str, value: String },
    #[error("Unexpected trailing input '{0}'")]
    Trailing(String),
}

fn parse_word<T: FromStr>(word: &str, what: &'static str) -> Result<T, CommandError> {
    word.parse().map_err(|_| CommandError::Invalid {
        what,
        value: word.to_string(),
    })
}

fn parse_arg<T: FromStr>(
    words: &mut SplitWhitespace<'_>,
    what: &'static str,
) -> Result<T, CommandError> {
    parse_word(words.next().ok_or(CommandError::Missing(what))?, what)
}

fn parse_touch(
    phase: TouchPhase,
    words: &mut SplitWhitespace<'_>,
) -> Result<TouchInput, CommandError> {
    let id = TouchId::new(parse_arg(words, "touch id")?);
    let point = match phase {
        TouchPhase::Down | TouchPhase::Move => {
            Point::new(parse_arg(words, "x")?, parse_arg(words, "y")?)
        }
        // position is optional on lift
        TouchPhase::Up | TouchPhase::Cancel => match words.next() {
            Some(x) => Point::new(parse_word(x, "x")?, parse_arg(words, "y")?),
            None => Point::default(),
        },
    };
    Ok(TouchInput::new(id, phase, point))
}

/// One line of the control protocol, e.g. `down 3 940 540` or `octave up`.
impl FromStr for AppEvent {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let keyword = words.next().ok_or(CommandError::Empty)?;

        let event = if let Ok(phase) = keyword.parse::<TouchPhase>() {
            AppEvent::Touch(parse_touch(phase, &mut words)?)
        } else {
            match keyword.to_ascii_lowercase().as_str() {
                "octave" => {
                    let arg = words.next().ok_or(CommandError::Missing("octave"))?;
                    let change = match arg.to_ascii_lowercase().as_str() {
                        "up" | "+" => OctaveChange::Up,
                        "down" | "-" => OctaveChange::Down,
                        _ => OctaveChange::Set(parse_word(arg, "octave")?),
                    };
                    AppEvent::Octave(change)
                }
                "reload" => AppEvent::ConfigReload,
                "quit" | "shutdown" => AppEvent::Shutdown,
                _ => return Err(CommandError::Unknown(keyword.to_string())),
            }
        };

        match words.next() {
            Some(extra) => Err(CommandError::Trailing(extra.to_string())),
            None => Ok(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: u64, phase: TouchPhase, x: f64, y: f64) -> AppEvent {
        AppEvent::Touch(TouchInput::new(TouchId::new(id), phase, Point::new(x, y)))
    }

    #[test]
    fn test_touch_commands() {
        let cases = vec![
            ("down 1 940 540", touch(1, TouchPhase::Down, 940.0, 540.0)),
            ("MOVE 2 12.5 -3", touch(2, TouchPhase::Move, 12.5, -3.0)),
            ("up 1", touch(1, TouchPhase::Up, 0.0, 0.0)),
            ("  cancel 7  ", touch(7, TouchPhase::Cancel, 0.0, 0.0)),
        ];
        for (line, expected) in cases {
            assert_eq!(line.parse::<AppEvent>().unwrap(), expected, "{line}");
        }
        assert_eq!(
            "up 1 940 540".parse::<AppEvent>().unwrap(),
            touch(1, TouchPhase::Up, 940.0, 540.0)
        );
    }

    #[test]
    fn test_control_commands() {
        let cases = vec![
            ("octave up", AppEvent::Octave(OctaveChange::Up)),
            ("octave -", AppEvent::Octave(OctaveChange::Down)),
            ("Octave 6", AppEvent::Octave(OctaveChange::Set(6))),
            ("reload", AppEvent::ConfigReload),
            ("quit", AppEvent::Shutdown),
        ];
        for (line, expected) in cases {
            assert_eq!(line.parse::<AppEvent>().unwrap(), expected, "{line}");
        }
    }

    #[test]
    fn test_malformed_commands() {
        assert_eq!("".parse::<AppEvent>(), Err(CommandError::Empty));
        assert_eq!(
            "tap 1 2 3".parse::<AppEvent>(),
            Err(CommandError::Unknown("tap".into()))
        );
        assert_eq!(
            "down 1 940".parse::<AppEvent>(),
            Err(CommandError::Missing("y"))
        );
        assert_eq!(
            "move x 1 2".parse::<AppEvent>(),
            Err(CommandError::Invalid {
                what: "touch id",
                value: "x".into()
            })
        );
        assert_eq!(
            "octave sideways".parse::<AppEvent>(),
            Err(CommandError::Invalid {
                what: "octave",
                value: "sideways".into()
            })
        );
        assert_eq!(
            "reload now".parse::<AppEvent>(),
            Err(CommandError::Trailing("now".into()))
        );
    }
}
