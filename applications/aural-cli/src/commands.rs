/// Line commands read from stdin
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  play N      play track N (0-based)
  toggle      play / pause
  stop        stop playback
  next, prev  skip forward / back
  ff, rew     seek forward / backward one step
  seek P      seek to P percent
  pos         show position
  repeat      cycle repeat mode (off, one, all)
  shuffle     toggle shuffle
  add PATH    append a file to the playlist
  rm N        remove track N
  mv A B      move track A to position B
  sort        sort the playlist by title
  clear       remove every track
  ls          list the playlist
  help        show this help
  quit        exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play(usize),
    Toggle,
    Stop,
    Next,
    Previous,
    SeekForward,
    SeekBackward,
    Seek(f64),
    Position,
    Repeat,
    Shuffle,
    Add(PathBuf),
    Remove(usize),
    Move(usize, usize),
    Sort,
    Clear,
    List,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0} (try 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("Invalid argument for '{command}': {value}")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },
}

fn argument<T: FromStr>(
    command: &'static str,
    value: Option<&str>,
) -> Result<T, ParseCommandError> {
    let value = value.ok_or(ParseCommandError::MissingArgument(command))?;
    value
        .parse()
        .map_err(|_| ParseCommandError::InvalidArgument {
            command,
            value: value.to_string(),
        })
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (line, None),
        };

        let command = match name.to_lowercase().as_str() {
            "" => return Err(ParseCommandError::Empty),
            "play" | "p" => Command::Play(argument("play", rest)?),
            "toggle" | "t" => Command::Toggle,
            "stop" | "s" => Command::Stop,
            "next" | "n" => Command::Next,
            "prev" | "previous" => Command::Previous,
            "ff" => Command::SeekForward,
            "rew" => Command::SeekBackward,
            "seek" => Command::Seek(argument("seek", rest)?),
            "pos" => Command::Position,
            "repeat" => Command::Repeat,
            "shuffle" => Command::Shuffle,
            "add" => Command::Add(PathBuf::from(
                rest.ok_or(ParseCommandError::MissingArgument("add"))?,
            )),
            "rm" => Command::Remove(argument("rm", rest)?),
            "mv" => {
                let mut args = rest.unwrap_or_default().split_whitespace();
                let from = argument("mv", args.next())?;
                let to = argument("mv", args.next())?;
                Command::Move(from, to)
            }
            "sort" => Command::Sort,
            "clear" => Command::Clear,
            "ls" | "list" => Command::List,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!("play 2".parse::<Command>(), Ok(Command::Play(2)));
        assert_eq!("  seek 37.5 ".parse::<Command>(), Ok(Command::Seek(37.5)));
        assert_eq!("mv 0 3".parse::<Command>(), Ok(Command::Move(0, 3)));
        assert_eq!(
            "add /music/My Song.flac".parse::<Command>(),
            Ok(Command::Add(PathBuf::from("/music/My Song.flac")))
        );
        assert_eq!("NEXT".parse::<Command>(), Ok(Command::Next));
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!("".parse::<Command>(), Err(ParseCommandError::Empty));
        assert_eq!(
            "play".parse::<Command>(),
            Err(ParseCommandError::MissingArgument("play"))
        );
        assert_eq!(
            "rm x".parse::<Command>(),
            Err(ParseCommandError::InvalidArgument {
                command: "rm",
                value: "x".to_string()
            })
        );
        assert_eq!(
            "mv 1".parse::<Command>(),
            Err(ParseCommandError::MissingArgument("mv"))
        );
        assert!(matches!(
            "dance".parse::<Command>(),
            Err(ParseCommandError::Unknown(_))
        ));
    }
}
