//! Argument parsing for the `subsync` binary.

use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Extract {
        file: PathBuf,
        host: String,
    },
    Tail {
        file: PathBuf,
        host: String,
        count: Option<usize>,
    },
    Ask {
        file: PathBuf,
        host: String,
        question: String,
        session: Option<String>,
    },
    Health,
    Sweep,
    Help,
}

pub const USAGE: &str = "\
SubSync — ask questions about an AI chat transcript

Usage: subsync <command> [args]

Commands:
  extract <file.html> <host>                  Print the formatted transcript
  tail <file.html> <host> [n]                 Print the last n turns (default 3)
  ask <file.html> <host> [--session <id>] <question...>
                                              Ask a question about the page
  health                                      Check the backend relay
  sweep                                       Remove expired session snapshots
  help                                        Show this help message

Environment:
  SUBSYNC_DATA_DIR        data directory (default: data)
  SUBSYNC_API_KEY         provider credential (relay is used when unset)
  SUBSYNC_MODEL           model override
  SUBSYNC_BACKEND_URL     relay address
  SUBSYNC_CONTEXT_WINDOW  live turns sent with each question (default 3)
  RUST_LOG                log filter (default: info)";

/// Parse everything after the program name.
pub fn parse(args: &[String]) -> Result<Command, String> {
    let Some(name) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];

    match name.as_str() {
        "extract" => {
            let (file, host) = page_args(name, rest)?;
            Ok(Command::Extract { file, host })
        }
        "tail" => {
            let (file, host) = page_args(name, rest)?;
            let count = match rest.get(2) {
                Some(n) => Some(
                    n.parse()
                        .map_err(|_| format!("Invalid turn count: {}", n))?,
                ),
                None => None,
            };
            Ok(Command::Tail { file, host, count })
        }
        "ask" => {
            let (file, host) = page_args(name, rest)?;
            let mut words = &rest[2..];
            let mut session = None;
            if words.first().map(String::as_str) == Some("--session") {
                let id = words
                    .get(1)
                    .ok_or_else(|| "--session needs a session id".to_string())?;
                session = Some(id.clone());
                words = &words[2..];
            }
            let question = words.join(" ");
            if question.trim().is_empty() {
                return Err("Usage: subsync ask <file.html> <host> [--session <id>] <question...>".into());
            }
            Ok(Command::Ask {
                file,
                host,
                question,
                session,
            })
        }
        "health" => Ok(Command::Health),
        "sweep" => Ok(Command::Sweep),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(format!(
            "Unknown command: {}. Use 'subsync help' for usage.",
            other
        )),
    }
}

fn page_args(command: &str, rest: &[String]) -> Result<(PathBuf, String), String> {
    match (rest.first(), rest.get(1)) {
        (Some(file), Some(host)) => Ok((PathBuf::from(file), host.clone())),
        _ => Err(format!(
            "Usage: subsync {} <file.html> <host> ...",
            command
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_no_args_is_help() {
        assert_eq!(parse(&[]).unwrap(), Command::Help);
        assert_eq!(parse(&args("--help")).unwrap(), Command::Help);
    }

    #[test]
    fn test_extract_and_tail() {
        assert_eq!(
            parse(&args("extract page.html claude.ai")).unwrap(),
            Command::Extract {
                file: PathBuf::from("page.html"),
                host: "claude.ai".into()
            }
        );
        assert_eq!(
            parse(&args("tail page.html chatgpt.com 5")).unwrap(),
            Command::Tail {
                file: PathBuf::from("page.html"),
                host: "chatgpt.com".into(),
                count: Some(5)
            }
        );
        assert!(parse(&args("tail page.html chatgpt.com five")).is_err());
        assert!(parse(&args("extract page.html")).is_err());
    }

    #[test]
    fn test_ask_joins_question() {
        assert_eq!(
            parse(&args("ask p.html claude.ai what was decided?")).unwrap(),
            Command::Ask {
                file: PathBuf::from("p.html"),
                host: "claude.ai".into(),
                question: "what was decided?".into(),
                session: None,
            }
        );
    }

    #[test]
    fn test_ask_with_session() {
        let cmd = parse(&args("ask p.html claude.ai --session session_1_abc and then?")).unwrap();
        assert_eq!(
            cmd,
            Command::Ask {
                file: PathBuf::from("p.html"),
                host: "claude.ai".into(),
                question: "and then?".into(),
                session: Some("session_1_abc".into()),
            }
        );
        assert!(parse(&args("ask p.html claude.ai")).is_err());
        assert!(parse(&args("ask p.html claude.ai --session")).is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse(&args("serve")).unwrap_err();
        assert!(err.contains("Unknown command: serve"));
    }
}
