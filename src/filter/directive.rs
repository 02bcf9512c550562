//! Directive text -> `FilterConfig`.
//!
//! ```text
//! extauth {
//!     endpoint http://127.0.0.1:8000/
//!     timeout 500ms
//!     copy-request-header Authorization
//!     copy-response-header X-Token
//!     set-header X-Original-Uri {http.request.uri}
//! }
//! ```
//!
//! The `extauth { ... }` wrapper is optional. Parsing does not validate; see
//! [`Validate`](super::Validate).

use std::str::FromStr;

use super::config::{ConfigError, DEFAULT_TIMEOUT, FilterConfig};

const BLOCK_NAME: &str = "extauth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Start,
    Bare,
    Open,
    Closed,
}

impl FromStr for FilterConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse(text)
    }
}

pub fn parse(text: &str) -> Result<FilterConfig, ConfigError> {
    let mut config = FilterConfig::default();
    let mut block = Block::Start;
    let mut last_line = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let tokens = tokenize(raw, line)?;
        let Some((head, args)) = tokens.split_first() else {
            continue;
        };
        last_line = line;

        match (block, head.as_str()) {
            (Block::Start, BLOCK_NAME) => {
                if args != ["{"] {
                    return Err(syntax(line, "expected `extauth {`"));
                }
                block = Block::Open;
            }
            (Block::Open, "}") if args.is_empty() => block = Block::Closed,
            (Block::Closed, _) => {
                return Err(syntax(line, "unexpected content after closing brace"));
            }
            (_, "{" | "}") => return Err(syntax(line, "unexpected brace")),
            (Block::Start | Block::Bare, _) => {
                block = Block::Bare;
                apply(&mut config, line, head, args)?;
            }
            (Block::Open, _) => apply(&mut config, line, head, args)?,
        }
    }

    if block == Block::Open {
        return Err(syntax(last_line, "unterminated extauth block"));
    }

    if config.timeout.is_zero() {
        config.timeout = DEFAULT_TIMEOUT;
    }

    Ok(config)
}

fn apply(
    config: &mut FilterConfig,
    line: usize,
    name: &str,
    args: &[String],
) -> Result<(), ConfigError> {
    if args.iter().any(|arg| arg == "{" || arg == "}") {
        return Err(syntax(line, "unexpected brace"));
    }

    match name {
        "endpoint" => {
            config.endpoint = single(line, "endpoint", args)?.to_string();
        }
        "timeout" => {
            let text = single(line, "timeout", args)?;
            config.timeout = humantime::parse_duration(text)
                .map_err(|source| ConfigError::Timeout { line, source })?;
        }
        "copy-request-header" => {
            non_empty(line, "copy-request-header", args)?;
            config.copy_request_headers.extend_from_slice(args);
        }
        "copy-response-header" => {
            non_empty(line, "copy-response-header", args)?;
            config.copy_response_headers.extend_from_slice(args);
        }
        "set-header" => {
            if args.is_empty() || args.len() % 2 != 0 {
                return Err(ConfigError::ArgCount {
                    line,
                    directive: "set-header",
                });
            }
            for pair in args.chunks_exact(2) {
                config.insert_set_header(pair[0].clone(), pair[1].clone());
            }
        }
        other => {
            return Err(ConfigError::UnknownDirective {
                line,
                directive: other.to_string(),
            });
        }
    }

    Ok(())
}

fn single<'a>(
    line: usize,
    directive: &'static str,
    args: &'a [String],
) -> Result<&'a str, ConfigError> {
    match args {
        [value] => Ok(value),
        _ => Err(ConfigError::ArgCount { line, directive }),
    }
}

fn non_empty(line: usize, directive: &'static str, args: &[String]) -> Result<(), ConfigError> {
    if args.is_empty() {
        return Err(ConfigError::ArgCount { line, directive });
    }
    Ok(())
}

fn syntax(line: usize, message: &'static str) -> ConfigError {
    ConfigError::Syntax { line, message }
}

/// Splits a line on whitespace. Double quotes group a token (`\"` and `\\`
/// escape inside them); `#` outside quotes starts a comment.
fn tokenize(raw: &str, line: usize) -> Result<Vec<String>, ConfigError> {
    let mut tokens = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            break;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some(escaped @ ('"' | '\\')) => token.push(escaped),
                        Some(other) => {
                            token.push('\\');
                            token.push(other);
                        }
                        None => token.push('\\'),
                    },
                    _ => token.push(c),
                }
            }
            if !closed {
                return Err(syntax(line, "unterminated quote"));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}
