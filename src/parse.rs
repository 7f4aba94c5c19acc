use std::str::FromStr;

use crate::command::{Command, InsertCommand};
use crate::open_table::IndexDesc;

pub fn parse_command(input: &str) -> Result<Command, String> {
    let tokens = Lexer::new(input).lex()?;
    parse_tokens(tokens.into_iter())
}

#[derive(Debug, Clone, Copy)]
enum Keyword {
    Create,
    Open,
    Close,
    Insert,
    Scan,
    Find,
    Stats,
    Exit,
}

#[derive(Debug)]
enum Token {
    Keyword(Keyword),
    Ident(String),
    Literal(String),
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '/')
}

#[derive(Debug)]
struct Lexer {
    input: Vec<char>,
    pos: usize,
    buffer: String,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(input: &str) -> Lexer {
        Lexer {
            input: input.chars().collect(),
            pos: 0,
            buffer: String::new(),
            tokens: Vec::new(),
        }
    }

    fn lex(mut self) -> Result<Vec<Token>, String> {
        while let Some(c) = self.input.get(self.pos) {
            if c.is_whitespace() {
                self.pos += 1;
            } else if is_ident_char(*c) {
                self.lex_ident();
            } else if c == &'"' {
                self.lex_literal()?;
            } else {
                return Err(format!("Unexpected character: {}", c));
            }
        }
        Ok(self.tokens)
    }

    fn lex_ident(&mut self) {
        while let Some(c) = self.input.get(self.pos) {
            if !is_ident_char(*c) {
                break;
            }
            self.buffer.push(*c);
            self.pos += 1;
        }

        let keyword = match self.buffer.to_ascii_uppercase().as_str() {
            "CREATE" => Some(Keyword::Create),
            "OPEN" => Some(Keyword::Open),
            "CLOSE" => Some(Keyword::Close),
            "INSERT" => Some(Keyword::Insert),
            "SCAN" => Some(Keyword::Scan),
            "FIND" => Some(Keyword::Find),
            "STATS" => Some(Keyword::Stats),
            "EXIT" => Some(Keyword::Exit),
            _ => None,
        };
        match keyword {
            Some(keyword) => self.tokens.push(Token::Keyword(keyword)),
            None => self.tokens.push(Token::Ident(self.buffer.clone())),
        }
        self.buffer.clear();
    }

    fn lex_literal(&mut self) -> Result<(), String> {
        // Skip the first '"'
        self.pos += 1;

        // Flag to indicate if the next character is escaped
        let mut is_escaped = false;

        while let Some(c) = self.input.get(self.pos) {
            self.pos += 1;
            if is_escaped {
                match c {
                    '"' | '\\' => self.buffer.push(*c),
                    'n' => self.buffer.push('\n'),
                    't' => self.buffer.push('\t'),
                    _ => {
                        return Err(format!("Invalid escaped character: {}", c));
                    }
                }
                is_escaped = false;
            } else {
                match c {
                    '"' => {
                        self.tokens.push(Token::Literal(self.buffer.clone()));
                        self.buffer.clear();
                        return Ok(());
                    }
                    '\\' => {
                        is_escaped = true;
                    }
                    _ => {
                        self.buffer.push(*c);
                    }
                }
            }
        }

        Err(format!("Unexpected end of input, {}", self.buffer))
    }
}

fn parse_tokens(mut tokens: impl Iterator<Item = Token>) -> Result<Command, String> {
    let keyword = match tokens.next() {
        Some(Token::Keyword(keyword)) => keyword,
        Some(_) => {
            return Err(
                "Expected keyword CREATE, OPEN, CLOSE, INSERT, SCAN, FIND, STATS or EXIT".into(),
            )
        }
        None => return Err("Unexpected end of input".into()),
    };

    let cmd = match keyword {
        Keyword::Create => {
            let path = parse_identifier(&mut tokens, "CREATE")?;
            let depth = parse_number(&mut tokens, "depth")?;
            Command::Create { path, depth }
        }
        Keyword::Open => Command::Open(parse_identifier(&mut tokens, "OPEN")?),
        Keyword::Close => Command::Close(parse_desc(&mut tokens)?),
        Keyword::Insert => process_insert_keyword(&mut tokens)?,
        Keyword::Scan => Command::Scan(parse_desc(&mut tokens)?),
        Keyword::Find => {
            let desc = parse_desc(&mut tokens)?;
            let id = parse_number(&mut tokens, "id")?;
            Command::Find { desc, id }
        }
        Keyword::Stats => Command::Stats(parse_desc(&mut tokens)?),
        Keyword::Exit => Command::Exit,
    };

    if tokens.next().is_some() {
        return Err(format!("Unexpected token after {:?} command", keyword));
    }
    Ok(cmd)
}

fn parse_identifier(
    tokens: &mut impl Iterator<Item = Token>,
    keyword: &str,
) -> Result<String, String> {
    match tokens.next() {
        Some(Token::Ident(ident)) => Ok(ident),
        Some(Token::Literal(literal)) => Ok(literal),
        _ => Err(format!("Expected identifier after {}", keyword)),
    }
}

fn parse_number<T: FromStr>(
    tokens: &mut impl Iterator<Item = Token>,
    what: &str,
) -> Result<T, String> {
    match tokens.next() {
        Some(Token::Ident(ident)) => ident
            .parse()
            .map_err(|_| format!("Invalid {}: {}", what, ident)),
        _ => Err(format!("Expected {}", what)),
    }
}

fn parse_desc(tokens: &mut impl Iterator<Item = Token>) -> Result<IndexDesc, String> {
    parse_number::<usize>(tokens, "index descriptor").map(IndexDesc::from)
}

fn parse_literal(tokens: &mut impl Iterator<Item = Token>, what: &str) -> Result<String, String> {
    match tokens.next() {
        Some(Token::Literal(literal)) => Ok(literal),
        _ => Err(format!("Expected quoted {}", what)),
    }
}

fn process_insert_keyword(tokens: &mut impl Iterator<Item = Token>) -> Result<Command, String> {
    let desc = parse_desc(tokens)?;
    let id = parse_number(tokens, "id")?;
    let name = parse_literal(tokens, "name")?;
    let surname = parse_literal(tokens, "surname")?;
    let city = parse_literal(tokens, "city")?;
    Ok(Command::Insert(InsertCommand {
        desc,
        id,
        name,
        surname,
        city,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("CREATE data/people.db 10").unwrap(),
            Command::Create {
                path: "data/people.db".into(),
                depth: 10
            }
        );
        assert_eq!(
            parse_command("open people.db").unwrap(),
            Command::Open("people.db".into())
        );
        assert_eq!(
            parse_command("  Close 3 ").unwrap(),
            Command::Close(IndexDesc::from(3))
        );
        assert_eq!(
            parse_command("SCAN 0").unwrap(),
            Command::Scan(IndexDesc::from(0))
        );
        assert_eq!(
            parse_command("find 1 -42").unwrap(),
            Command::Find {
                desc: IndexDesc::from(1),
                id: -42
            }
        );
        assert_eq!(
            parse_command("STATS 2").unwrap(),
            Command::Stats(IndexDesc::from(2))
        );
        assert_eq!(parse_command("exit").unwrap(), Command::Exit);
    }

    #[test]
    fn test_parse_insert_with_escapes() {
        let cmd = parse_command(r#"INSERT 0 7 "Jo \"J\"" "Smith\\Jones" "New York""#).unwrap();
        assert_eq!(
            cmd,
            Command::Insert(InsertCommand {
                desc: IndexDesc::from(0),
                id: 7,
                name: "Jo \"J\"".into(),
                surname: "Smith\\Jones".into(),
                city: "New York".into(),
            })
        );
    }

    #[test]
    fn test_quoted_path() {
        assert_eq!(
            parse_command(r#"OPEN "my file.db""#).unwrap(),
            Command::Open("my file.db".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("").is_err());
        assert!(parse_command("people.db").is_err());
        assert!(parse_command("CREATE people.db").is_err());
        assert!(parse_command("CREATE people.db -1").is_err());
        assert!(parse_command("SCAN x").is_err());
        assert!(parse_command("SCAN 0 1").is_err());
        assert!(parse_command("INSERT 0 1 \"a\" \"b\"").is_err());
        assert!(parse_command("INSERT 0 1 a b c").is_err());
        assert!(parse_command("FIND 0 \"unterminated").is_err());
        assert!(parse_command("OPEN a.db; DROP").is_err());
        assert!(parse_command(r#"INSERT 0 1 "\q" "b" "c""#).is_err());
    }

    #[test]
    fn test_from_str() {
        let cmd: Command = "EXIT".parse().unwrap();
        assert_eq!(cmd, Command::Exit);
    }
}
