use std::str::FromStr;

use crate::open_table::IndexDesc;
use crate::parse::parse_command;

#[derive(Debug, Clone, PartialEq)]
pub struct InsertCommand {
    pub desc: IndexDesc,
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub city: String,
}

/// One line of the command language
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create { path: String, depth: u32 },
    Open(String),
    Close(IndexDesc),
    Insert(InsertCommand),
    Scan(IndexDesc),
    Find { desc: IndexDesc, id: i32 },
    Stats(IndexDesc),
    Exit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_command(s)
    }
}
