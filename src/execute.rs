use crate::block::BlockStorage;
use crate::command::{Command, InsertCommand};
use crate::error::{HashFileError, Result};
use crate::hash_file::HashFile;
use crate::record::Record;

/// Runs one command and returns the text to show for it
pub fn execute_command<S: BlockStorage>(db: &mut HashFile<S>, cmd: Command) -> Result<String> {
    match cmd {
        Command::Create { path, depth } => {
            db.create_index(&path, depth)?;
            Ok(format!("created {} with {} buckets", path, depth))
        }
        Command::Open(path) => Ok(db.open_index(&path)?.to_string()),
        Command::Close(desc) => {
            db.close_file(desc)?;
            Ok(String::new())
        }
        Command::Insert(InsertCommand {
            desc,
            id,
            name,
            surname,
            city,
        }) => {
            let record = Record::new(id, name, surname, city)?;
            db.insert_entry(desc, &record)?;
            Ok(String::new())
        }
        Command::Scan(desc) => {
            let lines = db
                .all_entries(desc)?
                .map(|record| record.map(|record| record.to_string()))
                .collect::<Result<Vec<_>>>()?;
            Ok(lines.join("\n"))
        }
        Command::Find { desc, id } => match db.find_entry(desc, id) {
            Ok(record) => Ok(record.to_string()),
            Err(err @ HashFileError::NotFound(_)) => Ok(err.to_string()),
            Err(err) => Err(err),
        },
        Command::Stats(desc) => Ok(db.statistics(desc)?.to_string()),
        Command::Exit => {
            db.close_all()?;
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::FileBlockStorage;
    use crate::open_table::IndexDesc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn run(db: &mut HashFile<FileBlockStorage>, line: &str) -> Result<String> {
        execute_command(db, line.parse().unwrap())
    }

    #[test]
    fn test_session() {
        let dir = TempDir::new().unwrap();
        let mut db = HashFile::new(FileBlockStorage::with_root(dir.path()));

        assert_eq!(
            run(&mut db, "CREATE people.db 10").unwrap(),
            "created people.db with 10 buckets"
        );
        assert_eq!(run(&mut db, "OPEN people.db").unwrap(), "0");
        run(&mut db, r#"INSERT 0 20 "Eleni" "Georgiou" "Volos""#).unwrap();
        run(&mut db, r#"INSERT 0 0 "Kostas" "Dimou" "Larisa""#).unwrap();

        assert_eq!(
            run(&mut db, "SCAN 0").unwrap(),
            "20, Eleni, Georgiou, Volos\n0, Kostas, Dimou, Larisa"
        );
        assert_eq!(
            run(&mut db, "FIND 0 0").unwrap(),
            "0, Kostas, Dimou, Larisa"
        );
        assert_eq!(
            run(&mut db, "FIND 0 5").unwrap(),
            "There is no record with id = 5"
        );
        assert!(run(&mut db, "STATS 0").unwrap().contains("Records: 2"));

        assert!(matches!(
            run(&mut db, r#"INSERT 0 1 "a name far too long" "b" "c""#),
            Err(HashFileError::RecordField { field: "name", .. })
        ));
        assert!(matches!(
            run(&mut db, "SCAN 4"),
            Err(HashFileError::InvalidHandle(_))
        ));

        run(&mut db, "EXIT").unwrap();
        assert!(db.open_files().is_empty());
        assert!(matches!(
            db.close_file(IndexDesc::from(0)),
            Err(HashFileError::InvalidHandle(_))
        ));
    }
}
