use std::path::Path;

use tokio::{fs::File, io::BufReader};
use tracing::debug;

use crate::setup::*;
use crate::stdin::process_from_reader;

/// Runs the commands of a script file, one per line, then closes every
/// index that is still open
pub async fn process_script(path: impl AsRef<Path>, config: CliConfig) -> std::io::Result<()> {
    let path = path.as_ref();
    debug!("Running script {:?}", path);
    let file = File::open(path).await?;
    process_from_reader(BufReader::new(file), config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::FileBlockStorage;
    use crate::hash_file::HashFile;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_script_persists_records() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("load.txt");
        std::fs::write(
            &script,
            "# load two people\n\
             CREATE people.db 5\n\
             OPEN people.db\n\
             INSERT 0 3 \"Maria\" \"Papadopoulou\" \"Patra\"\n\
             INSERT 0 8 \"Nikos\" \"Ioannou\" \"Chania\"\n",
        )
        .unwrap();

        let config = CliConfig {
            data_dir: dir.path().join("data"),
            ..CliConfig::default()
        };
        process_script(&script, config).await.unwrap();

        let mut db = HashFile::new(FileBlockStorage::with_root(dir.path().join("data")));
        let desc = db.open_index("people.db").unwrap();
        let ids: Vec<i32> = db
            .all_entries(desc)
            .unwrap()
            .map(|record| record.unwrap().id())
            .collect();
        assert_eq!(ids, vec![3, 8]);
    }

    #[tokio::test]
    async fn test_missing_script() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig {
            data_dir: dir.path().to_path_buf(),
            ..CliConfig::default()
        };
        assert!(process_script(dir.path().join("absent.txt"), config)
            .await
            .is_err());
    }
}
