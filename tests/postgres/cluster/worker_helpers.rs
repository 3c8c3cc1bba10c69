//! Stages the `pg_worker` binary where an unprivileged user can run it.

use super::BoxError;
use super::fs_utils::open_parent_dir;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::{Permissions, PermissionsExt};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::{Mutex, OnceLock};

static STAGED_WORKERS: OnceLock<Mutex<HashMap<Utf8PathBuf, Utf8PathBuf>>> = OnceLock::new();

/// Copies `worker` into the temp directory with world-executable
/// permissions. Each source is staged once per test process.
pub(super) fn prepare_pg_worker(worker: &Utf8Path) -> Result<Utf8PathBuf, BoxError> {
    let mut staged = STAGED_WORKERS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(existing) = staged.get(worker) {
        return Ok(existing.clone());
    }

    let temp_dir = Utf8PathBuf::try_from(std::env::temp_dir())?;
    let destination = temp_dir.join(format!(
        "reclaimer_pg_worker_{}_{}",
        std::process::id(),
        staged.len()
    ));
    let (source_dir, source_name) = open_parent_dir(worker)?;
    let (destination_dir, destination_name) = open_parent_dir(&destination)?;

    match destination_dir.remove_file(destination_name) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(Box::new(err)),
    }
    source_dir.copy(source_name, &destination_dir, destination_name)?;
    destination_dir.set_permissions(destination_name, Permissions::from_mode(0o755))?;

    staged.insert(worker.to_path_buf(), destination.clone());
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::prepare_pg_worker;
    use camino::Utf8PathBuf;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn staged_worker_is_executable_and_reused() {
        let temp_dir = Utf8PathBuf::try_from(std::env::temp_dir()).expect("utf-8 temp dir");
        let source = temp_dir.join(format!("pg_worker_source_{}", uuid::Uuid::new_v4()));
        std::fs::write(&source, b"#!/bin/sh\nexit 0\n").expect("write worker stand-in");

        let staged = prepare_pg_worker(&source).expect("stage worker");
        let again = prepare_pg_worker(&source).expect("stage worker again");

        assert_eq!(staged, again);
        let mode = std::fs::metadata(&staged)
            .expect("staged worker metadata")
            .permissions()
            .mode();
        assert_ne!(mode & 0o111, 0, "staged worker mode {mode:o} is not executable");
    }
}
