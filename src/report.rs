//! CSV output for downstream plotting and graph tools: the per-cycle health tallies of a run
//! and the person-venue membership relation.
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;
use log::trace;
use serde::Serialize;

use crate::country::{HealthTally, Membership};
use crate::error::ContagionError;

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist. Returns the file if successful.
fn create_report_file(path: &Path) -> Result<File, ContagionError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(ContagionError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ContagionError> {
    let file = create_report_file(path)?;
    let mut writer = Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    trace!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Writes one row per cycle with columns `cycle,healthy,infected,recovered,dead`.
///
/// # Errors
///
/// `ReportError` if `path` is not a `.csv` file, or the I/O or CSV error that stopped writing.
pub fn write_tally_report(path: impl AsRef<Path>, tallies: &[HealthTally]) -> Result<(), ContagionError> {
    write_rows(path.as_ref(), tallies)
}

/// Writes one row per membership edge with columns `person,venue,kind`.
///
/// # Errors
///
/// `ReportError` if `path` is not a `.csv` file, or the I/O or CSV error that stopped writing.
pub fn write_membership_report(
    path: impl AsRef<Path>,
    membership: &[Membership],
) -> Result<(), ContagionError> {
    write_rows(path.as_ref(), membership)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::PersonId;
    use crate::venue::{VenueId, VenueKind};
    use serde_derive::Deserialize;
    use tempfile::tempdir;

    #[derive(Deserialize)]
    struct TallyRow {
        cycle: u32,
        healthy: usize,
        infected: usize,
        recovered: usize,
        dead: usize,
    }

    #[test]
    fn writes_tallies() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("tallies.csv");
        let tallies = [
            HealthTally {
                cycle: 0,
                healthy: 9,
                infected: 1,
                recovered: 0,
                dead: 0,
            },
            HealthTally {
                cycle: 1,
                healthy: 7,
                infected: 2,
                recovered: 0,
                dead: 1,
            },
        ];
        write_tally_report(&path, &tallies).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["cycle", "healthy", "infected", "recovered", "dead"]
        );
        let rows: Vec<TallyRow> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].cycle, 1);
        assert_eq!(rows[1].healthy, 7);
        assert_eq!(rows[1].infected, 2);
        assert_eq!(rows[1].recovered, 0);
        assert_eq!(rows[1].dead, 1);
    }

    #[test]
    fn writes_membership() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("membership.csv");
        let membership = [
            Membership {
                person: PersonId(0),
                venue: VenueId(1),
                kind: VenueKind::Household,
            },
            Membership {
                person: PersonId(0),
                venue: VenueId(0),
                kind: VenueKind::Workplace,
            },
        ];
        write_membership_report(&path, &membership).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "person,venue,kind\n0,1,Household\n0,0,Workplace\n"
        );
    }

    #[test]
    fn only_csvs_allowed() {
        let temp_dir = tempdir().unwrap();
        let result = write_tally_report(temp_dir.path().join("tallies.tsv"), &[]);
        assert!(matches!(result, Err(ContagionError::ReportError(_))));
    }
}
