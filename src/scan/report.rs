use std::fmt;

use super::MissingCounts;

impl fmt::Display for MissingCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "The directory has {} files without a description.", self.files)?;
        writeln!(f, "It also has {} folders without a description.", self.folders)?;
        write!(
            f,
            "Finally, {} spreadsheet files are missing sheet descriptions.",
            self.sheet_manifests
        )
    }
}

/// Print the end-of-run summary to stdout and the log.
pub fn report_summary(missing: &MissingCounts) {
    log::info!(
        "Missing descriptions: files={}, folders={}, sheet manifests={}",
        missing.files,
        missing.folders,
        missing.sheet_manifests
    );
    println!("{}", missing);
}
