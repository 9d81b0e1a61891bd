//! The Maros-Meszaros problem set.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Known Maros-Meszaros problem names (138 problems)
pub const MAROS_MESZAROS_PROBLEMS: &[&str] = &[
    "AUG2D", "AUG2DC", "AUG2DCQP", "AUG2DQP", "AUG3D", "AUG3DC", "AUG3DCQP", "AUG3DQP", "BOYD1",
    "BOYD2", "CONT-050", "CONT-100", "CONT-101", "CONT-200", "CONT-201", "CONT-300", "CVXQP1_L",
    "CVXQP1_M", "CVXQP1_S", "CVXQP2_L", "CVXQP2_M", "CVXQP2_S", "CVXQP3_L", "CVXQP3_M", "CVXQP3_S",
    "DPKLO1", "DTOC3", "DUAL1", "DUAL2", "DUAL3", "DUAL4", "DUALC1", "DUALC2", "DUALC5", "DUALC8",
    "EXDATA", "GENHS28", "GOULDQP2", "GOULDQP3", "HS118", "HS21", "HS268", "HS35", "HS35MOD",
    "HS51", "HS52", "HS53", "HS76", "HUES-MOD", "HUESTIS", "KSIP", "LASER", "LISWET1", "LISWET10",
    "LISWET11", "LISWET12", "LISWET2", "LISWET3", "LISWET4", "LISWET5", "LISWET6", "LISWET7",
    "LISWET8", "LISWET9", "LOTSCHD", "MOSARQP1", "MOSARQP2", "POWELL20", "PRIMAL1", "PRIMAL2",
    "PRIMAL3", "PRIMAL4", "PRIMALC1", "PRIMALC2", "PRIMALC5", "PRIMALC8", "Q25FV47", "QADLITTL",
    "QAFIRO", "QBANDM", "QBEACONF", "QBORE3D", "QBRANDY", "QCAPRI", "QE226", "QETAMACR",
    "QFFFFF80", "QFORPLAN", "QGFRDXPN", "QGROW15", "QGROW22", "QGROW7", "QISRAEL", "QPCBLEND",
    "QPCBOEI1", "QPCBOEI2", "QPCSTAIR", "QPILOTNO", "QPTEST", "QRECIPE", "QSC205", "QSCAGR25",
    "QSCAGR7", "QSCFXM1", "QSCFXM2", "QSCFXM3", "QSCORPIO", "QSCRS8", "QSCSD1", "QSCSD6", "QSCSD8",
    "QSCTAP1", "QSCTAP2", "QSCTAP3", "QSEBA", "QSHARE1B", "QSHARE2B", "QSHELL", "QSHIP04L",
    "QSHIP04S", "QSHIP08L", "QSHIP08S", "QSHIP12L", "QSHIP12S", "QSIERRA", "QSTAIR", "QSTANDAT",
    "S268", "STADAT1", "STADAT2", "STADAT3", "STCQP1", "STCQP2", "TAME", "UBH1", "VALUES", "YAO",
    "ZECEVIC2",
];

/// A fixed, ordered list of problem names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemSet {
    pub names: Vec<String>,
}

impl ProblemSet {
    /// The canonical 138 Maros-Meszaros problems.
    pub fn maros_meszaros() -> Self {
        Self {
            names: MAROS_MESZAROS_PROBLEMS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Every `.mat` file in `dir`, by file stem, sorted.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read problem directory {}", dir.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("mat") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        if names.is_empty() {
            bail!("No .mat files in {}", dir.display());
        }
        names.sort();

        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Path of the problem file `name` inside `dir`.
    pub fn problem_path<P: AsRef<Path>>(dir: P, name: &str) -> PathBuf {
        dir.as_ref().join(format!("{}.mat", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_set() {
        let set = ProblemSet::maros_meszaros();
        assert_eq!(set.len(), 138);
        assert_eq!(set.names[0], "AUG2D");
        assert!(set.names.iter().any(|n| n == "QAFIRO"));
    }

    #[test]
    fn test_canonical_set_is_complete() {
        let set = ProblemSet::maros_meszaros();
        for name in ["GENHS28", "QPTEST", "CONT-300", "ZECEVIC2"] {
            assert!(set.names.iter().any(|n| n == name), "{} missing", name);
        }

        let mut unique = set.names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 138);
    }

    #[test]
    fn test_from_dir_sorted_mat_stems() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["HS21.mat", "AUG2D.mat", "README.txt", "QAFIRO.mat"] {
            fs::write(dir.path().join(file), b"").unwrap();
        }

        let set = ProblemSet::from_dir(dir.path()).unwrap();
        assert_eq!(set.names, vec!["AUG2D", "HS21", "QAFIRO"]);
        assert_eq!(
            ProblemSet::problem_path(dir.path(), "HS21"),
            dir.path().join("HS21.mat")
        );
    }

    #[test]
    fn test_empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProblemSet::from_dir(dir.path()).is_err());
    }
}
