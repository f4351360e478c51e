//! Type-mapping completeness: every unresolved type is reported in one pass,
//! nothing is written, and adding the mappings makes the run clean.

use std::path::{Path, PathBuf};

use bnd_ctypes::Options;

const HEADER: &str = r#"typedef unsigned int XnStatus;

/**
 * Probes a mystery object.
 *
 * @param	pThing	[in]	The object.
 */
XN_C_API XnStatus xnMysteryProbe(XnMystery* pThing);

/**
 * Counts other objects.
 *
 * @param	pOther	[in]	The object.
 * @param	pnCount	[out]	Receives the count.
 */
XN_C_API XnStatus xnOtherCount(XnOther* pOther, unsigned* pnCount);
"#;

fn write_case(dir: &Path, type_map: &str) -> PathBuf {
    std::fs::write(dir.join("mystery.h"), HEADER).expect("write header");
    let config = format!(
        "headers = [\"mystery.h\"]\n\n[output]\nfile = \"out.py\"\n\n[type_map]\n{type_map}"
    );
    let path = dir.join("bnd-ctypes.toml");
    std::fs::write(&path, config).expect("write config");
    path
}

#[test]
fn unresolved_types_block_emission() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_case(dir.path(), "");

    let outcome = bnd_ctypes::run(Some(config.as_path()), &Options::default()).expect("run");
    assert!(outcome.output.is_none());
    assert_eq!(outcome.diagnostics.unresolved_types(), vec!["XnMystery*", "XnOther*"]);
    assert_eq!(outcome.diagnostics.exit_code(), 2);
    assert!(!dir.path().join("out.py").exists());
}

#[test]
fn adding_mappings_makes_run_clean() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_case(
        dir.path(),
        "\"XnMystery*\" = \"ctypes.c_void_p\"\n\"XnOther*\" = \"ctypes.c_void_p\"\n",
    );

    let outcome = bnd_ctypes::run(Some(config.as_path()), &Options::default()).expect("run");
    assert_eq!(outcome.diagnostics.exit_code(), 0);

    let written = std::fs::read_to_string(dir.path().join("out.py")).expect("output written");
    assert!(written.starts_with("import ctypes\n\n__version__ = \"N/A\""));
    assert!(written.contains("def xnMysteryProbe(pThing):"));
    // unsigned* is an output by convention.
    assert!(written.contains("def xnOtherCount(pOther):"));
    assert!(written.contains("@return: pnCount Receives the count."));
}
