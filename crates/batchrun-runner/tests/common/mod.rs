//! Shared fixtures: a shell solver whose behaviour is picked by case content.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Case file contents understood by the fixture solver.
pub const SOLVES: &str = "ok";
pub const HANGS: &str = "slow";
pub const GARBAGE: &str = "garbage";
pub const CRASHES: &str = "crash";
pub const ECHOES_ARGS: &str = "args";

const SOLVER: &str = r#"#!/bin/sh
all="$*"
house=""
while [ $# -gt 0 ]; do
  case "$1" in
    --house) house="$2"; shift 2 ;;
    *) shift ;;
  esac
done
case "$(cat "$house")" in
  ok) printf '{"duration": 1.5, "solution": "DDLL"}\n' ;;
  slow) exec sleep 30 ;;
  garbage) echo not-json ;;
  crash) echo "solver blew up" >&2; exit 3 ;;
  args) printf '{"duration": 0, "solution": "%s"}\n' "$all" ;;
  *) echo "unknown case" >&2; exit 64 ;;
esac
"#;

/// Write the fixture solver script into `dir` and return its path.
///
/// The script is launched through `sh`, so it needs no exec bit.
pub fn write_solver(dir: &Path) -> PathBuf {
    let path = dir.join("solver.sh");
    fs::write(&path, SOLVER).unwrap();
    path
}

/// Create `cases/` under `dir` with one file per `(name, behaviour)` pair.
pub fn write_cases(dir: &Path, cases: &[(&str, &str)]) -> PathBuf {
    let folder = dir.join("cases");
    fs::create_dir_all(&folder).unwrap();
    for (name, behaviour) in cases {
        fs::write(folder.join(name), behaviour).unwrap();
    }
    folder
}
