//! Common utilities for benchmarks

use std::fmt::Write;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use criterion::Criterion;
use ppc_config::Environment;
use pprof::criterion::{Output, PProfProfiler};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// A document with `sections` sections of `entries` entries each, mixing
/// literals, type hints, references with defaults and a conditional block
/// every tenth section
pub fn create_document(sections: usize, entries: usize) -> String {
    let mut text = String::from("# generated\nname = \"bench\"\n");

    for s in 0..sections {
        let _ = writeln!(text, "\n>> service_{}.settings", s);
        for e in 0..entries {
            let line = match e % 6 {
                0 => format!("  port_{} :: int = $env.PORT_{} ?? {}", e, e, 8000 + e),
                1 => format!("  host_{} = \"host-{}.internal\"", e, s),
                2 => format!("  ratio_{} :: float = 0.{}", e, e + 1),
                3 => format!("  enabled_{} = yes", e),
                4 => format!("  tags_{} = [\"a\", \"b\", {}]", e, e),
                _ => format!("  token_{} = $secret.TOKEN_{} ?? \"none\"", e, s),
            };
            text.push_str(&line);
            text.push('\n');
        }

        if s % 10 == 9 {
            let _ = writeln!(
                text,
                ">> @when $env.ENV == \"dev\"\n  >> service_{}.settings\n    debug = true\n>> @end",
                s
            );
        }
    }

    text
}

/// Environment that satisfies half of the references in `create_document`
pub fn create_environment(entries: usize) -> Environment {
    let mut env = Environment::new().with("ENV", "dev");
    for e in (0..entries).step_by(2) {
        env.set(format!("PORT_{}", e), (9000 + e).to_string());
    }
    env
}

/// Write `files` documents into `dir`, each included once from `main.ppc`,
/// and return the path of `main.ppc`
pub fn create_include_tree(dir: &Utf8Path, files: usize, entries: usize) -> std::io::Result<Utf8PathBuf> {
    let mut main = String::new();
    for f in 0..files {
        let name = format!("part_{}.ppc", f);
        fs::write(dir.join(&name), create_document(1, entries))?;
        let _ = writeln!(main, "@include \"{}\"", name);
    }

    let path = dir.join("main.ppc");
    fs::write(&path, main)?;
    Ok(path)
}
