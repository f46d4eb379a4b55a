/* Run the FitsStorage upload ingest script with privilege.
 *
 * Copyright © 2026 the FitsStorage authors
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * http://www.apache.org/licenses/LICENSE-2.0
 * There is NO WARRANTY.
 *
 *     invoke /opt/FitsStorage/scripts/ingest_uploaded_file.py [args...]
 *
 * re-executes the Python interpreter on the ingest script, passing
 * ARGS through verbatim.  The first argument must be exactly that
 * path, byte for byte; anything else is refused.  The interpreter
 * and script paths are compiled in and cannot be changed.
 *
 * The caller's environment is discarded before anything else happens.
 * The interpreter sees only PYTHONPATH (plus the CONDA_* identifiers
 * when built with the "conda" feature).  Real and effective user and
 * group IDs are set to the effective ones, and checked, before the
 * exec.
 *
 * Exit status, when the interpreter could not be started:
 *   1  execve failed (the diagnostic says why), or the build is
 *      misconfigured
 *   2  no script argument given
 *   3  script argument is not the permitted path
 *   4  real and effective IDs could not be made equal
 * Otherwise the exit status is the script's.  Diagnostics go to
 * stdout, one line, and never include environment contents.
 *
 * This program is to be installed setuid root.
 */

use std::io;
use std::process;

use std::io::Write;

use fitsstorage_invoke::launch::{launch, sanitize};
use fitsstorage_invoke::{log, Invocation, LaunchError, OsSystem, COMPILED};

fn run() -> LaunchError {
    let mut system = OsSystem;

    // Nothing may look at the environment before this.
    let env = match sanitize(&COMPILED, &mut system) {
        Ok(env) => env,
        Err(e) => return e,
    };
    log::init();

    match launch(&COMPILED, env, &Invocation::from_os(), &mut system) {
        Ok(never) => match never {},
        Err(e) => e,
    }
}

fn main() {
    let e = run();
    // The caller may have closed our stdout; the exit code must still
    // be the one for `e`.
    let _ = writeln!(io::stdout(), "{}", e);
    process::exit(e.exit_code());
}
