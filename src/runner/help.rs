//! Task documentation shown by the help task

use crate::runner::TaskName;

const SEPARATOR_WIDTH: usize = 80;

const TASK_DETAILS: &str = "\
 Supported Tasks:
   [default]         : Performs standard pre-checkin activities. Beautifies all
                       sources, lints them, builds them, tests the build
                       artifacts (client, server and e2e) and cleans up.

   package           : Same as default, but instead of cleaning up, archives the
                       working folder into dist/<name>_<version>.zip.

   env               : Shows the project tree and the status of every folder.
                       Does not alter any file or folder.

   help              : Shows this help message.

   clean             : Removes all build artifacts and temporary files or
                       folders.

   lint              : Runs the lint tool against all source files.

   monitor:[opt1]:   : Watches sources for changes, and runs the requested
           [opt2]:     actions on every change. Supported options:
           ...           [lint]   : Lints all source files.
                         [client] : Runs client tests against the sources.
                         [server] : Runs server tests. Starts a server under
                                    the --serverMode profile first.
                         [e2e]    : Runs end to end tests. Starts a server
                                    under the --serverMode profile first.
                         [build]  : Full lint, build and test cycle against
                                    build artifacts. All other options are
                                    ignored when this one is given.
                       Options run in the order given.

   build:[debugMode] : Builds all sources into the working folder. With the
                       debugMode sub target, or --debugMode, the build skips
                       optimization and minification.

   test:[client|     : Runs tests against sources (dev) or build artifacts
         server|e2e]:  (build). The test type is mandatory. Server and e2e
        [dev|build]    tests start a server first and stop it afterwards.

   bump:[major|minor]: Increments the package version. Only the patch number
                       changes unless major or minor is given.

 Supported Options:
   --debugMode       : Forces debug builds (no minification). Overrides the
                       build sub target.
   --serverMode      : Server profile used by monitor for server and e2e
                       tests (dev or build, default dev).
";

/// Full help text
pub fn help_text(app_name: &str) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let summary: Vec<String> = TaskName::ALL
        .iter()
        .map(|task| format!("   {:<18}{}", task.name(), task.about()))
        .collect();

    format!(
        "{sep}\n Tasks for linting, building, testing and packaging {app}.\n\n{summary}\n\n{details}{sep}",
        sep = separator,
        app = app_name,
        summary = summary.join("\n"),
        details = TASK_DETAILS,
    )
}
