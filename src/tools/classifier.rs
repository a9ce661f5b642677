// src/tools/classifier.rs

//! Decides whether a shell command should run attached to the terminal.
//!
//! This is a best-effort heuristic. A dotted or version-numbered binary name
//! (`python3.12`, `my.tool`) is treated as a non-program and runs captured;
//! that approximation is kept on purpose because it decides which commands
//! get a live terminal, and the tests below pin it.

/// Build and shell utilities that never need a live terminal.
const SHELL_COMMANDS: &[&str] = &[
    "cd", "mkdir", "rm", "cp", "mv", "touch", "ls", "dir", "gcc", "g++", "make", "cmake",
];

/// Executable suffix that always marks a program run.
const EXECUTABLE_SUFFIX: &str = ".exe";

/// Returns `true` when `command` looks like running a program the operator
/// may need to interact with.
pub fn is_interactive(command: &str) -> bool {
    let Some(first) = command.split_whitespace().next() else {
        return false;
    };

    // `./prog` is checked before the base name strips the prefix away.
    if first.starts_with("./") || first.starts_with(".\\") {
        return true;
    }

    let name = base_name(first);

    if name.ends_with(EXECUTABLE_SUFFIX) {
        return true;
    }

    if SHELL_COMMANDS.contains(&name) || name.starts_with("git") {
        return false;
    }

    !name.contains('.')
}

fn base_name(token: &str) -> &str {
    token.rsplit(['/', '\\']).next().unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_utilities_are_captured() {
        for cmd in [
            "mkdir foo",
            "cd build",
            "rm -rf out",
            "cp a b",
            "mv a b",
            "touch notes.txt",
            "ls -la",
            "dir",
            "gcc -o add add.c",
            "g++ main.cpp",
            "make",
            "cmake ..",
            "git status",
            "git-lfs pull",
            "/usr/bin/make install",
        ] {
            assert!(!is_interactive(cmd), "{cmd} should be captured");
        }
    }

    #[test]
    fn relative_and_exe_runs_are_interactive() {
        for cmd in ["./a.out", "./add", "prog.exe", "C:\\tools\\prog.exe --flag", ".\\run.exe"] {
            assert!(is_interactive(cmd), "{cmd} should be interactive");
        }
    }

    #[test]
    fn bare_program_names_are_interactive() {
        assert!(is_interactive("python"));
        assert!(is_interactive("  node  server "));
        assert!(is_interactive("/opt/bin/calculator"));
    }

    #[test]
    fn dotted_names_are_captured() {
        assert!(!is_interactive("script.sh"));
        assert!(!is_interactive("python3.12 app.py"));
        assert!(!is_interactive("bin/tool.v2"));
    }

    #[test]
    fn empty_command_is_not_interactive() {
        assert!(!is_interactive(""));
        assert!(!is_interactive("   \t "));
    }
}
